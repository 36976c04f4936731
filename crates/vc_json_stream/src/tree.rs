//! Conversion between the token stream and [`Value`] trees.

use alloc::vec::Vec;

use crate::{JsonReader, JsonToken, JsonWriter, Map, Number, StreamError, Value};

/// Reads the next complete value from `reader` into a tree.
///
/// Integers that fit `i64` or `u64` keep their integer form, every other
/// number becomes a double.
pub fn read(reader: &mut JsonReader<'_>) -> Result<Value, StreamError> {
    match reader.peek()? {
        JsonToken::BeginArray => {
            reader.begin_array()?;
            let mut items = Vec::new();
            while reader.has_next()? {
                items.push(read(reader)?);
            }
            reader.end_array()?;
            Ok(Value::Array(items))
        }
        JsonToken::BeginObject => {
            reader.begin_object()?;
            let mut map = Map::new();
            while reader.has_next()? {
                let name = reader.next_name()?.into_owned();
                let value = read(reader)?;
                map.insert(name, value);
            }
            reader.end_object()?;
            Ok(Value::Object(map))
        }
        JsonToken::String => Ok(Value::String(reader.next_string()?.into_owned())),
        JsonToken::Number => read_number(reader.next_number()?).map(Value::Number),
        JsonToken::Bool => Ok(Value::Bool(reader.next_bool()?)),
        JsonToken::Null => {
            reader.next_null()?;
            Ok(Value::Null)
        }
        found @ (JsonToken::EndArray
        | JsonToken::EndObject
        | JsonToken::Name
        | JsonToken::EndDocument) => Err(StreamError::syntax(
            reader.offset(),
            alloc::format!("expected a value but found {found}"),
        )),
    }
}

fn read_number(literal: &str) -> Result<Number, StreamError> {
    if let Ok(value) = literal.parse::<i64>() {
        return Ok(Number::from(value));
    }
    if let Ok(value) = literal.parse::<u64>() {
        return Ok(Number::from(value));
    }
    literal
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| StreamError::invalid_number(literal, "not a finite double"))
}

/// Writes `value` as the next value of `writer`.
pub fn write(value: &Value, writer: &mut JsonWriter<'_>) -> Result<(), StreamError> {
    match value {
        Value::Null => writer.null(),
        Value::Bool(value) => writer.bool(*value),
        Value::Number(number) => writer.number(number),
        Value::String(text) => writer.string(text),
        Value::Array(items) => {
            writer.begin_array()?;
            for item in items {
                write(item, writer)?;
            }
            writer.end_array()
        }
        Value::Object(map) => {
            writer.begin_object()?;
            for (name, value) in map {
                writer.name(name)?;
                write(value, writer)?;
            }
            writer.end_object()
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
