use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use std::io;

use crate::StreamError;
use crate::scope::Scope;

const INDENT: &str = "  ";

/// A push emitter for one JSON document.
///
/// Values are written in document order. Inside an object every value must be
/// preceded by [`name`](JsonWriter::name). Output is compact unless
/// [`pretty`](JsonWriter::pretty) is enabled.
///
/// When null serialization is disabled, a member whose value is `null` is
/// dropped together with its name. Nulls inside arrays are always written.
///
/// # Examples
///
/// ```
/// use vc_json_stream::JsonWriter;
///
/// let mut out = Vec::new();
/// let mut writer = JsonWriter::new(&mut out).serialize_nulls(false);
/// writer.begin_object().unwrap();
/// writer.name("id").unwrap();
/// writer.i64(7).unwrap();
/// writer.name("note").unwrap();
/// writer.null().unwrap();
/// writer.end_object().unwrap();
/// writer.finish().unwrap();
/// assert_eq!(out, br#"{"id":7}"#);
/// ```
pub struct JsonWriter<'w> {
    out: &'w mut dyn io::Write,
    stack: Vec<Scope>,
    deferred_name: Option<String>,
    pretty: bool,
    serialize_nulls: bool,
}

impl<'w> JsonWriter<'w> {
    /// Creates a compact writer that emits nulls.
    pub fn new(out: &'w mut dyn io::Write) -> Self {
        Self {
            out,
            stack: vec![Scope::EmptyDocument],
            deferred_name: None,
            pretty: false,
            serialize_nulls: true,
        }
    }

    /// Enables two-space indentation with one member or element per line.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Controls whether object members with a `null` value are emitted.
    #[must_use]
    pub fn serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.serialize_nulls = serialize_nulls;
        self
    }

    #[inline]
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    #[inline]
    pub fn is_serialize_nulls(&self) -> bool {
        self.serialize_nulls
    }

    pub fn begin_array(&mut self) -> Result<(), StreamError> {
        self.before_value()?;
        self.stack.push(Scope::EmptyArray);
        self.raw("[")
    }

    pub fn end_array(&mut self) -> Result<(), StreamError> {
        self.close(Scope::EmptyArray, Scope::NonEmptyArray, "]")
    }

    pub fn begin_object(&mut self) -> Result<(), StreamError> {
        self.before_value()?;
        self.stack.push(Scope::EmptyObject);
        self.raw("{")
    }

    pub fn end_object(&mut self) -> Result<(), StreamError> {
        self.close(Scope::EmptyObject, Scope::NonEmptyObject, "}")
    }

    /// Writes an object member name. The member value must follow.
    pub fn name(&mut self, name: &str) -> Result<(), StreamError> {
        if self.deferred_name.is_some() {
            return Err(StreamError::illegal_state("a member name is already pending"));
        }
        match self.top() {
            Scope::EmptyObject | Scope::NonEmptyObject => {
                self.deferred_name = Some(String::from(name));
                Ok(())
            }
            _ => Err(StreamError::illegal_state("member name outside of an object")),
        }
    }

    pub fn string(&mut self, value: &str) -> Result<(), StreamError> {
        self.before_value()?;
        self.quoted(value)
    }

    pub fn bool(&mut self, value: bool) -> Result<(), StreamError> {
        self.before_value()?;
        self.raw(if value { "true" } else { "false" })
    }

    pub fn null(&mut self) -> Result<(), StreamError> {
        if self.deferred_name.is_some() && !self.serialize_nulls {
            self.deferred_name = None;
            return Ok(());
        }
        self.before_value()?;
        self.raw("null")
    }

    pub fn i64(&mut self, value: i64) -> Result<(), StreamError> {
        self.before_value()?;
        write!(self.out, "{value}")?;
        Ok(())
    }

    pub fn u64(&mut self, value: u64) -> Result<(), StreamError> {
        self.before_value()?;
        write!(self.out, "{value}")?;
        Ok(())
    }

    /// Writes a finite double. NaN and infinities are rejected.
    pub fn f64(&mut self, value: f64) -> Result<(), StreamError> {
        if !value.is_finite() {
            return Err(StreamError::invalid_number(
                alloc::format!("{value}"),
                "JSON has no representation for non-finite numbers",
            ));
        }
        self.before_value()?;
        // `{:?}` keeps a trailing `.0`, so the value reads back as a double.
        write!(self.out, "{value:?}")?;
        Ok(())
    }

    /// Writes a [`Number`](crate::Number) using its canonical text.
    pub fn number(&mut self, value: &serde_json::Number) -> Result<(), StreamError> {
        self.before_value()?;
        write!(self.out, "{value}")?;
        Ok(())
    }

    /// Checks that exactly one complete top-level value was written and
    /// flushes the sink.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        if self.stack.len() != 1 || self.stack[0] != Scope::NonEmptyDocument {
            return Err(StreamError::illegal_state("incomplete document"));
        }
        self.out.flush()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Layout

    #[inline]
    fn top(&self) -> Scope {
        self.stack[self.stack.len() - 1]
    }

    #[inline]
    fn replace_top(&mut self, scope: Scope) {
        let top = self.stack.len() - 1;
        self.stack[top] = scope;
    }

    #[inline]
    fn raw(&mut self, text: &str) -> Result<(), StreamError> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn newline(&mut self) -> Result<(), StreamError> {
        if !self.pretty {
            return Ok(());
        }
        self.raw("\n")?;
        for _ in 1..self.stack.len() {
            self.raw(INDENT)?;
        }
        Ok(())
    }

    fn before_value(&mut self) -> Result<(), StreamError> {
        match self.top() {
            Scope::EmptyDocument => self.replace_top(Scope::NonEmptyDocument),
            Scope::NonEmptyDocument => {
                return Err(StreamError::illegal_state("document already has a top-level value"));
            }
            Scope::EmptyArray => {
                self.replace_top(Scope::NonEmptyArray);
                self.newline()?;
            }
            Scope::NonEmptyArray => {
                self.raw(",")?;
                self.newline()?;
            }
            scope @ (Scope::EmptyObject | Scope::NonEmptyObject) => {
                let Some(name) = self.deferred_name.take() else {
                    return Err(StreamError::illegal_state("object member without a name"));
                };
                if scope == Scope::NonEmptyObject {
                    self.raw(",")?;
                }
                self.replace_top(Scope::NonEmptyObject);
                self.newline()?;
                self.quoted(&name)?;
                self.raw(if self.pretty { ": " } else { ":" })?;
            }
            Scope::DanglingName => {
                return Err(StreamError::illegal_state("writer is in an inconsistent state"));
            }
        }
        Ok(())
    }

    fn close(&mut self, empty: Scope, non_empty: Scope, bracket: &str) -> Result<(), StreamError> {
        if self.deferred_name.is_some() {
            return Err(StreamError::illegal_state("member name without a value"));
        }
        let top = self.top();
        if top != empty && top != non_empty {
            return Err(StreamError::illegal_state("closing bracket does not match"));
        }
        self.stack.pop();
        if top == non_empty {
            self.newline()?;
        }
        self.raw(bracket)
    }

    fn quoted(&mut self, value: &str) -> Result<(), StreamError> {
        self.raw("\"")?;
        let bytes = value.as_bytes();
        let mut start = 0;
        for (index, ch) in value.char_indices() {
            let escaped: Option<&str> = match ch {
                '"' => Some("\\\""),
                '\\' => Some("\\\\"),
                '\n' => Some("\\n"),
                '\r' => Some("\\r"),
                '\t' => Some("\\t"),
                '\u{8}' => Some("\\b"),
                '\u{c}' => Some("\\f"),
                '\u{2028}' => Some("\\u2028"),
                '\u{2029}' => Some("\\u2029"),
                c if (c as u32) < 0x20 => None,
                _ => continue,
            };
            self.out.write_all(&bytes[start..index])?;
            match escaped {
                Some(text) => self.raw(text)?,
                None => write!(self.out, "\\u{:04x}", ch as u32)?,
            }
            start = index + ch.len_utf8();
        }
        self.out.write_all(&bytes[start..])?;
        self.raw("\"")
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::JsonWriter;
    use crate::StreamError;

    fn render(pretty: bool, f: impl FnOnce(&mut JsonWriter<'_>)) -> String {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out).pretty(pretty);
        f(&mut writer);
        writer.finish().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn compact_document() {
        let text = render(false, |w| {
            w.begin_object().unwrap();
            w.name("list").unwrap();
            w.begin_array().unwrap();
            w.i64(-1).unwrap();
            w.u64(u64::MAX).unwrap();
            w.f64(0.5).unwrap();
            w.f64(2.0).unwrap();
            w.bool(true).unwrap();
            w.null().unwrap();
            w.end_array().unwrap();
            w.name("empty").unwrap();
            w.begin_object().unwrap();
            w.end_object().unwrap();
            w.end_object().unwrap();
        });
        assert_eq!(
            text,
            r#"{"list":[-1,18446744073709551615,0.5,2.0,true,null],"empty":{}}"#
        );
    }

    #[test]
    fn pretty_document() {
        let text = render(true, |w| {
            w.begin_object().unwrap();
            w.name("a").unwrap();
            w.begin_array().unwrap();
            w.i64(1).unwrap();
            w.i64(2).unwrap();
            w.end_array().unwrap();
            w.name("b").unwrap();
            w.begin_array().unwrap();
            w.end_array().unwrap();
            w.end_object().unwrap();
        });
        assert_eq!(text, "{\n  \"a\": [\n    1,\n    2\n  ],\n  \"b\": []\n}");
    }

    #[test]
    fn escapes_strings() {
        let text = render(false, |w| {
            w.string("quote\" slash\\ line\n tab\t bell\u{7} sep\u{2028}")
                .unwrap();
        });
        assert_eq!(
            text,
            r#""quote\" slash\\ line\n tab\t bell\u0007 sep\u2028""#
        );
    }

    #[test]
    fn drops_null_members() {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out).serialize_nulls(false);
        writer.begin_object().unwrap();
        writer.name("gone").unwrap();
        writer.null().unwrap();
        writer.name("kept").unwrap();
        writer.begin_array().unwrap();
        writer.null().unwrap();
        writer.end_array().unwrap();
        writer.end_object().unwrap();
        writer.finish().unwrap();
        assert_eq!(out, br#"{"kept":[null]}"#);
    }

    #[test]
    fn rejects_misuse() {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out);
        assert!(matches!(
            writer.name("top"),
            Err(StreamError::IllegalState(_))
        ));
        writer.begin_object().unwrap();
        assert!(matches!(writer.i64(1), Err(StreamError::IllegalState(_))));
        assert!(matches!(writer.end_array(), Err(StreamError::IllegalState(_))));
        assert!(matches!(
            writer.f64(f64::NAN),
            Err(StreamError::InvalidNumber { .. })
        ));
        assert!(matches!(writer.finish(), Err(StreamError::IllegalState(_))));
        writer.end_object().unwrap();
        writer.finish().unwrap();
        assert!(matches!(writer.i64(2), Err(StreamError::IllegalState(_))));
    }
}
