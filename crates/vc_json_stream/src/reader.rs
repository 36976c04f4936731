use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::scope::Scope;
use crate::{JsonToken, StreamError};

// -----------------------------------------------------------------------------
// Peeked

/// A token that has been scanned but not consumed yet.
///
/// Strings without escapes borrow from the input.
#[derive(Debug)]
enum Peeked<'a> {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    Name(Cow<'a, str>),
    String(Cow<'a, str>),
    Number(&'a str),
    Bool(bool),
    Null,
    EndDocument,
}

impl Peeked<'_> {
    fn kind(&self) -> JsonToken {
        match self {
            Self::BeginArray => JsonToken::BeginArray,
            Self::EndArray => JsonToken::EndArray,
            Self::BeginObject => JsonToken::BeginObject,
            Self::EndObject => JsonToken::EndObject,
            Self::Name(_) => JsonToken::Name,
            Self::String(_) => JsonToken::String,
            Self::Number(_) => JsonToken::Number,
            Self::Bool(_) => JsonToken::Bool,
            Self::Null => JsonToken::Null,
            Self::EndDocument => JsonToken::EndDocument,
        }
    }
}

// -----------------------------------------------------------------------------
// JsonReader

/// A pull cursor over one JSON document.
///
/// Tokens are consumed in document order. Structural tokens must be consumed
/// with the matching `begin_*`/`end_*` call, scalars with the matching
/// `next_*` call. A call that does not match the next token fails with
/// [`StreamError::UnexpectedToken`] and leaves the token in place.
///
/// # Examples
///
/// ```
/// use vc_json_stream::JsonReader;
///
/// let mut reader = JsonReader::new("[1, 2.5, \"three\", null]");
/// reader.begin_array().unwrap();
/// assert_eq!(reader.next_i64().unwrap(), 1);
/// assert_eq!(reader.next_f64().unwrap(), 2.5);
/// assert_eq!(reader.next_string().unwrap(), "three");
/// reader.next_null().unwrap();
/// assert!(!reader.has_next().unwrap());
/// reader.end_array().unwrap();
/// reader.finish().unwrap();
/// ```
pub struct JsonReader<'a> {
    input: &'a str,
    pos: usize,
    token_offset: usize,
    stack: Vec<Scope>,
    peeked: Option<Peeked<'a>>,
    max_depth: usize,
}

/// Default nesting limit of arrays and objects, see [`JsonReader::max_depth`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

impl<'a> JsonReader<'a> {
    /// Creates a reader positioned before the top-level value of `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            token_offset: 0,
            stack: vec![Scope::EmptyDocument],
            peeked: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how deeply arrays and objects may nest.
    ///
    /// Opening one more level fails with [`StreamError::Syntax`].
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current nesting depth, `0` at the top level.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn enter(&mut self, peeked: Peeked<'a>, scope: Scope) -> Result<(), StreamError> {
        if self.depth() >= self.max_depth {
            self.peeked = Some(peeked);
            return Err(StreamError::syntax(
                self.token_offset,
                alloc::format!("nesting exceeds the limit of {} levels", self.max_depth),
            ));
        }
        self.stack.push(scope);
        Ok(())
    }

    /// Byte offset of the cursor in the input.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Returns the kind of the next token without consuming it.
    pub fn peek(&mut self) -> Result<JsonToken, StreamError> {
        let peeked = self.take_peeked()?;
        let kind = peeked.kind();
        self.peeked = Some(peeked);
        Ok(kind)
    }

    /// Returns `true` if the current array or object has another element.
    pub fn has_next(&mut self) -> Result<bool, StreamError> {
        let token = self.peek()?;
        Ok(!matches!(
            token,
            JsonToken::EndArray | JsonToken::EndObject | JsonToken::EndDocument
        ))
    }

    pub fn begin_array(&mut self) -> Result<(), StreamError> {
        match self.take_peeked()? {
            peeked @ Peeked::BeginArray => self.enter(peeked, Scope::EmptyArray),
            other => Err(self.unexpected(JsonToken::BeginArray, other)),
        }
    }

    pub fn end_array(&mut self) -> Result<(), StreamError> {
        match self.take_peeked()? {
            Peeked::EndArray => {
                self.stack.pop();
                Ok(())
            }
            other => Err(self.unexpected(JsonToken::EndArray, other)),
        }
    }

    pub fn begin_object(&mut self) -> Result<(), StreamError> {
        match self.take_peeked()? {
            peeked @ Peeked::BeginObject => self.enter(peeked, Scope::EmptyObject),
            other => Err(self.unexpected(JsonToken::BeginObject, other)),
        }
    }

    pub fn end_object(&mut self) -> Result<(), StreamError> {
        match self.take_peeked()? {
            Peeked::EndObject => {
                self.stack.pop();
                Ok(())
            }
            other => Err(self.unexpected(JsonToken::EndObject, other)),
        }
    }

    /// Consumes an object member name.
    pub fn next_name(&mut self) -> Result<Cow<'a, str>, StreamError> {
        match self.take_peeked()? {
            Peeked::Name(name) => Ok(name),
            other => Err(self.unexpected(JsonToken::Name, other)),
        }
    }

    /// Consumes a string value.
    pub fn next_string(&mut self) -> Result<Cow<'a, str>, StreamError> {
        match self.take_peeked()? {
            Peeked::String(value) => Ok(value),
            other => Err(self.unexpected(JsonToken::String, other)),
        }
    }

    pub fn next_bool(&mut self) -> Result<bool, StreamError> {
        match self.take_peeked()? {
            Peeked::Bool(value) => Ok(value),
            other => Err(self.unexpected(JsonToken::Bool, other)),
        }
    }

    pub fn next_null(&mut self) -> Result<(), StreamError> {
        match self.take_peeked()? {
            Peeked::Null => Ok(()),
            other => Err(self.unexpected(JsonToken::Null, other)),
        }
    }

    /// Consumes a number and returns its literal text, e.g. `-1.5e3`.
    pub fn next_number(&mut self) -> Result<&'a str, StreamError> {
        match self.take_peeked()? {
            Peeked::Number(literal) => Ok(literal),
            other => Err(self.unexpected(JsonToken::Number, other)),
        }
    }

    pub fn next_i64(&mut self) -> Result<i64, StreamError> {
        let literal = self.next_number()?;
        literal
            .parse::<i64>()
            .map_err(|_| StreamError::invalid_number(literal, "not a 64-bit signed integer"))
    }

    pub fn next_u64(&mut self) -> Result<u64, StreamError> {
        let literal = self.next_number()?;
        literal
            .parse::<u64>()
            .map_err(|_| StreamError::invalid_number(literal, "not a 64-bit unsigned integer"))
    }

    pub fn next_f64(&mut self) -> Result<f64, StreamError> {
        let literal = self.next_number()?;
        match literal.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(StreamError::invalid_number(literal, "not a finite double")),
        }
    }

    /// Skips the next value, including all of its nested content.
    ///
    /// When positioned on a member name only the name is skipped.
    pub fn skip_value(&mut self) -> Result<(), StreamError> {
        let mut depth = 0_usize;
        loop {
            match self.take_peeked()? {
                peeked @ Peeked::BeginArray => {
                    self.enter(peeked, Scope::EmptyArray)?;
                    depth += 1;
                }
                peeked @ Peeked::BeginObject => {
                    self.enter(peeked, Scope::EmptyObject)?;
                    depth += 1;
                }
                peeked @ (Peeked::EndArray | Peeked::EndObject) => {
                    if depth == 0 {
                        let found = peeked.kind();
                        self.peeked = Some(peeked);
                        return Err(StreamError::syntax(
                            self.token_offset,
                            alloc::format!("no value to skip before {found}"),
                        ));
                    }
                    self.stack.pop();
                    depth -= 1;
                }
                Peeked::EndDocument => {
                    self.peeked = Some(Peeked::EndDocument);
                    return Err(StreamError::syntax(
                        self.token_offset,
                        "no value to skip at end of document",
                    ));
                }
                Peeked::Name(_)
                | Peeked::String(_)
                | Peeked::Number(_)
                | Peeked::Bool(_)
                | Peeked::Null => {}
            }
            if depth == 0 {
                return Ok(());
            }
        }
    }

    /// Checks that the whole input has been consumed.
    ///
    /// Only whitespace may follow the top-level value.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        match self.take_peeked()? {
            Peeked::EndDocument => {
                self.peeked = Some(Peeked::EndDocument);
                Ok(())
            }
            other => Err(self.unexpected(JsonToken::EndDocument, other)),
        }
    }

    // -------------------------------------------------------------------------
    // Scanning

    fn unexpected(&mut self, expected: JsonToken, peeked: Peeked<'a>) -> StreamError {
        let found = peeked.kind();
        self.peeked = Some(peeked);
        StreamError::unexpected_token(expected, found, self.token_offset)
    }

    fn take_peeked(&mut self) -> Result<Peeked<'a>, StreamError> {
        match self.peeked.take() {
            Some(peeked) => Ok(peeked),
            None => self.scan(),
        }
    }

    #[inline]
    fn current(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.current() {
            self.pos += 1;
        }
        self.token_offset = self.pos;
    }

    #[cold]
    fn syntax(&self, message: &'static str) -> StreamError {
        StreamError::syntax(self.pos, message)
    }

    fn scan(&mut self) -> Result<Peeked<'a>, StreamError> {
        let top = self.stack.len() - 1;
        match self.stack[top] {
            Scope::EmptyArray => {
                self.stack[top] = Scope::NonEmptyArray;
                self.skip_whitespace();
                if self.current() == Some(b']') {
                    self.pos += 1;
                    return Ok(Peeked::EndArray);
                }
            }
            Scope::NonEmptyArray => {
                self.skip_whitespace();
                match self.current() {
                    Some(b']') => {
                        self.pos += 1;
                        return Ok(Peeked::EndArray);
                    }
                    Some(b',') => self.pos += 1,
                    _ => return Err(self.syntax("expected ',' or ']' in array")),
                }
            }
            scope @ (Scope::EmptyObject | Scope::NonEmptyObject) => {
                self.stack[top] = Scope::DanglingName;
                self.skip_whitespace();
                match self.current() {
                    Some(b'}') => {
                        self.pos += 1;
                        return Ok(Peeked::EndObject);
                    }
                    Some(b',') if scope == Scope::NonEmptyObject => {
                        self.pos += 1;
                        self.skip_whitespace();
                    }
                    _ if scope == Scope::NonEmptyObject => {
                        return Err(self.syntax("expected ',' or '}' in object"));
                    }
                    _ => {}
                }
                if self.current() != Some(b'"') {
                    return Err(self.syntax("expected a quoted member name"));
                }
                self.pos += 1;
                return self.scan_string().map(Peeked::Name);
            }
            Scope::DanglingName => {
                self.stack[top] = Scope::NonEmptyObject;
                self.skip_whitespace();
                if self.current() != Some(b':') {
                    return Err(self.syntax("expected ':' after member name"));
                }
                self.pos += 1;
            }
            Scope::EmptyDocument => self.stack[top] = Scope::NonEmptyDocument,
            Scope::NonEmptyDocument => {
                self.skip_whitespace();
                return match self.current() {
                    None => Ok(Peeked::EndDocument),
                    Some(_) => Err(self.syntax("unexpected data after the top-level value")),
                };
            }
        }
        self.scan_value()
    }

    fn scan_value(&mut self) -> Result<Peeked<'a>, StreamError> {
        self.skip_whitespace();
        match self.current() {
            None => Err(self.syntax("unexpected end of input")),
            Some(b'[') => {
                self.pos += 1;
                Ok(Peeked::BeginArray)
            }
            Some(b'{') => {
                self.pos += 1;
                Ok(Peeked::BeginObject)
            }
            Some(b'"') => {
                self.pos += 1;
                self.scan_string().map(Peeked::String)
            }
            Some(b't') => self.scan_keyword("true", Peeked::Bool(true)),
            Some(b'f') => self.scan_keyword("false", Peeked::Bool(false)),
            Some(b'n') => self.scan_keyword("null", Peeked::Null),
            Some(b'-' | b'0'..=b'9') => self.scan_number(),
            Some(_) => Err(self.syntax("unexpected character")),
        }
    }

    fn scan_keyword(
        &mut self,
        keyword: &'static str,
        peeked: Peeked<'a>,
    ) -> Result<Peeked<'a>, StreamError> {
        if self.input[self.pos..].starts_with(keyword) {
            self.pos += keyword.len();
            Ok(peeked)
        } else {
            Err(self.syntax("unexpected literal"))
        }
    }

    fn scan_digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.current() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn scan_number(&mut self) -> Result<Peeked<'a>, StreamError> {
        let start = self.pos;
        if self.current() == Some(b'-') {
            self.pos += 1;
        }
        match self.current() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => {
                self.scan_digits();
            }
            _ => return Err(self.syntax("expected a digit")),
        }
        if self.current() == Some(b'.') {
            self.pos += 1;
            if self.scan_digits() == 0 {
                return Err(self.syntax("expected a digit after the decimal point"));
            }
        }
        if let Some(b'e' | b'E') = self.current() {
            self.pos += 1;
            if let Some(b'+' | b'-') = self.current() {
                self.pos += 1;
            }
            if self.scan_digits() == 0 {
                return Err(self.syntax("expected a digit in the exponent"));
            }
        }
        Ok(Peeked::Number(&self.input[start..self.pos]))
    }

    // The opening quote has been consumed.
    fn scan_string(&mut self) -> Result<Cow<'a, str>, StreamError> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        loop {
            match bytes.get(self.pos) {
                None => return Err(self.syntax("unterminated string")),
                Some(b'"') => {
                    let value = &self.input[start..self.pos];
                    self.pos += 1;
                    return Ok(Cow::Borrowed(value));
                }
                Some(b'\\') => break,
                Some(&byte) if byte < 0x20 => {
                    return Err(self.syntax("unescaped control character in string"));
                }
                Some(_) => self.pos += 1,
            }
        }

        let mut owned = String::from(&self.input[start..self.pos]);
        loop {
            match bytes.get(self.pos) {
                None => return Err(self.syntax("unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(Cow::Owned(owned));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let ch = self.scan_escape()?;
                    owned.push(ch);
                }
                Some(&byte) if byte < 0x20 => {
                    return Err(self.syntax("unescaped control character in string"));
                }
                Some(_) => {
                    let run_start = self.pos;
                    while let Some(&byte) = bytes.get(self.pos) {
                        if byte == b'"' || byte == b'\\' || byte < 0x20 {
                            break;
                        }
                        self.pos += 1;
                    }
                    owned.push_str(&self.input[run_start..self.pos]);
                }
            }
        }
    }

    // The backslash has been consumed.
    fn scan_escape(&mut self) -> Result<char, StreamError> {
        let Some(byte) = self.current() else {
            return Err(self.syntax("unterminated escape sequence"));
        };
        self.pos += 1;
        let ch = match byte {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => return self.scan_unicode_escape(),
            _ => return Err(self.syntax("invalid escape sequence")),
        };
        Ok(ch)
    }

    fn scan_unicode_escape(&mut self) -> Result<char, StreamError> {
        let high = self.scan_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or_else(|| self.syntax("unpaired surrogate"));
        }
        if !self.input[self.pos..].starts_with("\\u") {
            return Err(self.syntax("unpaired surrogate"));
        }
        self.pos += 2;
        let low = self.scan_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(self.syntax("invalid low surrogate"));
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).ok_or_else(|| self.syntax("invalid surrogate pair"))
    }

    fn scan_hex4(&mut self) -> Result<u32, StreamError> {
        let digits = match self.input.get(self.pos..self.pos + 4) {
            Some(digits) if digits.bytes().all(|b| b.is_ascii_hexdigit()) => digits,
            _ => return Err(self.syntax("expected four hex digits")),
        };
        self.pos += 4;
        u32::from_str_radix(digits, 16).map_err(|_| self.syntax("expected four hex digits"))
    }
}

// -----------------------------------------------------------------------------
// Tests
