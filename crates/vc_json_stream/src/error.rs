//! Errors raised by the token reader and writer.

use alloc::borrow::Cow;
use alloc::string::String;
use std::io;

use thiserror::Error;

use crate::JsonToken;

/// Error type of [`JsonReader`](crate::JsonReader) and [`JsonWriter`](crate::JsonWriter).
///
/// Prefer the constructor functions ([`StreamError::syntax`] and friends)
/// over building variants by hand.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    /// The input is not well-formed JSON.
    #[error("malformed JSON at offset {offset}: {message}")]
    Syntax {
        offset: usize,
        message: Cow<'static, str>,
    },

    /// The input is well-formed but the caller asked for another token.
    #[error("expected {expected} but found {found} at offset {offset}")]
    UnexpectedToken {
        expected: JsonToken,
        found: JsonToken,
        offset: usize,
    },

    /// A number literal does not fit the requested type, or a float is not finite.
    #[error("invalid number `{literal}`: {message}")]
    InvalidNumber {
        literal: String,
        message: Cow<'static, str>,
    },

    /// The writer was driven out of order, e.g. a value without a member name.
    #[error("invalid writer state: {0}")]
    IllegalState(Cow<'static, str>),

    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

impl StreamError {
    #[cold]
    pub fn syntax(offset: usize, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    #[cold]
    pub fn unexpected_token(expected: JsonToken, found: JsonToken, offset: usize) -> Self {
        Self::UnexpectedToken {
            expected,
            found,
            offset,
        }
    }

    #[cold]
    pub fn invalid_number(
        literal: impl Into<String>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidNumber {
            literal: literal.into(),
            message: message.into(),
        }
    }

    #[cold]
    pub fn illegal_state(message: impl Into<Cow<'static, str>>) -> Self {
        Self::IllegalState(message.into())
    }

    /// Returns `true` for failures of the underlying sink.
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
