//! Error type shared by resolution, adapters and constructors.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt::Display;

use thiserror::Error;
use vc_json_stream::StreamError;

use crate::TypeDescriptor;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while resolving adapters or converting values.
///
/// User code running inside constructors and capability methods reports its
/// own failures with [`Error::custom`] (a runtime fault, propagated unchanged)
/// or [`Error::other`] (any other fault, wrapped by constructor adapters into
/// [`Error::ConstructionFailed`]).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The token stream failed: malformed input, misuse or I/O.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// No factory in the (remaining) chain produced an adapter.
    #[error("no adapter for `{ty}`: {reason}")]
    AdapterResolution {
        ty: TypeDescriptor,
        reason: Cow<'static, str>,
    },

    /// The marked constructor has the wrong parameter count or kinds.
    #[error("marked constructor `{constructor}` of `{ty}` has an invalid shape: {reason}")]
    InvalidConstructorShape {
        ty: TypeDescriptor,
        constructor: &'static str,
        reason: Cow<'static, str>,
    },

    /// The first parameter of the marked constructor cannot be decoded.
    #[error("argument `{argument}` of the marked constructor of `{ty}` cannot be decoded")]
    UnresolvableArgumentType {
        ty: TypeDescriptor,
        argument: TypeDescriptor,
        #[source]
        source: Box<Error>,
    },

    /// The constructor could not produce an instance.
    #[error("constructor `{constructor}` of `{ty}` failed")]
    ConstructionFailed {
        ty: TypeDescriptor,
        constructor: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Registration of a type is ambiguous or contradictory.
    #[error("invalid configuration for `{ty}`: {reason}")]
    Configuration {
        ty: TypeDescriptor,
        reason: Cow<'static, str>,
    },

    /// Arguments handed to a constructor do not match its parameters.
    #[error("instantiation failed: {0}")]
    Instantiation(Cow<'static, str>),

    /// An erased value is not of the type an adapter was built for.
    #[error("value is not a `{expected}`")]
    TypeMismatch { expected: &'static str },

    /// Conversion between a value and its tree form failed.
    #[error("tree conversion failed: {0}")]
    Tree(#[from] serde_json::Error),

    /// A runtime fault raised by user code.
    #[error("{0}")]
    Message(String),

    /// Any other fault raised by user code.
    #[error(transparent)]
    Other(Box<dyn core::error::Error + Send + Sync>),
}

impl Error {
    /// Creates a runtime fault from user code.
    #[cold]
    pub fn custom(message: impl Display) -> Self {
        Self::Message(message.to_string())
    }

    /// Wraps an arbitrary error raised by user code.
    #[cold]
    pub fn other(error: impl Into<Box<dyn core::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }

    #[cold]
    pub fn instantiation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Instantiation(message.into())
    }

    #[cold]
    pub fn type_mismatch<T: ?Sized>() -> Self {
        Self::TypeMismatch {
            expected: core::any::type_name::<T>(),
        }
    }

    #[cold]
    pub fn adapter_resolution(ty: TypeDescriptor, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::AdapterResolution {
            ty,
            reason: reason.into(),
        }
    }

    #[cold]
    pub fn configuration(ty: TypeDescriptor, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Configuration {
            ty,
            reason: reason.into(),
        }
    }

    /// Returns `true` for faults of the underlying reader or writer sink.
    #[inline]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Stream(e) if e.is_io())
    }
}

// -----------------------------------------------------------------------------
// Tests
