use core::fmt;

/// The kind of the next token in a [`JsonReader`](crate::JsonReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonToken {
    BeginArray,
    EndArray,
    BeginObject,
    EndObject,
    /// An object member name.
    Name,
    String,
    Number,
    Bool,
    Null,
    /// The top-level value has been fully consumed.
    EndDocument,
}

impl JsonToken {
    /// Returns `true` for tokens that start or are a complete value.
    #[inline]
    pub const fn is_value(self) -> bool {
        matches!(
            self,
            Self::BeginArray
                | Self::BeginObject
                | Self::String
                | Self::Number
                | Self::Bool
                | Self::Null
        )
    }
}

impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeginArray => f.pad("'['"),
            Self::EndArray => f.pad("']'"),
            Self::BeginObject => f.pad("'{'"),
            Self::EndObject => f.pad("'}'"),
            Self::Name => f.pad("member name"),
            Self::String => f.pad("string"),
            Self::Number => f.pad("number"),
            Self::Bool => f.pad("boolean"),
            Self::Null => f.pad("null"),
            Self::EndDocument => f.pad("end of document"),
        }
    }
}
