#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod reader;
mod scope;
mod token;
mod writer;

pub mod tree;

// -----------------------------------------------------------------------------
// Exports

pub use error::StreamError;
pub use reader::{DEFAULT_MAX_DEPTH, JsonReader};
pub use token::JsonToken;
pub use writer::JsonWriter;

/// The in-memory tree representation of a document.
pub use serde_json::{Map, Number, Value};
