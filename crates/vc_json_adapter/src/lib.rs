#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod adapter;
mod descriptor;
mod engine;
mod error;
mod factory;

pub mod bind;
pub mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use adapter::{JsonAdapter, LazyDelegate, TypeAdapter, downcast_boxed, downcast_value};
pub use bind::{JsonSerialization, JsonTreeSerialization};
pub use descriptor::TypeDescriptor;
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::{Error, Result};
pub use factory::{AdapterFactory, ChainPosition};

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}
