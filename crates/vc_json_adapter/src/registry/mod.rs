//! Explicit type registration.
//!
//! A type opts into conversion strategies by registering a [`TypeMeta`] whose
//! [`TypeTrait`] table lists its capabilities. Factories only look at the
//! registry, never at the type itself.
//!
//! ## Menu
//!
//! - [`TypeTrait`]: a capability stored in a [`TypeMeta`].
//! - [`FromType`]: builds a type trait for a concrete type.
//! - [`TypeMeta`]: the registration record of one type.
//! - [`GetTypeMeta`]: provides the [`TypeMeta`] of a type.
//! - [`TypeRegistry`]: the store of all records.
//! - Type traits:
//!     - [`TypeTraitSerde`]: `serde` support, the strategy of last resort.
//!     - [`TypeTraitJsonConstructor`]: marked constructors for deserialization.
//!     - [`TypeTraitJsonSerialization`]: the type writes itself to a [`JsonWriter`].
//!     - [`TypeTraitJsonTreeSerialization`]: the type converts itself to a tree.
//!     - [`TypeTraitList`] and [`TypeTraitOption`]: element access for `Vec<E>` and `Option<E>`.
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`]. Registrations are collected with the
//! [`inventory`] crate behind the `auto_register` feature.
//!
//! [`JsonWriter`]: vc_json_stream::JsonWriter

// -----------------------------------------------------------------------------
// Modules

mod from_type;
mod impls;
mod traits;
mod type_meta;
mod type_registry;
mod type_trait;

#[cfg(feature = "auto_register")]
mod auto_register;

// -----------------------------------------------------------------------------
// Exports

pub use from_type::FromType;
pub use traits::{ConstructorArg, ConstructorArgs, RegisterFn};
pub use traits::{JsonConstructor, ParamKind, TypeTraitJsonConstructor};
pub use traits::{TypeTraitJsonSerialization, TypeTraitJsonTreeSerialization};
pub use traits::{TypeTraitList, TypeTraitOption, TypeTraitSerde};
pub use type_meta::{GetTypeMeta, TypeMeta};
pub use type_registry::TypeRegistry;
pub use type_trait::TypeTrait;

#[cfg(feature = "auto_register")]
pub use auto_register::AutoRegistration;
