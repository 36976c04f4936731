//! Built-in adapter factories.
//!
//! An engine's chain is assembled in this order, after any user factories:
//!
//! | factory                                 | handles                                 |
//! |-----------------------------------------|-----------------------------------------|
//! | [`ConstructorAdapterFactory`]           | marked constructors, if scanning is on  |
//! | [`JsonSerializationAdapterFactory`]     | [`JsonSerialization`] types             |
//! | [`JsonTreeSerializationAdapterFactory`] | [`JsonTreeSerialization`] types         |
//! | [`ListAdapterFactory`]                  | `Vec<E>`                                |
//! | [`OptionAdapterFactory`]                | `Option<E>`                             |
//! | [`SerdeAdapterFactory`]                 | anything registered with `serde` support |

// -----------------------------------------------------------------------------
// Modules

mod constructor;
mod list;
mod option;
mod serde_adapter;
mod serialization;

// -----------------------------------------------------------------------------
// Exports

pub use constructor::{ConstructorAdapter, ConstructorAdapterFactory};
pub use list::{ListAdapter, ListAdapterFactory};
pub use option::{OptionAdapter, OptionAdapterFactory};
pub use serde_adapter::{SerdeAdapter, SerdeAdapterFactory};
pub use serialization::{JsonSerialization, JsonTreeSerialization};
pub use serialization::{JsonSerializationAdapter, JsonSerializationAdapterFactory};
pub use serialization::{JsonTreeSerializationAdapter, JsonTreeSerializationAdapterFactory};
