mod constructor;
mod list;
mod option;
mod serde;
mod serialization;

pub use constructor::{ConstructorArg, ConstructorArgs, RegisterFn};
pub use constructor::{JsonConstructor, ParamKind, TypeTraitJsonConstructor};
pub use list::TypeTraitList;
pub use option::TypeTraitOption;
pub use serde::TypeTraitSerde;
pub use serialization::{TypeTraitJsonSerialization, TypeTraitJsonTreeSerialization};
