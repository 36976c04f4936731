use alloc::boxed::Box;
use core::any::Any;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use serde_json::Value;

use crate::registry::FromType;
use crate::{Result, downcast_value};

/// `serde` support of a registered type, used by the general-purpose
/// [`SerdeAdapterFactory`](crate::bind::SerdeAdapterFactory).
///
/// Values go through a [`Value`] tree in both directions.
///
/// # Examples
///
/// ```
/// use vc_json_adapter::registry::{FromType, TypeTraitSerde};
///
/// let serde = <TypeTraitSerde as FromType<Vec<bool>>>::from_type();
/// let tree = serde.to_tree(&vec![true, false]).unwrap();
/// assert_eq!(tree.to_string(), "[true,false]");
///
/// let back = serde.from_tree(tree).unwrap();
/// assert_eq!(*back.downcast::<Vec<bool>>().unwrap(), [true, false]);
/// ```
#[derive(Clone)]
pub struct TypeTraitSerde {
    to_tree: fn(&dyn Any) -> Result<Value>,
    from_tree: fn(Value) -> Result<Box<dyn Any>>,
}

impl<T: Serialize + DeserializeOwned + Any> FromType<T> for TypeTraitSerde {
    fn from_type() -> Self {
        Self {
            to_tree: |value| Ok(serde_json::to_value(downcast_value::<T>(value)?)?),
            from_tree: |tree| Ok(Box::new(serde_json::from_value::<T>(tree)?)),
        }
    }
}

impl TypeTraitSerde {
    /// Converts `value` into a tree.
    ///
    /// Fails with [`Error::TypeMismatch`](crate::Error::TypeMismatch) if the
    /// value is not of the registered type.
    #[inline]
    pub fn to_tree(&self, value: &dyn Any) -> Result<Value> {
        (self.to_tree)(value)
    }

    /// Builds a value of the registered type from a tree.
    #[inline]
    pub fn from_tree(&self, tree: Value) -> Result<Box<dyn Any>> {
        (self.from_tree)(tree)
    }
}
