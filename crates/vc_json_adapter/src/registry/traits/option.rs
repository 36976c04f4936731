use alloc::boxed::Box;
use core::any::Any;

use crate::registry::FromType;
use crate::{Result, TypeDescriptor, downcast_boxed, downcast_value};

/// Erased access to an `Option<E>`, used by
/// [`OptionAdapterFactory`](crate::bind::OptionAdapterFactory).
#[derive(Clone)]
pub struct TypeTraitOption {
    element: TypeDescriptor,
    none: fn() -> Box<dyn Any>,
    some: fn(Box<dyn Any>) -> Result<Box<dyn Any>>,
    get: fn(&dyn Any) -> Result<Option<&dyn Any>>,
}

impl<E: Any> FromType<Option<E>> for TypeTraitOption {
    fn from_type() -> Self {
        Self {
            element: TypeDescriptor::of::<E>(),
            none: || Box::new(None::<E>),
            some: |item| Ok(Box::new(Some(downcast_boxed::<E>(item)?))),
            get: |value| {
                let value = downcast_value::<Option<E>>(value)?;
                Ok(value.as_ref().map(|item| item as &dyn Any))
            },
        }
    }
}

impl TypeTraitOption {
    #[inline]
    pub fn element(&self) -> TypeDescriptor {
        self.element
    }

    #[inline]
    pub fn none(&self) -> Box<dyn Any> {
        (self.none)()
    }

    /// Wraps an element into `Some`.
    #[inline]
    pub fn some(&self, item: Box<dyn Any>) -> Result<Box<dyn Any>> {
        (self.some)(item)
    }

    /// Returns the contained element, if any.
    #[inline]
    pub fn get<'a>(&self, value: &'a dyn Any) -> Result<Option<&'a dyn Any>> {
        (self.get)(value)
    }
}
