use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::registry::FromType;
use crate::{Error, Result, TypeDescriptor, downcast_boxed, downcast_value};

/// Erased access to a `Vec<E>`, used by
/// [`ListAdapterFactory`](crate::bind::ListAdapterFactory).
#[derive(Clone)]
pub struct TypeTraitList {
    element: TypeDescriptor,
    new: fn() -> Box<dyn Any>,
    push: fn(&mut dyn Any, Box<dyn Any>) -> Result<()>,
    for_each: fn(&dyn Any, &mut dyn FnMut(&dyn Any) -> Result<()>) -> Result<()>,
}

impl<E: Any> FromType<Vec<E>> for TypeTraitList {
    fn from_type() -> Self {
        Self {
            element: TypeDescriptor::of::<E>(),
            new: || Box::new(Vec::<E>::new()),
            push: |list, item| {
                let list = list
                    .downcast_mut::<Vec<E>>()
                    .ok_or_else(Error::type_mismatch::<Vec<E>>)?;
                list.push(downcast_boxed::<E>(item)?);
                Ok(())
            },
            for_each: |list, f| {
                for item in downcast_value::<Vec<E>>(list)? {
                    f(item)?;
                }
                Ok(())
            },
        }
    }
}

impl TypeTraitList {
    /// The element type.
    #[inline]
    pub fn element(&self) -> TypeDescriptor {
        self.element
    }

    /// Creates an empty list.
    #[inline]
    pub fn new_list(&self) -> Box<dyn Any> {
        (self.new)()
    }

    #[inline]
    pub fn push(&self, list: &mut dyn Any, item: Box<dyn Any>) -> Result<()> {
        (self.push)(list, item)
    }

    /// Visits the elements in order, stopping at the first error.
    #[inline]
    pub fn for_each(
        &self,
        list: &dyn Any,
        mut f: impl FnMut(&dyn Any) -> Result<()>,
    ) -> Result<()> {
        (self.for_each)(list, &mut f)
    }
}
