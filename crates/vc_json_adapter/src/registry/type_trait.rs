use alloc::boxed::Box;
use core::any::Any;

/// A capability of a registered type, stored in its [`TypeMeta`].
///
/// Type traits are keyed by their own [`TypeId`](core::any::TypeId), so a
/// [`TypeMeta`] holds at most one value of each type trait. Any
/// `Clone + Send + Sync + 'static` type is a type trait.
///
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait TypeTrait: Any + Send + Sync {
    /// Clones the trait object.
    fn clone_type_trait(&self) -> Box<dyn TypeTrait>;
}

impl<T: Clone + Any + Send + Sync> TypeTrait for T {
    #[inline]
    fn clone_type_trait(&self) -> Box<dyn TypeTrait> {
        Box::new(self.clone())
    }
}

impl dyn TypeTrait {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: TypeTrait>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: TypeTrait>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

impl core::fmt::Debug for dyn TypeTrait {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("TypeTrait")
    }
}
