use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

/// Identity of a fully reified runtime type.
///
/// Equality and hashing only look at the [`TypeId`], which already encodes
/// generic parameters, so `Vec<i32>` and `Vec<i64>` are distinct descriptors.
/// The path is kept for messages.
///
/// # Examples
///
/// ```
/// use vc_json_adapter::TypeDescriptor;
///
/// let ints = TypeDescriptor::of::<Vec<i32>>();
/// assert_eq!(ints, TypeDescriptor::of::<Vec<i32>>());
/// assert_ne!(ints, TypeDescriptor::of::<Vec<i64>>());
/// assert_eq!(ints.path(), "alloc::vec::Vec<i32>");
/// ```
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    path: &'static str,
}

impl TypeDescriptor {
    #[inline]
    pub fn of<T: ?Sized + Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: core::any::type_name::<T>(),
        }
    }

    #[inline(always)]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The full type path, e.g. `alloc::string::String`.
    #[inline(always)]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns `true` if this describes `T`.
    #[inline]
    pub fn is<T: ?Sized + Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDescriptor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.path).finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.path)
    }
}
