use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;
use core::ops::Deref;

use vc_json_utils::TypeIdMap;

use crate::TypeDescriptor;
use crate::registry::{TypeRegistry, TypeTrait};

// -----------------------------------------------------------------------------
// TypeMeta

/// Registration record of one type: its descriptor and its [`TypeTrait`] table.
///
/// Factories decide whether they handle a type by looking for the type traits
/// they understand, e.g. [`TypeTraitSerde`] or [`TypeTraitJsonConstructor`].
///
/// # Example
///
/// ```
/// use vc_json_adapter::registry::{FromType, TypeMeta, TypeTraitSerde};
///
/// let mut meta = TypeMeta::of::<u8>();
/// meta.insert_trait::<TypeTraitSerde>(FromType::<u8>::from_type());
///
/// assert_eq!(meta.ty().path(), "u8");
/// assert!(meta.get_trait::<TypeTraitSerde>().is_some());
/// ```
///
/// [`TypeTraitSerde`]: crate::registry::TypeTraitSerde
/// [`TypeTraitJsonConstructor`]: crate::registry::TypeTraitJsonConstructor
pub struct TypeMeta {
    ty: TypeDescriptor,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    /// Creates a [`TypeMeta`] without type traits.
    #[inline]
    pub fn of<T: Any>() -> Self {
        Self {
            ty: TypeDescriptor::of::<T>(),
            trait_table: TypeIdMap::new(),
        }
    }

    #[inline]
    pub fn with_capacity<T: Any>(capacity: usize) -> Self {
        Self {
            ty: TypeDescriptor::of::<T>(),
            trait_table: TypeIdMap::with_capacity(capacity),
        }
    }

    #[inline(always)]
    pub const fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    /// Inserts or replaces a [`TypeTrait`].
    #[inline]
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.insert_trait_by_id(TypeId::of::<T>(), Box::new(data));
    }

    #[inline(never)]
    fn insert_trait_by_id(&mut self, id: TypeId, val: Box<dyn TypeTrait>) {
        self.trait_table.insert(id, val);
    }

    /// Removes a [`TypeTrait`] from the meta.
    pub fn remove_trait<T: TypeTrait>(&mut self) -> Option<Box<T>> {
        let removed: Box<dyn Any> = self.trait_table.remove(&TypeId::of::<T>())?;
        removed.downcast::<T>().ok()
    }

    #[inline]
    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        self.get_trait_by_id(TypeId::of::<T>())
            .and_then(<dyn TypeTrait>::downcast_ref)
    }

    pub fn get_trait_by_id(&self, type_id: TypeId) -> Option<&dyn TypeTrait> {
        self.trait_table.get(&type_id).map(Deref::deref)
    }

    #[inline]
    pub fn get_trait_mut<T: TypeTrait>(&mut self) -> Option<&mut T> {
        self.trait_table
            .get_mut(&TypeId::of::<T>())
            .and_then(|data| data.downcast_mut::<T>())
    }

    #[inline]
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains(&TypeId::of::<T>())
    }

    #[inline]
    pub fn trait_len(&self) -> usize {
        self.trait_table.len()
    }
}

impl Clone for TypeMeta {
    fn clone(&self) -> Self {
        let mut trait_table = TypeIdMap::with_capacity(self.trait_len());
        for id in self.trait_table.types() {
            if let Some(data) = self.trait_table.get(id) {
                trait_table.insert(*id, (**data).clone_type_trait());
            }
        }
        Self {
            ty: self.ty,
            trait_table,
        }
    }
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("ty", &self.ty)
            .field("traits", &self.trait_table.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// Provides the registration record of a type.
///
/// This is the explicit replacement for annotations: a type lists its
/// capabilities as type traits, and [`TypeRegistry::register`] stores them.
///
/// ```
/// use vc_json_adapter::registry::{
///     GetTypeMeta, JsonConstructor, TypeMeta, TypeRegistry, TypeTraitJsonConstructor,
/// };
///
/// struct Celsius(f64);
///
/// impl GetTypeMeta for Celsius {
///     fn get_type_meta() -> TypeMeta {
///         let mut meta = TypeMeta::of::<Self>();
///         meta.insert_trait(TypeTraitJsonConstructor::new(
///             JsonConstructor::from_value("Celsius", |degrees: f64| Ok(Celsius(degrees))),
///         ));
///         meta
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Celsius>();
/// assert!(registry.contains_type::<Celsius>());
/// assert!(registry.contains_type::<f64>());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `GetTypeMeta` so cannot be registered",
    note = "implement `GetTypeMeta` for `{Self}` and list its capabilities as type traits"
)]
pub trait GetTypeMeta: Any {
    /// Returns the registration record of this type.
    fn get_type_meta() -> TypeMeta;

    /// Registers other types needed by this type.
    ///
    /// Argument types of marked constructors are registered automatically.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
