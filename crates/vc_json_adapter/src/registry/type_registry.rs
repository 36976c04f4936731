use alloc::string::String;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use serde_json::Value;
use vc_json_utils::TypeIdMap;
use vc_json_utils::hash::HashMap;

use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTrait};
use crate::registry::{RegisterFn, TypeTraitJsonConstructor};

// -----------------------------------------------------------------------------
// TypeRegistry

/// The store of [`TypeMeta`] records an engine resolves adapters from.
///
/// [Registering] a type stores the [`TypeMeta`] produced by its
/// [`GetTypeMeta`] implementation, then registers its dependencies: the
/// argument types of its marked constructors and whatever
/// [`GetTypeMeta::register_dependencies`] lists.
///
/// # Example
///
/// ```
/// use vc_json_adapter::registry::{TypeRegistry, TypeTraitList};
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Vec<Option<String>>>();
///
/// assert!(registry.contains_type::<Option<String>>());
///
/// let list = registry
///     .get_with_type_path("alloc::vec::Vec<core::option::Option<alloc::string::String>>")
///     .unwrap()
///     .get_trait::<TypeTraitList>()
///     .unwrap();
/// assert!(list.element().is::<Option<String>>());
/// ```
///
/// [Registering]: TypeRegistry::register
pub struct TypeRegistry {
    type_meta_table: TypeIdMap<TypeMeta>,
    type_path_to_id: HashMap<&'static str, TypeId>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty [`TypeRegistry`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            type_meta_table: TypeIdMap::new(),
            type_path_to_id: HashMap::with_hasher(vc_json_utils::hash::FixedHashState),
        }
    }

    /// Creates a registry with the built-in types.
    ///
    /// - `()` `bool` `char`
    /// - `i8 - i64` `isize`
    /// - `u8 - u64` `usize`
    /// - `f32` `f64`
    /// - `String` `serde_json::Value`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<()>();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry.register::<Value>();
        registry
    }

    // Returns `false` if the type was already registered.
    fn register_internal(
        &mut self,
        type_id: TypeId,
        get_type_meta: impl FnOnce() -> TypeMeta,
    ) -> bool {
        let type_path_to_id = &mut self.type_path_to_id;
        self.type_meta_table.try_insert(type_id, || {
            let meta = get_type_meta();
            type_path_to_id.insert(meta.ty().path(), meta.type_id());
            meta
        })
    }

    /// Registers `T` if it is not registered yet, then its dependencies.
    ///
    /// An existing registration is kept as is. Use
    /// [`insert_type_meta`](Self::insert_type_meta) to overwrite it.
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.register_internal(TypeId::of::<T>(), T::get_type_meta) {
            self.register_constructor_dependencies(TypeId::of::<T>());
            T::register_dependencies(self);
        }
    }

    fn register_constructor_dependencies(&mut self, type_id: TypeId) {
        let marker = self.get_type_trait::<TypeTraitJsonConstructor>(type_id);
        let dependencies: Vec<RegisterFn> = match marker {
            Some(marker) => marker
                .constructors()
                .iter()
                .flat_map(|ctor| ctor.dependencies().iter().copied())
                .collect(),
            None => return,
        };
        for register in dependencies {
            register(self);
        }
    }

    /// Inserts or **overwrites** a [`TypeMeta`].
    ///
    /// This does _not_ register dependencies.
    pub fn insert_type_meta(&mut self, type_meta: TypeMeta) {
        self.type_path_to_id
            .insert(type_meta.ty().path(), type_meta.type_id());
        self.type_meta_table.insert(type_meta.type_id(), type_meta);
    }

    /// Adds the type trait `D` to the already registered type `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered.
    pub fn register_type_trait<T: Any, D: TypeTrait + FromType<T>>(&mut self) {
        match self.type_meta_table.get_mut(&TypeId::of::<T>()) {
            Some(type_meta) => type_meta.insert_trait(D::from_type()),
            None => panic!(
                "Called `TypeRegistry::register_type_trait`, but the type `{}` of type trait `{}` is not registered",
                core::any::type_name::<T>(),
                core::any::type_name::<D>(),
            ),
        }
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains(&type_id)
    }

    #[inline]
    pub fn contains_type<T: ?Sized + Any>(&self) -> bool {
        self.type_meta_table.contains_type::<T>()
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    #[inline]
    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut TypeMeta> {
        self.type_meta_table.get_mut(&type_id)
    }

    /// Returns the [`TypeMeta`] registered under a full type path.
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeMeta> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Returns the type trait `T` of the type with the given [`TypeId`].
    pub fn get_type_trait<T: TypeTrait>(&self, type_id: TypeId) -> Option<&T> {
        match self.get(type_id) {
            Some(type_meta) => type_meta.get_trait::<T>(),
            None => None,
        }
    }

    /// Iterates over all registered [`TypeMeta`]s in arbitrary order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.type_meta_table.len()
    }

    /// Registers every type declared with [`auto_register!`](crate::auto_register).
    ///
    /// Returns `false` when the `auto_register` feature is disabled.
    /// Repeated calls do not duplicate registrations.
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            for entry in inventory::iter::<crate::registry::AutoRegistration> {
                (entry.register)(self);
            }
            true
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_path_to_id.keys()).finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
