use crate::registry::TypeRegistry;

/// One static registration collected by [`TypeRegistry::auto_register`].
///
/// Created by the [`auto_register!`](crate::auto_register) macro.
pub struct AutoRegistration {
    pub(crate) register: fn(&mut TypeRegistry),
}

impl AutoRegistration {
    #[doc(hidden)]
    pub const fn new(register: fn(&mut TypeRegistry)) -> Self {
        Self { register }
    }
}

inventory::collect!(AutoRegistration);

/// Declares types that [`TypeRegistry::auto_register`] registers.
///
/// Only non-generic types (or concrete instantiations) can be listed. The
/// macro must be invoked at item level.
///
/// ```no_run
/// use vc_json_adapter::registry::{FromType, GetTypeMeta, TypeMeta, TypeRegistry, TypeTraitSerde};
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl GetTypeMeta for Point {
///     fn get_type_meta() -> TypeMeta {
///         let mut meta = TypeMeta::of::<Self>();
///         meta.insert_trait::<TypeTraitSerde>(FromType::<Self>::from_type());
///         meta
///     }
/// }
///
/// vc_json_adapter::auto_register!(Point, Vec<Point>);
///
/// let mut registry = TypeRegistry::empty();
/// assert!(registry.auto_register());
/// assert!(registry.contains_type::<Vec<Point>>());
/// ```
#[macro_export]
macro_rules! auto_register {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::__macro_exports::inventory::submit! {
                $crate::registry::AutoRegistration::new(
                    $crate::registry::TypeRegistry::register::<$ty>
                )
            }
        )+
    };
}
