use core::any::Any;

/// Builds a [`TypeTrait`] for the type `T`.
///
/// Used by [`GetTypeMeta`] implementations to fill a [`TypeMeta`]:
///
/// ```
/// use vc_json_adapter::registry::{FromType, TypeMeta, TypeTraitSerde};
///
/// let mut meta = TypeMeta::of::<String>();
/// meta.insert_trait::<TypeTraitSerde>(FromType::<String>::from_type());
/// assert!(meta.has_trait::<TypeTraitSerde>());
/// ```
///
/// [`TypeTrait`]: crate::registry::TypeTrait
/// [`GetTypeMeta`]: crate::registry::GetTypeMeta
/// [`TypeMeta`]: crate::registry::TypeMeta
pub trait FromType<T: Any> {
    fn from_type() -> Self;
}
