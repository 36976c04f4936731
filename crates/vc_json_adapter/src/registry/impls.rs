use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Value;

use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeRegistry};
use crate::registry::{TypeTraitList, TypeTraitOption, TypeTraitSerde};

macro_rules! impl_serde_type_meta {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl GetTypeMeta for $ty {
                fn get_type_meta() -> TypeMeta {
                    let mut meta = TypeMeta::with_capacity::<Self>(1);
                    meta.insert_trait::<TypeTraitSerde>(FromType::<Self>::from_type());
                    meta
                }
            }
        )+
    };
}

impl_serde_type_meta!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    Value,
);

impl<E: GetTypeMeta> GetTypeMeta for Vec<E> {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::with_capacity::<Self>(1);
        meta.insert_trait::<TypeTraitList>(FromType::<Self>::from_type());
        meta
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<E>();
    }
}

impl<E: GetTypeMeta> GetTypeMeta for Option<E> {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::with_capacity::<Self>(1);
        meta.insert_trait::<TypeTraitOption>(FromType::<Self>::from_type());
        meta
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<E>();
    }
}
