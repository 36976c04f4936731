use core::any::Any;

use serde_json::Value;
use vc_json_stream::JsonWriter;

use crate::bind::{JsonSerialization, JsonTreeSerialization};
use crate::registry::FromType;
use crate::{Engine, Result, downcast_value};

// -----------------------------------------------------------------------------
// TypeTraitJsonSerialization

/// Marks a type implementing [`JsonSerialization`].
///
/// ```
/// use vc_json_adapter::registry::{FromType, TypeMeta, TypeTraitJsonSerialization};
/// use vc_json_adapter::{Engine, JsonSerialization, Result};
/// use vc_json_stream::JsonWriter;
///
/// struct Flag;
///
/// impl JsonSerialization for Flag {
///     fn to_json(&self, out: &mut JsonWriter<'_>, _engine: &Engine) -> Result<()> {
///         Ok(out.bool(true)?)
///     }
/// }
///
/// let mut meta = TypeMeta::of::<Flag>();
/// meta.insert_trait::<TypeTraitJsonSerialization>(FromType::<Flag>::from_type());
/// ```
#[derive(Clone)]
pub struct TypeTraitJsonSerialization {
    to_json: fn(&dyn Any, &mut JsonWriter<'_>, &Engine) -> Result<()>,
}

impl<T: JsonSerialization> FromType<T> for TypeTraitJsonSerialization {
    fn from_type() -> Self {
        Self {
            to_json: |value, out, engine| downcast_value::<T>(value)?.to_json(out, engine),
        }
    }
}

impl TypeTraitJsonSerialization {
    #[inline]
    pub fn to_json(
        &self,
        value: &dyn Any,
        out: &mut JsonWriter<'_>,
        engine: &Engine,
    ) -> Result<()> {
        (self.to_json)(value, out, engine)
    }
}

// -----------------------------------------------------------------------------
// TypeTraitJsonTreeSerialization

/// Marks a type implementing [`JsonTreeSerialization`].
#[derive(Clone)]
pub struct TypeTraitJsonTreeSerialization {
    to_json_tree: fn(&dyn Any, &Engine) -> Result<Value>,
}

impl<T: JsonTreeSerialization> FromType<T> for TypeTraitJsonTreeSerialization {
    fn from_type() -> Self {
        Self {
            to_json_tree: |value, engine| downcast_value::<T>(value)?.to_json_tree(engine),
        }
    }
}

impl TypeTraitJsonTreeSerialization {
    #[inline]
    pub fn to_json_tree(&self, value: &dyn Any, engine: &Engine) -> Result<Value> {
        (self.to_json_tree)(value, engine)
    }
}
