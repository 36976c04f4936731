//! Adapters for types that serialize themselves.
//!
//! Both capabilities only customize writing. Reading falls through to the
//! adapter the rest of the chain produces for the same type.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use serde_json::Value;
use vc_json_stream::{JsonReader, JsonWriter, tree};

use crate::registry::{TypeMeta, TypeTraitJsonSerialization, TypeTraitJsonTreeSerialization};
use crate::{AdapterFactory, ChainPosition, Engine, Error, JsonAdapter, LazyDelegate};
use crate::{Result, TypeDescriptor};

// -----------------------------------------------------------------------------
// Capabilities

/// A type that writes itself to a token stream.
///
/// Register the capability with
/// [`TypeTraitJsonSerialization`](crate::registry::TypeTraitJsonSerialization).
/// The engine is passed so nested values can be written through their own
/// adapters.
pub trait JsonSerialization: Any {
    fn to_json(&self, out: &mut JsonWriter<'_>, engine: &Engine) -> Result<()>;
}

/// A type that converts itself to a tree, which is then streamed.
///
/// Register the capability with
/// [`TypeTraitJsonTreeSerialization`](crate::registry::TypeTraitJsonTreeSerialization).
/// Returning [`Value::Null`] writes `null`.
pub trait JsonTreeSerialization: Any {
    fn to_json_tree(&self, engine: &Engine) -> Result<Value>;
}

fn ensure_single_capability(meta: &TypeMeta) -> Result<()> {
    if meta.has_trait::<TypeTraitJsonSerialization>()
        && meta.has_trait::<TypeTraitJsonTreeSerialization>()
    {
        return Err(Error::configuration(
            meta.ty(),
            "both `JsonSerialization` and `JsonTreeSerialization` are registered",
        ));
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// JsonSerialization

/// Builds [`JsonSerializationAdapter`]s for types registered with
/// [`TypeTraitJsonSerialization`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializationAdapterFactory;

impl AdapterFactory for JsonSerializationAdapterFactory {
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>> {
        let Some(meta) = engine.registry().get(ty.id()) else {
            return Ok(None);
        };
        let Some(serialization) = meta.get_trait::<TypeTraitJsonSerialization>() else {
            return Ok(None);
        };
        ensure_single_capability(meta)?;
        Ok(Some(Arc::new(JsonSerializationAdapter {
            serialization: serialization.clone(),
            delegate: LazyDelegate::new(*ty, position),
        })))
    }
}

/// Writes through [`JsonSerialization::to_json`], reads through the next
/// adapter in the chain.
pub struct JsonSerializationAdapter {
    serialization: TypeTraitJsonSerialization,
    delegate: LazyDelegate,
}

impl JsonAdapter for JsonSerializationAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.delegate.ty()
    }

    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        self.serialization.to_json(value, out, engine)
    }

    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        self.delegate.get(engine)?.read(engine, input)
    }
}

// -----------------------------------------------------------------------------
// JsonTreeSerialization

/// Builds [`JsonTreeSerializationAdapter`]s for types registered with
/// [`TypeTraitJsonTreeSerialization`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTreeSerializationAdapterFactory;

impl AdapterFactory for JsonTreeSerializationAdapterFactory {
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>> {
        let Some(meta) = engine.registry().get(ty.id()) else {
            return Ok(None);
        };
        let Some(serialization) = meta.get_trait::<TypeTraitJsonTreeSerialization>() else {
            return Ok(None);
        };
        ensure_single_capability(meta)?;
        Ok(Some(Arc::new(JsonTreeSerializationAdapter {
            serialization: serialization.clone(),
            delegate: LazyDelegate::new(*ty, position),
        })))
    }
}

/// Writes the tree from [`JsonTreeSerialization::to_json_tree`], reads
/// through the next adapter in the chain.
pub struct JsonTreeSerializationAdapter {
    serialization: TypeTraitJsonTreeSerialization,
    delegate: LazyDelegate,
}

impl JsonAdapter for JsonTreeSerializationAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.delegate.ty()
    }

    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        let tree = self.serialization.to_json_tree(value, engine)?;
        tree::write(&tree, out)?;
        Ok(())
    }

    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        self.delegate.get(engine)?.read(engine, input)
    }
}

// -----------------------------------------------------------------------------
// Tests
