//! `Option<E>` as `null` or the element.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use vc_json_stream::{JsonReader, JsonToken, JsonWriter};

use crate::registry::TypeTraitOption;
use crate::{AdapterFactory, ChainPosition, Engine, JsonAdapter, Result, TypeDescriptor};

/// Builds [`OptionAdapter`]s for types registered with [`TypeTraitOption`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OptionAdapterFactory;

impl AdapterFactory for OptionAdapterFactory {
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        _position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>> {
        let Some(option) = engine.registry().get_type_trait::<TypeTraitOption>(ty.id()) else {
            return Ok(None);
        };
        let element = engine.resolve(&option.element())?;
        Ok(Some(Arc::new(OptionAdapter {
            ty: *ty,
            option: option.clone(),
            element,
        })))
    }
}

/// `None` is `null`. Anything else is read and written by the element adapter.
pub struct OptionAdapter {
    ty: TypeDescriptor,
    option: TypeTraitOption,
    element: Arc<dyn JsonAdapter>,
}

impl JsonAdapter for OptionAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        match self.option.get(value)? {
            Some(item) => self.element.write(engine, out, item),
            None => Ok(out.null()?),
        }
    }

    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        if input.peek()? == JsonToken::Null {
            input.next_null()?;
            return Ok(self.option.none());
        }
        let item = self.element.read(engine, input)?;
        self.option.some(item)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::Engine;

    #[test]
    fn null_and_present_elements() {
        let engine = Engine::builder()
            .register::<Vec<Option<i32>>>()
            .serialize_nulls(true)
            .build();
        let value = vec![Some(1), None, Some(-3)];
        assert_eq!(engine.to_json(&value).unwrap(), "[1,null,-3]");

        let back: Vec<Option<i32>> = engine.from_json("[null, 7]").unwrap();
        assert_eq!(back, [None, Some(7)]);
    }

    #[test]
    fn top_level_none() {
        let engine = Engine::builder().register::<Option<u8>>().build();
        assert_eq!(engine.from_json::<Option<u8>>("null").unwrap(), None);
        assert_eq!(engine.to_json(&Some(5_u8)).unwrap(), "5");
    }
}
