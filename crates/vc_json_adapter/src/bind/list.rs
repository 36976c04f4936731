//! `Vec<E>` as a JSON array.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use vc_json_stream::{JsonReader, JsonWriter};

use crate::registry::TypeTraitList;
use crate::{AdapterFactory, ChainPosition, Engine, JsonAdapter, Result, TypeDescriptor};

/// Builds [`ListAdapter`]s for types registered with [`TypeTraitList`].
///
/// The element adapter is resolved when the list adapter is built.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListAdapterFactory;

impl AdapterFactory for ListAdapterFactory {
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        _position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>> {
        let Some(list) = engine.registry().get_type_trait::<TypeTraitList>(ty.id()) else {
            return Ok(None);
        };
        let element = engine.resolve(&list.element())?;
        Ok(Some(Arc::new(ListAdapter {
            ty: *ty,
            list: list.clone(),
            element,
        })))
    }
}

pub struct ListAdapter {
    ty: TypeDescriptor,
    list: TypeTraitList,
    element: Arc<dyn JsonAdapter>,
}

impl JsonAdapter for ListAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        out.begin_array()?;
        self.list
            .for_each(value, |item| self.element.write(engine, out, item))?;
        out.end_array()?;
        Ok(())
    }

    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        let mut list = self.list.new_list();
        input.begin_array()?;
        while input.has_next()? {
            let item = self.element.read(engine, input)?;
            self.list.push(list.as_mut(), item)?;
        }
        input.end_array()?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::{Engine, Error};

    #[test]
    fn nested_lists() {
        let engine = Engine::builder().register::<Vec<Vec<u8>>>().build();
        let value = vec![vec![1, 2], vec![], vec![3]];
        assert_eq!(engine.to_json(&value).unwrap(), "[[1,2],[],[3]]");

        let back: Vec<Vec<u8>> = engine.from_json(" [ [1,2], [], [3] ] ").unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn element_errors_propagate() {
        let engine = Engine::builder().register::<Vec<String>>().build();
        assert!(matches!(
            engine.from_json::<Vec<String>>(r#"["a", 1]"#),
            Err(Error::Tree(_))
        ));
        assert!(matches!(
            engine.from_json::<Vec<String>>(r#"{"a": 1}"#),
            Err(Error::Stream(_))
        ));
    }
}
