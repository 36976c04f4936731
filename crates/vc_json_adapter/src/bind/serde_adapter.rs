//! The strategy of last resort: `serde` through a [`Value`](serde_json::Value) tree.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use vc_json_stream::{JsonReader, JsonWriter, tree};

use crate::registry::TypeTraitSerde;
use crate::{AdapterFactory, ChainPosition, Engine, JsonAdapter, Result, TypeDescriptor};

/// Builds [`SerdeAdapter`]s for types registered with [`TypeTraitSerde`].
///
/// Always the last factory of the chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeAdapterFactory;

impl AdapterFactory for SerdeAdapterFactory {
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        _position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>> {
        Ok(engine
            .registry()
            .get_type_trait::<TypeTraitSerde>(ty.id())
            .map(|serde| {
                Arc::new(SerdeAdapter {
                    ty: *ty,
                    serde: serde.clone(),
                }) as Arc<dyn JsonAdapter>
            }))
    }
}

pub struct SerdeAdapter {
    ty: TypeDescriptor,
    serde: TypeTraitSerde,
}

impl JsonAdapter for SerdeAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    fn write(&self, _engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        let tree = self.serde.to_tree(value)?;
        tree::write(&tree, out)?;
        Ok(())
    }

    fn read(&self, _engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        let tree = tree::read(input)?;
        self.serde.from_tree(tree)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;

    use serde::{Deserialize, Serialize};

    use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTraitSerde};
    use crate::{Engine, Error};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Config {
        name: String,
        retries: Option<u32>,
    }

    impl GetTypeMeta for Config {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait::<TypeTraitSerde>(FromType::<Self>::from_type());
            meta
        }
    }

    #[test]
    fn null_members_follow_engine_config() {
        let value = Config {
            name: String::from("svc"),
            retries: None,
        };

        let engine = Engine::builder().register::<Config>().build();
        assert_eq!(engine.to_json(&value).unwrap(), r#"{"name":"svc"}"#);

        let engine = Engine::builder()
            .register::<Config>()
            .serialize_nulls(true)
            .build();
        assert_eq!(
            engine.to_json(&value).unwrap(),
            r#"{"name":"svc","retries":null}"#
        );
        assert_eq!(engine.from_json::<Config>(r#"{"name":"svc"}"#).unwrap(), value);
    }

    #[test]
    fn pretty_printing() {
        let engine = Engine::builder()
            .register::<Config>()
            .pretty_printing(true)
            .build();
        let value = Config {
            name: String::from("svc"),
            retries: Some(3),
        };
        assert_eq!(
            engine.to_json(&value).unwrap(),
            "{\n  \"name\": \"svc\",\n  \"retries\": 3\n}"
        );
    }

    #[test]
    fn malformed_documents() {
        let engine = Engine::builder().register::<Config>().build();
        assert!(matches!(
            engine.from_json::<Config>(r#"{"name": }"#),
            Err(Error::Stream(_))
        ));
        assert!(matches!(
            engine.from_json::<Config>(r#"{"name": "a"} trailing"#),
            Err(Error::Stream(_))
        ));
        assert!(matches!(
            engine.from_json::<Config>(r#"{"retries": 1}"#),
            Err(Error::Tree(_))
        ));
    }

    #[test]
    fn deep_nesting_is_a_stream_error() {
        let engine = Engine::builder().register::<Config>().build();
        let depth = 100_000;
        let text = format!(r#"{{"name": {}{}}}"#, "[".repeat(depth), "]".repeat(depth));
        assert!(matches!(
            engine.from_json::<Config>(&text),
            Err(Error::Stream(_))
        ));
    }
}
