use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::sync::RwLock;

use vc_json_utils::TypeIdMap;

use crate::bind::{
    ConstructorAdapterFactory, JsonSerializationAdapterFactory,
    JsonTreeSerializationAdapterFactory, ListAdapterFactory, OptionAdapterFactory,
    SerdeAdapterFactory,
};
use crate::registry::{GetTypeMeta, TypeRegistry};
use crate::{AdapterFactory, Engine};

// -----------------------------------------------------------------------------
// EngineConfig

/// Runtime options of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Install [`ConstructorAdapterFactory`], so marked constructors are used
    /// for reading. Off by default.
    pub constructor_scanning: bool,
    /// Keep object members whose value is `null`. Off by default.
    pub serialize_nulls: bool,
    /// Indent output with two spaces. Off by default.
    pub pretty_printing: bool,
}

// -----------------------------------------------------------------------------
// EngineBuilder

/// Assembles the registry, the factory chain and the options of an [`Engine`].
///
/// User factories run before the built-in ones, in registration order.
///
/// # Examples
///
/// ```
/// use vc_json_adapter::Engine;
///
/// let engine = Engine::builder()
///     .register::<Vec<Option<String>>>()
///     .serialize_nulls(true)
///     .build();
///
/// let value = vec![Some(String::from("a")), None];
/// assert_eq!(engine.to_json(&value).unwrap(), r#"["a",null]"#);
/// assert!(engine.config().serialize_nulls);
/// ```
pub struct EngineBuilder {
    registry: TypeRegistry,
    factories: Vec<Arc<dyn AdapterFactory>>,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    /// Creates a builder whose registry holds the built-in types.
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            factories: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Registers `T` and its dependencies, see [`TypeRegistry::register`].
    #[must_use]
    pub fn register<T: GetTypeMeta>(mut self) -> Self {
        self.registry.register::<T>();
        self
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Registers every type declared with [`auto_register!`](crate::auto_register).
    #[cfg(feature = "auto_register")]
    #[must_use]
    pub fn auto_register(mut self) -> Self {
        self.registry.auto_register();
        self
    }

    /// Appends a user factory to the chain.
    #[must_use]
    pub fn register_type_adapter_factory(mut self, factory: impl AdapterFactory) -> Self {
        self.factories.push(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn enable_constructor_scanning(mut self) -> Self {
        self.config.constructor_scanning = true;
        self
    }

    #[must_use]
    pub fn serialize_nulls(mut self, serialize_nulls: bool) -> Self {
        self.config.serialize_nulls = serialize_nulls;
        self
    }

    #[must_use]
    pub fn pretty_printing(mut self, pretty_printing: bool) -> Self {
        self.config.pretty_printing = pretty_printing;
        self
    }

    /// Replaces all options at once.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Freezes the chain and creates the engine.
    pub fn build(self) -> Engine {
        let Self {
            registry,
            mut factories,
            config,
        } = self;

        if config.constructor_scanning {
            factories.push(Arc::new(ConstructorAdapterFactory));
        }
        factories.push(Arc::new(JsonSerializationAdapterFactory));
        factories.push(Arc::new(JsonTreeSerializationAdapterFactory));
        factories.push(Arc::new(ListAdapterFactory));
        factories.push(Arc::new(OptionAdapterFactory));
        factories.push(Arc::new(SerdeAdapterFactory));

        log::debug!(
            "engine built with {} factories and {} registered types",
            factories.len(),
            registry.len()
        );

        Engine {
            registry,
            factories,
            cache: RwLock::new(TypeIdMap::new()),
            config,
        }
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("registry", &self.registry)
            .field("factories", &self.factories.len())
            .field("config", &self.config)
            .finish()
    }
}
