//! The resolver and the conversion facade.
//!
//! An [`Engine`] owns a frozen chain of [`AdapterFactory`]s. Resolving a type
//! walks the chain from the start and caches the first adapter produced.
//! Adapters that wrap another strategy for the same type ask for "the adapter
//! after me" with [`Engine::resolve_after`], which never consults the factory
//! that asked, nor any factory before it.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod future;

// -----------------------------------------------------------------------------
// Exports

pub use builder::{EngineBuilder, EngineConfig};

// -----------------------------------------------------------------------------
// Engine

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use std::io;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use vc_json_stream::{JsonReader, JsonWriter, tree};
use vc_json_utils::TypeIdMap;

use crate::registry::TypeRegistry;
use crate::{AdapterFactory, ChainPosition, Error, JsonAdapter, Result, TypeAdapter};
use crate::{TypeDescriptor, downcast_boxed};

/// Converts values to and from JSON through a chain of adapter factories.
///
/// `Engine` is `Send + Sync`. Resolved adapters are cached per type and
/// shared by every thread using the engine.
///
/// # Examples
///
/// ```
/// use vc_json_adapter::Engine;
///
/// let engine = Engine::builder().register::<Vec<i64>>().build();
///
/// let json = engine.to_json(&vec![1_i64, -2]).unwrap();
/// assert_eq!(json, "[1,-2]");
///
/// let back: Vec<i64> = engine.from_json(&json).unwrap();
/// assert_eq!(back, [1, -2]);
/// ```
pub struct Engine {
    pub(crate) registry: TypeRegistry,
    pub(crate) factories: Vec<Arc<dyn AdapterFactory>>,
    pub(crate) cache: RwLock<TypeIdMap<Arc<dyn JsonAdapter>>>,
    pub(crate) config: EngineConfig,
}

impl Default for Engine {
    /// See [`Engine::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with the built-in types and default options.
    #[inline]
    pub fn new() -> Self {
        EngineBuilder::new().build()
    }

    #[inline]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    #[inline]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The frozen factory chain, user factories first.
    #[inline]
    pub fn factories(&self) -> &[Arc<dyn AdapterFactory>] {
        &self.factories
    }

    // -------------------------------------------------------------------------
    // Resolution

    #[inline]
    fn address(&self) -> usize {
        self as *const Self as usize
    }

    fn cached(&self, ty: &TypeDescriptor) -> Option<Arc<dyn JsonAdapter>> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(&ty.id()).cloned()
    }

    fn scan(&self, start: usize, ty: &TypeDescriptor) -> Result<Arc<dyn JsonAdapter>> {
        for (index, factory) in self.factories.iter().enumerate().skip(start) {
            if let Some(adapter) = factory.create(self, ty, ChainPosition::new(index))? {
                log::trace!("`{ty}` handled by {} at factory #{index}", factory.name());
                return Ok(adapter);
            }
        }

        let reason: Cow<'static, str> = if !self.registry.contains(ty.id()) {
            Cow::Borrowed("the type is not registered")
        } else if start == 0 {
            Cow::Borrowed("no factory handles the type")
        } else {
            Cow::Owned(alloc::format!(
                "no factory after factory #{} handles the type",
                start - 1
            ))
        };
        Err(Error::adapter_resolution(*ty, reason))
    }

    /// Returns the adapter for `ty`, building and caching it on first use.
    ///
    /// Adapters built while resolving `ty` are cached together with it once
    /// it succeeds. If it fails, none of them are cached.
    pub fn resolve(&self, ty: &TypeDescriptor) -> Result<Arc<dyn JsonAdapter>> {
        if let Some(adapter) = self.cached(ty) {
            return Ok(adapter);
        }
        // Pending on this thread: `ty` depends on itself, or was completed
        // inside a resolution that has not finished yet.
        if let Some(adapter) = future::pending(self.address(), ty.id()) {
            log::trace!("`{ty}` is pending, reusing its adapter");
            return Ok(adapter);
        }

        let guard = future::PendingGuard::push(self.address(), *ty);
        let adapter = self.scan(0, ty)?;
        match guard.complete(&adapter) {
            future::Completion::Nested => {
                log::trace!("resolved `{ty}` inside an enclosing resolution");
                Ok(adapter)
            }
            future::Completion::Outermost(resolved) => Ok(self.commit(ty, adapter, resolved)),
        }
    }

    // Caches everything resolved by one outermost resolution.
    fn commit(
        &self,
        ty: &TypeDescriptor,
        mut adapter: Arc<dyn JsonAdapter>,
        resolved: future::Deferred,
    ) -> Arc<dyn JsonAdapter> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        for (type_id, entry) in resolved {
            match cache.get(&type_id) {
                Some(existing) => {
                    log::warn!(
                        "`{}` was resolved concurrently, keeping the first adapter",
                        entry.ty()
                    );
                    if type_id == ty.id() {
                        adapter = Arc::clone(existing);
                    }
                }
                None => {
                    log::debug!("resolved adapter for `{}`", entry.ty());
                    cache.insert(type_id, entry);
                }
            }
        }
        adapter
    }

    /// Returns the adapter the chain produces for `ty` when every factory up to
    /// and including `position` is skipped.
    ///
    /// The result is not cached.
    pub fn resolve_after(
        &self,
        position: ChainPosition,
        ty: &TypeDescriptor,
    ) -> Result<Arc<dyn JsonAdapter>> {
        log::trace!("delegating `{ty}` past {position}");
        self.scan(position.index() + 1, ty)
    }

    /// Returns the adapter the chain produces for `ty` after `skip_past`.
    ///
    /// `skip_past` is located by identity. A factory that is not part of this
    /// engine's chain skips nothing, the scan then starts at the first factory.
    pub fn delegate_adapter(
        &self,
        skip_past: &dyn AdapterFactory,
        ty: &TypeDescriptor,
    ) -> Result<Arc<dyn JsonAdapter>> {
        let found = self.factories.iter().position(|factory| {
            core::ptr::addr_eq(Arc::as_ptr(factory), skip_past as *const dyn AdapterFactory)
        });
        match found {
            Some(index) => self.resolve_after(ChainPosition::new(index), ty),
            None => self.scan(0, ty),
        }
    }

    /// Returns the typed adapter for `T`.
    pub fn adapter<T: Any>(&self) -> Result<TypeAdapter<T>> {
        let adapter = self.resolve(&TypeDescriptor::of::<T>())?;
        Ok(TypeAdapter::new(adapter))
    }

    // -------------------------------------------------------------------------
    // Facade

    fn writer<'w>(&self, out: &'w mut dyn io::Write) -> JsonWriter<'w> {
        JsonWriter::new(out)
            .pretty(self.config.pretty_printing)
            .serialize_nulls(self.config.serialize_nulls)
    }

    fn write_document(
        &self,
        value: &dyn Any,
        ty: &TypeDescriptor,
        mut writer: JsonWriter<'_>,
    ) -> Result<()> {
        let adapter = self.resolve(ty)?;
        adapter.write(self, &mut writer, value)?;
        writer.finish()?;
        Ok(())
    }

    /// Writes `value` as one complete document to `out`.
    pub fn to_writer<T: Any>(&self, value: &T, out: &mut dyn io::Write) -> Result<()> {
        self.write_document(value, &TypeDescriptor::of::<T>(), self.writer(out))
    }

    /// Converts `value` to a JSON string.
    pub fn to_json<T: Any>(&self, value: &T) -> Result<String> {
        let mut out = Vec::new();
        self.to_writer(value, &mut out)?;
        String::from_utf8(out).map_err(Error::other)
    }

    /// Reads one complete document of type `T`.
    ///
    /// Anything but whitespace after the value is an error.
    pub fn from_json<T: Any>(&self, json: &str) -> Result<T> {
        let adapter = self.resolve(&TypeDescriptor::of::<T>())?;
        let mut reader = JsonReader::new(json);
        let value = adapter.read(self, &mut reader)?;
        reader.finish()?;
        downcast_boxed(value)
    }

    /// Converts `value` to a tree.
    ///
    /// Object members that are `null` are kept only if
    /// [`serialize_nulls`](EngineConfig::serialize_nulls) is set.
    pub fn to_tree<T: Any>(&self, value: &T) -> Result<Value> {
        let mut out = Vec::new();
        let writer = self.writer(&mut out).pretty(false);
        self.write_document(value, &TypeDescriptor::of::<T>(), writer)?;

        let json = core::str::from_utf8(&out).map_err(Error::other)?;
        Ok(tree::read(&mut JsonReader::new(json))?)
    }

    /// Reads a value of type `T` from a tree.
    pub fn from_tree<T: Any>(&self, tree: &Value) -> Result<T> {
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out);
        tree::write(tree, &mut writer)?;
        writer.finish()?;

        let json = core::str::from_utf8(&out).map_err(Error::other)?;
        self.from_json(json)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories: Vec<&str> = self.factories.iter().map(|f| f.name()).collect();
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("factories", &factories)
            .field("cached", &cached)
            .field("config", &self.config)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::PoisonError;
    use std::thread;

    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use vc_json_stream::{JsonReader, JsonWriter};

    use crate::bind::JsonSerialization;
    use crate::registry::{
        FromType, GetTypeMeta, JsonConstructor, ParamKind, TypeMeta, TypeTraitJsonConstructor,
        TypeTraitJsonSerialization, TypeTraitSerde,
    };
    use crate::{
        AdapterFactory, ChainPosition, Engine, EngineConfig, Error, JsonAdapter, LazyDelegate,
        Result, TypeDescriptor, downcast_value,
    };

    // -------------------------------------------------------------------------
    // A user factory that upper-cases strings on write

    struct Shouting {
        calls: Arc<AtomicUsize>,
    }

    impl AdapterFactory for Shouting {
        fn create(
            &self,
            _engine: &Engine,
            ty: &TypeDescriptor,
            position: ChainPosition,
        ) -> Result<Option<Arc<dyn JsonAdapter>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !ty.is::<String>() {
                return Ok(None);
            }
            Ok(Some(Arc::new(ShoutingAdapter {
                delegate: LazyDelegate::new(*ty, position),
            })))
        }
    }

    struct ShoutingAdapter {
        delegate: LazyDelegate,
    }

    impl JsonAdapter for ShoutingAdapter {
        fn ty(&self) -> TypeDescriptor {
            self.delegate.ty()
        }

        fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
            let loud = downcast_value::<String>(value)?.to_uppercase();
            self.delegate.get(engine)?.write(engine, out, &loud)
        }

        fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
            self.delegate.get(engine)?.read(engine, input)
        }
    }

    fn shouting() -> (Engine, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = Engine::builder()
            .register_type_adapter_factory(Shouting {
                calls: Arc::clone(&calls),
            })
            .build();
        (engine, calls)
    }

    #[test]
    fn user_factories_run_first() {
        let (engine, _) = shouting();
        assert_eq!(engine.to_json(&String::from("hi")).unwrap(), r#""HI""#);
        assert_eq!(engine.from_json::<String>(r#""quiet""#).unwrap(), "quiet");
        // Other types fall through to the built-in factories.
        assert_eq!(engine.to_json(&3_u8).unwrap(), "3");
    }

    #[test]
    fn resolution_is_cached() {
        let (engine, calls) = shouting();
        let first = engine.adapter::<String>().unwrap();
        let second = engine.adapter::<String>().unwrap();
        assert!(Arc::ptr_eq(first.erased(), second.erased()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delegation_skips_the_originating_factory() {
        let (engine, calls) = shouting();
        engine.to_json(&String::from("a")).unwrap();
        engine.to_json(&String::from("b")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let after = engine
            .resolve_after(ChainPosition::new(0), &TypeDescriptor::of::<String>())
            .unwrap();
        let mut out = Vec::new();
        let mut writer = JsonWriter::new(&mut out);
        after.write(&engine, &mut writer, &String::from("low")).unwrap();
        assert_eq!(out, br#""low""#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delegate_adapter_locates_factories_by_identity() {
        let (engine, calls) = shouting();
        let ty = TypeDescriptor::of::<String>();

        let in_chain = Arc::clone(&engine.factories()[0]);
        let skipped = engine.delegate_adapter(in_chain.as_ref(), &ty).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // An equal but distinct factory is not part of the chain.
        let stranger = Shouting {
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let full = engine.delegate_adapter(&stranger, &ty).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!Arc::ptr_eq(&skipped, &full));

        let render = |adapter: &Arc<dyn JsonAdapter>| {
            let mut out = Vec::new();
            adapter
                .write(&engine, &mut JsonWriter::new(&mut out), &String::from("x"))
                .unwrap();
            out
        };
        assert_eq!(render(&skipped), br#""x""#);
        assert_eq!(render(&full), br#""X""#);
    }

    #[test]
    fn delegation_at_the_end_of_the_chain_fails() {
        let engine = Engine::new();
        let last = ChainPosition::new(engine.factories().len() - 1);
        let err = engine
            .resolve_after(last, &TypeDescriptor::of::<u8>())
            .unwrap_err();
        assert!(matches!(err, Error::AdapterResolution { .. }));
    }

    // -------------------------------------------------------------------------
    // Failures

    struct Unknown;

    struct Failing {
        calls: Arc<AtomicUsize>,
    }

    impl AdapterFactory for Failing {
        fn create(
            &self,
            _engine: &Engine,
            ty: &TypeDescriptor,
            _position: ChainPosition,
        ) -> Result<Option<Arc<dyn JsonAdapter>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::configuration(*ty, "always fails"))
        }
    }

    #[test]
    fn unregistered_types_have_no_adapter() {
        let engine = Engine::new();
        let err = engine.adapter::<Unknown>().unwrap_err();
        assert!(matches!(err, Error::AdapterResolution { ty, .. } if ty.is::<Unknown>()));
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn factory_errors_abort_and_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = Engine::builder()
            .register_type_adapter_factory(Failing {
                calls: Arc::clone(&calls),
            })
            .build();
        assert!(matches!(engine.to_json(&1_u8), Err(Error::Configuration { .. })));
        assert!(matches!(engine.to_json(&1_u8), Err(Error::Configuration { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    // -------------------------------------------------------------------------
    // Recursive types

    struct Tree(Vec<Tree>);

    impl Tree {
        fn count(&self) -> usize {
            1 + self.0.iter().map(Tree::count).sum::<usize>()
        }
    }

    impl JsonSerialization for Tree {
        fn to_json(&self, out: &mut JsonWriter<'_>, engine: &Engine) -> Result<()> {
            let adapter = engine.adapter::<Tree>()?;
            out.begin_array()?;
            for child in &self.0 {
                adapter.write(engine, out, child)?;
            }
            out.end_array()?;
            Ok(())
        }
    }

    impl GetTypeMeta for Tree {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait::<TypeTraitJsonSerialization>(FromType::<Self>::from_type());
            meta.insert_trait(TypeTraitJsonConstructor::new(JsonConstructor::from_value(
                "Tree::new",
                |children: Vec<Tree>| Ok(Tree(children)),
            )));
            meta
        }
    }

    fn is_cached<T: Any>(engine: &Engine) -> bool {
        engine
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_type::<T>()
    }

    #[test]
    fn recursive_types_resolve() {
        let engine = Engine::builder()
            .enable_constructor_scanning()
            .register::<Tree>()
            .build();
        let tree: Tree = engine.from_json("[[], [[]]]").unwrap();
        assert_eq!(tree.count(), 4);
        assert_eq!(engine.to_json(&tree).unwrap(), "[[],[[]]]");
        assert!(is_cached::<Tree>(&engine));
        assert!(is_cached::<Vec<Tree>>(&engine));
    }

    /// Recursive through its first parameter, but the second one is not the engine.
    struct Node;

    impl GetTypeMeta for Node {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait(TypeTraitJsonConstructor::new(
                JsonConstructor::dynamic(
                    "Node::new",
                    vec![
                        ParamKind::Value(TypeDescriptor::of::<Vec<Node>>()),
                        ParamKind::Value(TypeDescriptor::of::<String>()),
                    ],
                    |_| Ok(Node),
                )
                .with_dependency::<Vec<Node>>(),
            ));
            meta
        }
    }

    #[test]
    fn failed_recursive_resolution_caches_nothing() {
        let engine = Engine::builder()
            .enable_constructor_scanning()
            .register::<Node>()
            .build();
        assert!(engine.registry().contains_type::<Vec<Node>>());

        assert!(matches!(
            engine.from_json::<Node>("[]"),
            Err(Error::InvalidConstructorShape { .. })
        ));
        assert!(!is_cached::<Node>(&engine));
        assert!(!is_cached::<Vec<Node>>(&engine));

        // The list of nodes fails the same way instead of holding a dead placeholder.
        for text in ["[]", "[[]]"] {
            assert!(matches!(
                engine.from_json::<Vec<Node>>(text),
                Err(Error::InvalidConstructorShape { .. })
            ));
        }
        assert!(!is_cached::<Vec<Node>>(&engine));
    }

    // -------------------------------------------------------------------------
    // Concurrency

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Pair(u32, u32);

    impl JsonSerialization for Pair {
        fn to_json(&self, out: &mut JsonWriter<'_>, _engine: &Engine) -> Result<()> {
            out.string(&alloc::format!("{}:{}", self.0, self.1))?;
            Ok(())
        }
    }

    impl GetTypeMeta for Pair {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait::<TypeTraitSerde>(FromType::<Self>::from_type());
            meta.insert_trait::<TypeTraitJsonSerialization>(FromType::<Self>::from_type());
            meta
        }
    }

    #[test]
    fn concurrent_first_use() {
        let engine = Engine::builder().register::<Pair>().build();
        thread::scope(|scope| {
            for index in 0..8_u32 {
                let engine = &engine;
                scope.spawn(move || {
                    let text = alloc::format!("[{index}, 1]");
                    let pair: Pair = engine.from_json(&text).unwrap();
                    assert_eq!(pair, Pair(index, 1));
                    assert_eq!(
                        engine.to_json(&pair).unwrap(),
                        alloc::format!("\"{index}:1\"")
                    );
                });
            }
        });

        let first = engine.adapter::<Pair>().unwrap();
        let second = engine.adapter::<Pair>().unwrap();
        assert!(Arc::ptr_eq(first.erased(), second.erased()));
    }

    // -------------------------------------------------------------------------
    // Facade

    #[test]
    fn trees_and_writers() {
        let engine = Engine::builder()
            .register::<Vec<Option<String>>>()
            .pretty_printing(true)
            .build();
        let value = vec![Some(String::from("a")), None];

        assert_eq!(engine.to_tree(&value).unwrap(), json!(["a", null]));
        let back: Vec<Option<String>> = engine.from_tree(&json!([null, "b"])).unwrap();
        assert_eq!(back, [None, Some(String::from("b"))]);

        let mut out = Vec::new();
        engine.to_writer(&value, &mut out).unwrap();
        assert_eq!(out, b"[\n  \"a\",\n  null\n]");
    }

    #[test]
    fn trailing_content_is_rejected() {
        let engine = Engine::new();
        assert_eq!(engine.from_json::<u32>(" 12 ").unwrap(), 12);
        assert!(matches!(engine.from_json::<u32>("12 13"), Err(Error::Stream(_))));
    }

    #[test]
    fn config_round_trips_through_builder() {
        let config = EngineConfig {
            constructor_scanning: true,
            serialize_nulls: true,
            pretty_printing: false,
        };
        let engine = Engine::builder().with_config(config).build();
        assert_eq!(*engine.config(), config);
        assert!(
            engine
                .factories()
                .iter()
                .any(|f| f.name().ends_with("::ConstructorAdapterFactory"))
        );
        assert_eq!(*Engine::new().config(), EngineConfig::default());
    }

    // -------------------------------------------------------------------------
    // Static registration

    #[cfg(feature = "auto_register")]
    mod auto {
        use serde::{Deserialize, Serialize};

        use crate::Engine;
        use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTraitSerde};

        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Registered {
            id: u64,
        }

        impl GetTypeMeta for Registered {
            fn get_type_meta() -> TypeMeta {
                let mut meta = TypeMeta::of::<Self>();
                meta.insert_trait::<TypeTraitSerde>(FromType::<Self>::from_type());
                meta
            }
        }

        crate::auto_register!(Registered, Option<Registered>);

        #[test]
        fn auto_registered_types_are_found() {
            assert!(!Engine::new().registry().contains_type::<Registered>());

            let engine = Engine::builder().auto_register().auto_register().build();
            assert!(engine.registry().contains_type::<Option<Registered>>());
            let value: Option<Registered> = engine.from_json(r#"{"id": 9}"#).unwrap();
            assert_eq!(value, Some(Registered { id: 9 }));
        }
    }
}
