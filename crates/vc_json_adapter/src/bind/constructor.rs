//! Deserialization through a marked constructor.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;

use vc_json_stream::{JsonReader, JsonWriter};

use crate::registry::{ConstructorArg, ConstructorArgs, JsonConstructor, ParamKind};
use crate::registry::TypeTraitJsonConstructor;
use crate::{AdapterFactory, ChainPosition, Engine, Error, JsonAdapter, LazyDelegate};
use crate::{Result, TypeDescriptor};

// -----------------------------------------------------------------------------
// ConstructorAdapterFactory

/// Builds [`ConstructorAdapter`]s for types registered with
/// [`TypeTraitJsonConstructor`].
///
/// Only part of the chain when constructor scanning is enabled, see
/// [`EngineBuilder::enable_constructor_scanning`](crate::EngineBuilder::enable_constructor_scanning).
///
/// - No marked constructor: declines.
/// - More than one: [`Error::Configuration`].
/// - Exactly one: the constructor shape is validated and its argument adapter
///   resolved now, so a bad registration fails the first time the type is
///   resolved rather than on every read.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorAdapterFactory;

impl AdapterFactory for ConstructorAdapterFactory {
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>> {
        let Some(marker) = engine
            .registry()
            .get_type_trait::<TypeTraitJsonConstructor>(ty.id())
        else {
            return Ok(None);
        };
        match marker.constructors() {
            [] => Ok(None),
            [constructor] => {
                let adapter = ConstructorAdapter::new(engine, *ty, position, constructor.clone())?;
                Ok(Some(Arc::new(adapter)))
            }
            constructors => {
                let names: Vec<&str> = constructors.iter().map(JsonConstructor::name).collect();
                Err(Error::configuration(
                    *ty,
                    alloc::format!(
                        "{} constructors are marked ({}), exactly one is allowed",
                        constructors.len(),
                        names.join(", ")
                    ),
                ))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ConstructorAdapter

enum Argument {
    Reader,
    Value(Arc<dyn JsonAdapter>),
}

/// Reads a value by invoking its marked constructor.
///
/// Writing is not customized: it goes through the adapter the rest of the
/// chain produces for the type.
///
/// Faults from the invocation are translated as follows:
///
/// - [`Error::Instantiation`] and [`Error::Other`] become
///   [`Error::ConstructionFailed`] wrapping the cause.
/// - Everything else, such as stream faults, [`Error::Message`] or nested
///   resolution errors, propagates unchanged.
pub struct ConstructorAdapter {
    constructor: JsonConstructor,
    argument: Argument,
    inject_engine: bool,
    delegate: LazyDelegate,
}

impl ConstructorAdapter {
    fn new(
        engine: &Engine,
        ty: TypeDescriptor,
        position: ChainPosition,
        constructor: JsonConstructor,
    ) -> Result<Self> {
        let shape_error = |reason: String| Error::InvalidConstructorShape {
            ty,
            constructor: constructor.name(),
            reason: reason.into(),
        };

        if constructor.output() != ty {
            return Err(shape_error(alloc::format!(
                "it produces `{}`",
                constructor.output()
            )));
        }

        let (first, second) = match constructor.params() {
            [first] => (*first, None),
            [first, second] => (*first, Some(*second)),
            _ => {
                return Err(shape_error(alloc::format!(
                    "expected 1 or 2 parameters, found {}",
                    constructor.describe_params()
                )));
            }
        };

        let argument = match first {
            ParamKind::Reader => Argument::Reader,
            ParamKind::Value(argument) => match engine.resolve(&argument) {
                Ok(adapter) => Argument::Value(adapter),
                Err(source) => {
                    return Err(Error::UnresolvableArgumentType {
                        ty,
                        argument,
                        source: Box::new(source),
                    });
                }
            },
            ParamKind::Engine => {
                return Err(Error::UnresolvableArgumentType {
                    ty,
                    argument: TypeDescriptor::of::<Engine>(),
                    source: Box::new(Error::adapter_resolution(
                        TypeDescriptor::of::<Engine>(),
                        "the engine cannot be decoded from JSON",
                    )),
                });
            }
        };

        let inject_engine = match second {
            None => false,
            Some(ParamKind::Engine) => true,
            Some(other) => {
                return Err(shape_error(alloc::format!(
                    "the second parameter must be the engine, found `{other}`"
                )));
            }
        };

        log::debug!(
            "marked constructor `{}` of `{ty}` takes {}",
            constructor.name(),
            constructor.describe_params()
        );

        Ok(Self {
            constructor,
            argument,
            inject_engine,
            delegate: LazyDelegate::new(ty, position),
        })
    }

    /// The constructor this adapter invokes.
    #[inline]
    pub fn constructor(&self) -> &JsonConstructor {
        &self.constructor
    }
}

impl JsonAdapter for ConstructorAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.delegate.ty()
    }

    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        self.delegate.get(engine)?.write(engine, out, value)
    }

    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        let mut args = Vec::with_capacity(2);
        match &self.argument {
            Argument::Reader => args.push(ConstructorArg::Reader(input)),
            Argument::Value(adapter) => {
                args.push(ConstructorArg::Value(adapter.read(engine, input)?));
            }
        }
        if self.inject_engine {
            args.push(ConstructorArg::Engine(engine));
        }

        let mut args = ConstructorArgs::new(args);
        self.constructor.invoke(&mut args).map_err(|err| match err {
            err @ (Error::Instantiation(_) | Error::Other(_)) => Error::ConstructionFailed {
                ty: self.delegate.ty(),
                constructor: self.constructor.name(),
                source: Box::new(err),
            },
            err => err,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;
    use core::fmt;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use serde::{Deserialize, Serialize};
    use serde_json::Value;
    use vc_json_stream::{JsonReader, JsonToken, StreamError};

    use crate::registry::{
        FromType, GetTypeMeta, JsonConstructor, ParamKind, TypeMeta,
        TypeTraitJsonConstructor, TypeTraitSerde,
    };
    use crate::{Engine, Error, TypeDescriptor};

    fn scanning() -> Engine {
        Engine::builder()
            .enable_constructor_scanning()
            .register::<Greeter>()
            .register::<ElementOnly>()
            .register::<ReaderOnly>()
            .register::<ReaderAndEngine>()
            .register::<ElementAndEngine>()
            .register::<Generic>()
            .register::<NotAnnotated>()
            .build()
    }

    /// Declares a test type whose single marked constructor is `$ctor`.
    macro_rules! marked {
        ($ty:ident, $ctor:expr) => {
            impl GetTypeMeta for $ty {
                fn get_type_meta() -> TypeMeta {
                    let mut meta = TypeMeta::of::<Self>();
                    meta.insert_trait(TypeTraitJsonConstructor::new($ctor));
                    meta
                }
            }
        };
    }

    // -------------------------------------------------------------------------
    // Fixtures

    #[derive(Debug, Serialize, Deserialize)]
    struct Greeter {
        name: String,
    }

    impl fmt::Display for Greeter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "hello, {}", self.name)
        }
    }

    impl GetTypeMeta for Greeter {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait(TypeTraitJsonConstructor::new(JsonConstructor::from_value(
                "Greeter::new",
                |name: String| Ok(Greeter { name }),
            )));
            meta
        }
    }

    struct ElementOnly(Greeter);
    marked!(
        ElementOnly,
        JsonConstructor::from_value("ElementOnly::new", |tree: Value| {
            let name = match tree {
                Value::String(name) => name,
                other => other.to_string(),
            };
            Ok(ElementOnly(Greeter { name }))
        })
    );

    struct ReaderOnly(Greeter);
    marked!(
        ReaderOnly,
        JsonConstructor::from_reader("ReaderOnly::new", |reader| {
            let name = reader.next_string()?.into_owned();
            Ok(ReaderOnly(Greeter { name }))
        })
    );

    struct ReaderAndEngine(Greeter, usize);
    marked!(
        ReaderAndEngine,
        JsonConstructor::from_reader_with_engine("ReaderAndEngine::new", |reader, engine| {
            let name = reader.next_string()?.into_owned();
            Ok(ReaderAndEngine(Greeter { name }, engine as *const Engine as usize))
        })
    );

    struct ElementAndEngine(Greeter, usize);
    marked!(
        ElementAndEngine,
        JsonConstructor::from_value_with_engine("ElementAndEngine::new", |tree: Value, engine| {
            let name = tree.as_str().unwrap_or_default().to_string();
            Ok(ElementAndEngine(Greeter { name }, engine as *const Engine as usize))
        })
    );

    struct Generic(Vec<i32>);
    marked!(
        Generic,
        JsonConstructor::from_value("Generic::new", |ints: Vec<i32>| Ok(Generic(ints)))
    );

    impl fmt::Display for Generic {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    #[derive(Serialize, Deserialize)]
    struct NotAnnotated {
        message: String,
    }

    impl GetTypeMeta for NotAnnotated {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait::<TypeTraitSerde>(FromType::<Self>::from_type());
            meta
        }
    }

    // -------------------------------------------------------------------------
    // Construction

    #[test]
    fn decoded_string_argument() {
        let greeter: Greeter = scanning().from_json(r#""world""#).unwrap();
        assert_eq!(greeter.to_string(), "hello, world");
    }

    #[test]
    fn tree_argument_with_null() {
        let value: ElementOnly = scanning().from_json("null").unwrap();
        assert_eq!(value.0.to_string(), "hello, null");
    }

    #[test]
    fn generic_argument() {
        let value: Generic = scanning().from_json("[1,2]").unwrap();
        assert_eq!(value.to_string(), "[1, 2]");
    }

    #[test]
    fn unmarked_type_uses_serde() {
        let value: NotAnnotated = scanning().from_json(r#"{"message":"hi!"}"#).unwrap();
        assert_eq!(value.message, "hi!");
    }

    #[test]
    fn raw_reader_starts_at_value() {
        let engine = Engine::builder()
            .enable_constructor_scanning()
            .register::<Vec<ReaderOnly>>()
            .build();
        let values: Vec<ReaderOnly> = engine.from_json(r#"["a", "b"]"#).unwrap();
        let names: Vec<_> = values.iter().map(|v| v.0.to_string()).collect();
        assert_eq!(names, ["hello, a", "hello, b"]);
    }

    #[test]
    fn injected_engine_is_the_resolving_engine() {
        let engine = scanning();
        let expected = &engine as *const Engine as usize;

        let value: ReaderAndEngine = engine.from_json(r#""private""#).unwrap();
        assert_eq!(value.0.to_string(), "hello, private");
        assert_eq!(value.1, expected);

        let value: ElementAndEngine = engine.from_json(r#""bob""#).unwrap();
        assert_eq!(value.0.to_string(), "hello, bob");
        assert_eq!(value.1, expected);
    }

    #[test]
    fn write_falls_through_to_the_rest_of_the_chain() {
        let mut builder = Engine::builder()
            .enable_constructor_scanning()
            .register::<Greeter>();
        builder
            .registry_mut()
            .register_type_trait::<Greeter, TypeTraitSerde>();
        let engine = builder.build();
        let greeter = Greeter {
            name: String::from("x"),
        };
        assert_eq!(engine.to_json(&greeter).unwrap(), r#"{"name":"x"}"#);

        // Without a fallback strategy there is nothing to write with.
        let engine = scanning();
        assert!(matches!(
            engine.to_json(&greeter),
            Err(Error::AdapterResolution { .. })
        ));
    }

    #[test]
    fn without_scanning_marked_types_have_no_adapter() {
        let engine = Engine::builder().register::<ReaderOnly>().build();
        assert!(matches!(
            engine.from_json::<ReaderOnly>(r#""foo""#),
            Err(Error::AdapterResolution { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Registration errors

    struct Ambiguous;

    impl GetTypeMeta for Ambiguous {
        fn get_type_meta() -> TypeMeta {
            let mut meta = TypeMeta::of::<Self>();
            meta.insert_trait(
                TypeTraitJsonConstructor::new(JsonConstructor::from_value("from_i32", |_: i32| {
                    Ok(Ambiguous)
                }))
                .with(JsonConstructor::from_value("from_string", |_: String| Ok(Ambiguous))),
            );
            meta
        }
    }

    struct NoParams;
    marked!(
        NoParams,
        JsonConstructor::dynamic("NoParams::new", vec![], |_| Ok(NoParams))
    );

    struct ThreeParams;
    marked!(
        ThreeParams,
        JsonConstructor::dynamic(
            "ThreeParams::new",
            vec![ParamKind::Reader, ParamKind::Engine, ParamKind::Engine],
            |_| Ok(ThreeParams),
        )
    );

    struct SecondNotEngine;
    marked!(
        SecondNotEngine,
        JsonConstructor::dynamic(
            "SecondNotEngine::new",
            vec![
                ParamKind::Value(TypeDescriptor::of::<String>()),
                ParamKind::Value(TypeDescriptor::of::<String>()),
            ],
            |_| Ok(SecondNotEngine),
        )
    );

    struct EngineFirst;
    marked!(
        EngineFirst,
        JsonConstructor::dynamic(
            "EngineFirst::new",
            vec![ParamKind::Engine],
            |_| Ok(EngineFirst),
        )
    );

    struct Unregistered;

    struct NeedsUnregistered;
    marked!(
        NeedsUnregistered,
        JsonConstructor::dynamic(
            "NeedsUnregistered::new",
            vec![ParamKind::Value(TypeDescriptor::of::<Unregistered>())],
            |_| Ok(NeedsUnregistered),
        )
    );

    fn read_with<T: GetTypeMeta>(engine: &Engine, text: &str) -> Error {
        match engine.from_json::<T>(text) {
            Ok(_) => panic!("`{}` should not be readable", core::any::type_name::<T>()),
            Err(err) => err,
        }
    }

    fn read_error<T: GetTypeMeta>(text: &str) -> Error {
        let engine = Engine::builder()
            .enable_constructor_scanning()
            .register::<T>()
            .build();
        read_with::<T>(&engine, text)
    }

    #[test]
    fn several_marked_constructors_are_rejected() {
        let engine = Engine::builder()
            .enable_constructor_scanning()
            .register::<Ambiguous>()
            .build();
        // Failed resolutions are not cached, each attempt reports the same error.
        let first = read_with::<Ambiguous>(&engine, "1");
        let second = read_with::<Ambiguous>(&engine, "1");
        assert!(matches!(first, Error::Configuration { .. }));
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.to_string().contains("from_i32, from_string"));
    }

    #[test]
    fn invalid_shapes() {
        match read_error::<NoParams>("{}") {
            Error::InvalidConstructorShape { reason, .. } => {
                assert!(reason.contains("found ()"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            read_error::<ThreeParams>("1"),
            Error::InvalidConstructorShape { .. }
        ));
        assert!(matches!(
            read_error::<SecondNotEngine>(r#""x""#),
            Error::InvalidConstructorShape { .. }
        ));
        assert!(matches!(
            read_error::<EngineFirst>("1"),
            Error::UnresolvableArgumentType { .. }
        ));
        match read_error::<NeedsUnregistered>("1") {
            Error::UnresolvableArgumentType { argument, source, .. } => {
                assert!(argument.is::<Unregistered>());
                assert!(matches!(*source, Error::AdapterResolution { .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    // -------------------------------------------------------------------------
    // Fault translation

    struct Faulty;
    marked!(
        Faulty,
        JsonConstructor::from_value("Faulty::new", |code: i64| match code {
            0 => Err(Error::custom("rejected by validation")),
            1 => Err(Error::other(core::fmt::Error)),
            2 => Err(Error::Stream(StreamError::Io(std::io::Error::other("disk")))),
            _ => Ok(Faulty),
        })
    );

    struct WrongArgument;
    marked!(
        WrongArgument,
        JsonConstructor::dynamic(
            "WrongArgument::new",
            vec![ParamKind::Value(TypeDescriptor::of::<String>())],
            |args| {
                let _: i64 = args.take_value(0)?;
                Ok(WrongArgument)
            },
        )
    );

    #[test]
    fn runtime_and_io_faults_pass_through() {
        assert!(matches!(
            read_error::<Faulty>("0"),
            Error::Message(m) if m == "rejected by validation"
        ));
        assert!(read_error::<Faulty>("2").is_io());
        assert!(matches!(read_error::<Faulty>("[0]"), Error::Tree(_)));
    }

    #[test]
    fn other_faults_are_wrapped() {
        match read_error::<Faulty>("1") {
            Error::ConstructionFailed { constructor, source, .. } => {
                assert_eq!(constructor, "Faulty::new");
                assert!(matches!(*source, Error::Other(_)));
            }
            other => panic!("unexpected error {other}"),
        }
        match read_error::<WrongArgument>(r#""text""#) {
            Error::ConstructionFailed { source, .. } => {
                assert!(matches!(*source, Error::Instantiation(_)));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    // -------------------------------------------------------------------------
    // Concurrency

    struct Counted(String);

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    marked!(
        Counted,
        JsonConstructor::from_reader("Counted::new", |reader| {
            CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
            assert_eq!(reader.peek()?, JsonToken::String);
            Ok(Counted(reader.next_string()?.into_owned()))
        })
    );

    #[test]
    fn shared_engine_across_threads() {
        let engine = Engine::builder()
            .enable_constructor_scanning()
            .register::<Counted>()
            .build();
        thread::scope(|scope| {
            for index in 0..8 {
                let engine = &engine;
                scope.spawn(move || {
                    let text = format!("\"{index}\"");
                    let value: Counted = engine.from_json(&text).unwrap();
                    assert_eq!(value.0, index.to_string());
                });
            }
        });
        assert!(CONSTRUCTED.load(Ordering::Relaxed) >= 8);
        let mut reader = JsonReader::new("\"z\"");
        let adapter = engine.adapter::<Counted>().unwrap();
        assert_eq!(adapter.read(&engine, &mut reader).unwrap().0, "z");
    }
}
