use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use vc_json_stream::JsonReader;

use crate::registry::{GetTypeMeta, TypeRegistry};
use crate::{Engine, Error, Result, TypeDescriptor};

// -----------------------------------------------------------------------------
// ParamKind

/// Declared kind of a constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The raw token reader, positioned at the first token of the value.
    Reader,
    /// The engine performing the conversion.
    Engine,
    /// A value decoded by the engine's adapter for the described type.
    Value(TypeDescriptor),
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader => f.pad("JsonReader"),
            Self::Engine => f.pad("Engine"),
            Self::Value(ty) => fmt::Display::fmt(ty, f),
        }
    }
}

// -----------------------------------------------------------------------------
// ConstructorArgs

/// One argument handed to a constructor.
pub enum ConstructorArg<'a, 'r> {
    Reader(&'a mut JsonReader<'r>),
    Engine(&'a Engine),
    Value(Box<dyn Any>),
    /// The argument was already taken by the constructor.
    Taken,
}

/// The argument list of one constructor invocation.
///
/// Constructors take their arguments out by index. Asking for an argument of
/// the wrong kind or type fails with [`Error::Instantiation`].
pub struct ConstructorArgs<'a, 'r> {
    args: Vec<ConstructorArg<'a, 'r>>,
}

impl<'a, 'r> ConstructorArgs<'a, 'r> {
    #[inline]
    pub fn new(args: Vec<ConstructorArg<'a, 'r>>) -> Self {
        Self { args }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    fn take(&mut self, index: usize) -> Result<ConstructorArg<'a, 'r>> {
        match self.args.get_mut(index) {
            Some(slot) => Ok(core::mem::replace(slot, ConstructorArg::Taken)),
            None => Err(Error::instantiation(alloc::format!(
                "missing argument #{index}"
            ))),
        }
    }

    /// Takes the raw reader at `index`.
    pub fn take_reader(&mut self, index: usize) -> Result<&'a mut JsonReader<'r>> {
        match self.take(index)? {
            ConstructorArg::Reader(reader) => Ok(reader),
            _ => Err(Error::instantiation(alloc::format!(
                "argument #{index} is not a reader"
            ))),
        }
    }

    /// Takes the decoded value at `index`.
    pub fn take_value<A: Any>(&mut self, index: usize) -> Result<A> {
        match self.take(index)? {
            ConstructorArg::Value(value) => match value.downcast::<A>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(Error::instantiation(alloc::format!(
                    "argument #{index} is not a `{}`",
                    core::any::type_name::<A>()
                ))),
            },
            _ => Err(Error::instantiation(alloc::format!(
                "argument #{index} is not a decoded value"
            ))),
        }
    }

    /// Returns the engine at `index`.
    pub fn engine(&self, index: usize) -> Result<&'a Engine> {
        match self.args.get(index) {
            Some(ConstructorArg::Engine(engine)) => Ok(*engine),
            _ => Err(Error::instantiation(alloc::format!(
                "argument #{index} is not the engine"
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// JsonConstructor

/// Registers one type into a registry.
pub type RegisterFn = fn(&mut TypeRegistry);

type Invoke = dyn Fn(&mut ConstructorArgs<'_, '_>) -> Result<Box<dyn Any>> + Send + Sync;

fn invoke<F>(f: F) -> Arc<Invoke>
where
    F: Fn(&mut ConstructorArgs<'_, '_>) -> Result<Box<dyn Any>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A constructor marked for deserialization.
///
/// The typed helpers capture a closure with a fixed shape. [`dynamic`](Self::dynamic)
/// declares an arbitrary parameter list and takes its arguments from
/// [`ConstructorArgs`].
///
/// | helper                      | parameters          |
/// |-----------------------------|---------------------|
/// | [`from_value`]              | `(A)`               |
/// | [`from_value_with_engine`]  | `(A, &Engine)`      |
/// | [`from_reader`]             | `(&mut JsonReader)` |
/// | [`from_reader_with_engine`] | `(&mut JsonReader, &Engine)` |
///
/// [`from_value`]: Self::from_value
/// [`from_value_with_engine`]: Self::from_value_with_engine
/// [`from_reader`]: Self::from_reader
/// [`from_reader_with_engine`]: Self::from_reader_with_engine
#[derive(Clone)]
pub struct JsonConstructor {
    name: &'static str,
    output: TypeDescriptor,
    params: Vec<ParamKind>,
    invoke: Arc<Invoke>,
    dependencies: Vec<RegisterFn>,
}

impl JsonConstructor {
    pub fn from_value<T, A, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        A: GetTypeMeta,
        F: Fn(A) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            output: TypeDescriptor::of::<T>(),
            params: vec![ParamKind::Value(TypeDescriptor::of::<A>())],
            invoke: invoke(move |args| {
                let value = args.take_value::<A>(0)?;
                Ok(Box::new(f(value)?))
            }),
            dependencies: vec![TypeRegistry::register::<A> as RegisterFn],
        }
    }

    pub fn from_value_with_engine<T, A, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        A: GetTypeMeta,
        F: Fn(A, &Engine) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            output: TypeDescriptor::of::<T>(),
            params: vec![ParamKind::Value(TypeDescriptor::of::<A>()), ParamKind::Engine],
            invoke: invoke(move |args| {
                let value = args.take_value::<A>(0)?;
                let engine = args.engine(1)?;
                Ok(Box::new(f(value, engine)?))
            }),
            dependencies: vec![TypeRegistry::register::<A> as RegisterFn],
        }
    }

    pub fn from_reader<T, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut JsonReader<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            output: TypeDescriptor::of::<T>(),
            params: vec![ParamKind::Reader],
            invoke: invoke(move |args| {
                let reader = args.take_reader(0)?;
                Ok(Box::new(f(reader)?))
            }),
            dependencies: Vec::new(),
        }
    }

    pub fn from_reader_with_engine<T, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut JsonReader<'_>, &Engine) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            output: TypeDescriptor::of::<T>(),
            params: vec![ParamKind::Reader, ParamKind::Engine],
            invoke: invoke(move |args| {
                let engine = args.engine(1)?;
                let reader = args.take_reader(0)?;
                Ok(Box::new(f(reader, engine)?))
            }),
            dependencies: Vec::new(),
        }
    }

    /// Declares a constructor with an arbitrary parameter list.
    ///
    /// The shape is validated when the adapter is built, not here.
    pub fn dynamic<T, F>(name: &'static str, params: Vec<ParamKind>, f: F) -> Self
    where
        T: Any,
        F: Fn(&mut ConstructorArgs<'_, '_>) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name,
            output: TypeDescriptor::of::<T>(),
            params,
            invoke: invoke(move |args| Ok(Box::new(f(args)?))),
            dependencies: Vec::new(),
        }
    }

    /// Adds a type to register together with the owner of this constructor.
    #[must_use]
    pub fn with_dependency<D: GetTypeMeta>(mut self) -> Self {
        self.dependencies.push(TypeRegistry::register::<D>);
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type this constructor produces.
    #[inline]
    pub fn output(&self) -> TypeDescriptor {
        self.output
    }

    #[inline]
    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    #[inline]
    pub fn dependencies(&self) -> &[RegisterFn] {
        &self.dependencies
    }

    /// Calls the constructor. The result is always of type [`output`](Self::output).
    #[inline]
    pub fn invoke(&self, args: &mut ConstructorArgs<'_, '_>) -> Result<Box<dyn Any>> {
        (self.invoke)(args)
    }

    pub(crate) fn describe_params(&self) -> Cow<'static, str> {
        let mut text = String::from("(");
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                text.push_str(", ");
            }
            text.push_str(&alloc::format!("{param}"));
        }
        text.push(')');
        Cow::Owned(text)
    }
}

impl fmt::Debug for JsonConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonConstructor")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// TypeTraitJsonConstructor

/// Marks the constructors of a type that deserialization may use.
///
/// Only read when constructor scanning is enabled on the engine. A type is
/// expected to mark exactly one constructor; marking several is reported as
/// [`Error::Configuration`] when its adapter is built.
#[derive(Clone, Debug)]
pub struct TypeTraitJsonConstructor {
    constructors: Vec<JsonConstructor>,
}

impl TypeTraitJsonConstructor {
    pub fn new(constructor: JsonConstructor) -> Self {
        Self {
            constructors: vec![constructor],
        }
    }

    /// Marks one more constructor.
    #[must_use]
    pub fn with(mut self, constructor: JsonConstructor) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[inline]
    pub fn constructors(&self) -> &[JsonConstructor] {
        &self.constructors
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;

    use super::{ConstructorArg, ConstructorArgs, JsonConstructor, ParamKind};
    use crate::{Error, TypeDescriptor};

    #[test]
    fn typed_helpers_declare_params() {
        let ctor = JsonConstructor::from_value("len", |s: String| Ok(s.len()));
        assert_eq!(ctor.output(), TypeDescriptor::of::<usize>());
        assert_eq!(
            ctor.params(),
            [ParamKind::Value(TypeDescriptor::of::<String>())]
        );
        assert_eq!(ctor.describe_params(), "(alloc::string::String)");

        let mut args = ConstructorArgs::new(vec![ConstructorArg::Value(Box::new(String::from(
            "four",
        )))]);
        let out = ctor.invoke(&mut args).unwrap();
        assert_eq!(*out.downcast::<usize>().unwrap(), 4);
    }

    #[test]
    fn mismatched_arguments_are_instantiation_errors() {
        let ctor = JsonConstructor::from_value("len", |s: String| Ok(s.len()));

        let mut args = ConstructorArgs::new(vec![ConstructorArg::Value(Box::new(4_u8))]);
        assert!(matches!(ctor.invoke(&mut args), Err(Error::Instantiation(_))));

        let mut args = ConstructorArgs::new(vec![]);
        assert!(matches!(ctor.invoke(&mut args), Err(Error::Instantiation(_))));
    }
}
