use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::OnceLock;

use vc_json_stream::{JsonReader, JsonWriter};

use crate::{ChainPosition, Engine, Error, Result, TypeDescriptor};

// -----------------------------------------------------------------------------
// JsonAdapter

/// A read/write strategy for values of one type.
///
/// Adapters are built once per type by an [`AdapterFactory`] and shared for
/// the lifetime of the [`Engine`]. Values cross this interface type-erased;
/// [`TypeAdapter`] is the typed view.
///
/// Implementations must not hold locks across nested `read`/`write` calls,
/// since converting one value routinely converts its parts through other
/// adapters of the same engine.
///
/// [`AdapterFactory`]: crate::AdapterFactory
pub trait JsonAdapter: Send + Sync + 'static {
    /// The type this adapter converts.
    fn ty(&self) -> TypeDescriptor;

    /// Writes `value`, which must be of type [`ty`](Self::ty).
    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()>;

    /// Reads one complete value of type [`ty`](Self::ty).
    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>>;
}

impl fmt::Debug for dyn JsonAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonAdapter")
            .field("ty", &self.ty())
            .finish_non_exhaustive()
    }
}

/// Downcasts an erased value handed to [`JsonAdapter::write`].
#[inline]
pub fn downcast_value<T: Any>(value: &dyn Any) -> Result<&T> {
    value.downcast_ref::<T>().ok_or_else(Error::type_mismatch::<T>)
}

/// Downcasts an erased value returned by [`JsonAdapter::read`].
#[inline]
pub fn downcast_boxed<T: Any>(value: Box<dyn Any>) -> Result<T> {
    match value.downcast::<T>() {
        Ok(value) => Ok(*value),
        Err(_) => Err(Error::type_mismatch::<T>()),
    }
}

// -----------------------------------------------------------------------------
// TypeAdapter

/// Typed handle over the adapter the engine resolved for `T`.
///
/// # Examples
///
/// ```
/// use vc_json_adapter::Engine;
/// use vc_json_stream::JsonReader;
///
/// let engine = Engine::builder().register::<Vec<u32>>().build();
/// let adapter = engine.adapter::<Vec<u32>>().unwrap();
///
/// let mut reader = JsonReader::new("[3, 4]");
/// assert_eq!(adapter.read(&engine, &mut reader).unwrap(), [3, 4]);
/// ```
pub struct TypeAdapter<T> {
    inner: Arc<dyn JsonAdapter>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> TypeAdapter<T> {
    pub(crate) fn new(inner: Arc<dyn JsonAdapter>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// The erased adapter behind this handle.
    #[inline]
    pub fn erased(&self) -> &Arc<dyn JsonAdapter> {
        &self.inner
    }

    #[inline]
    pub fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &T) -> Result<()> {
        self.inner.write(engine, out, value)
    }

    #[inline]
    pub fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<T> {
        downcast_boxed(self.inner.read(engine, input)?)
    }
}

impl<T> Clone for TypeAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TypeAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeAdapter").field(&self.inner).finish()
    }
}

// -----------------------------------------------------------------------------
// LazyDelegate

/// The adapter the chain produces for a type after a given position,
/// resolved on first use.
///
/// Two threads hitting an unbound delegate may both resolve it; only the first
/// published value is ever returned and it is always complete.
pub struct LazyDelegate {
    ty: TypeDescriptor,
    position: ChainPosition,
    slot: OnceLock<Arc<dyn JsonAdapter>>,
}

impl LazyDelegate {
    /// Creates an unbound delegate that skips every factory up to and
    /// including `position`.
    pub const fn new(ty: TypeDescriptor, position: ChainPosition) -> Self {
        Self {
            ty,
            position,
            slot: OnceLock::new(),
        }
    }

    #[inline]
    pub fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    #[inline]
    pub fn position(&self) -> ChainPosition {
        self.position
    }

    /// Returns the delegate if it has already been bound.
    #[inline]
    pub fn bound(&self) -> Option<&Arc<dyn JsonAdapter>> {
        self.slot.get()
    }

    /// Returns the delegate, resolving and publishing it on first use.
    pub fn get(&self, engine: &Engine) -> Result<&Arc<dyn JsonAdapter>> {
        if let Some(adapter) = self.slot.get() {
            return Ok(adapter);
        }
        let resolved = engine.resolve_after(self.position, &self.ty)?;
        log::trace!("bound delegate for `{}` after {}", self.ty, self.position);
        Ok(self.slot.get_or_init(|| resolved))
    }
}

impl fmt::Debug for LazyDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDelegate")
            .field("ty", &self.ty)
            .field("position", &self.position)
            .field("bound", &self.slot.get().is_some())
            .finish()
    }
}
