use alloc::sync::Arc;
use core::fmt;

use crate::{Engine, JsonAdapter, Result, TypeDescriptor};

/// Index of a factory inside an engine's frozen chain.
///
/// Handed to [`AdapterFactory::create`] so the adapter it builds can later ask
/// for "the adapter after me" through [`Engine::resolve_after`] or a
/// [`LazyDelegate`](crate::LazyDelegate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainPosition(usize);

impl ChainPosition {
    #[inline(always)]
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChainPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "factory #{}", self.0)
    }
}

/// A rule that may produce an adapter for a type, or decline.
///
/// Factories are registered through
/// [`EngineBuilder::register_type_adapter_factory`](crate::EngineBuilder::register_type_adapter_factory)
/// and tried in registration order; the first `Some` wins. Returning an error
/// aborts the resolution of `ty` instead of falling through.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_json_adapter::{AdapterFactory, ChainPosition, Engine, JsonAdapter};
/// use vc_json_adapter::{Result, TypeDescriptor};
///
/// /// Declines everything, so resolution falls through to the built-in factories.
/// struct Passive;
///
/// impl AdapterFactory for Passive {
///     fn create(
///         &self,
///         _engine: &Engine,
///         _ty: &TypeDescriptor,
///         _position: ChainPosition,
///     ) -> Result<Option<Arc<dyn JsonAdapter>>> {
///         Ok(None)
///     }
/// }
///
/// let engine = Engine::builder().register_type_adapter_factory(Passive).build();
/// assert_eq!(engine.to_json(&7_i32).unwrap(), "7");
/// ```
pub trait AdapterFactory: Send + Sync + 'static {
    /// Builds the adapter for `ty`, or returns `Ok(None)` to let later
    /// factories try.
    fn create(
        &self,
        engine: &Engine,
        ty: &TypeDescriptor,
        position: ChainPosition,
    ) -> Result<Option<Arc<dyn JsonAdapter>>>;

    /// Name used in log messages.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
