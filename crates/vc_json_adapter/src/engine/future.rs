//! Placeholders for types that are still being resolved on this thread.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::RefCell;
use core::fmt;
use std::sync::OnceLock;

use vc_json_stream::{JsonReader, JsonWriter};

use crate::{Engine, Error, JsonAdapter, Result, TypeDescriptor};

// -----------------------------------------------------------------------------
// FutureAdapter

/// Stands in for the adapter of a type whose resolution is in progress.
///
/// Handed out when resolving `T` needs the adapter of `T` itself, e.g. for
/// `struct Tree(Vec<Tree>)`. Bound once the outer resolution completes.
pub(crate) struct FutureAdapter {
    ty: TypeDescriptor,
    slot: OnceLock<Arc<dyn JsonAdapter>>,
}

impl FutureAdapter {
    fn new(ty: TypeDescriptor) -> Self {
        Self {
            ty,
            slot: OnceLock::new(),
        }
    }

    pub(crate) fn bind(&self, adapter: &Arc<dyn JsonAdapter>) {
        if self.slot.set(Arc::clone(adapter)).is_err() {
            log::warn!("placeholder for `{}` was bound twice", self.ty);
        }
    }

    fn target(&self) -> Result<&Arc<dyn JsonAdapter>> {
        self.slot.get().ok_or_else(|| {
            Error::adapter_resolution(
                self.ty,
                "the adapter is used before its own resolution completed",
            )
        })
    }
}

impl JsonAdapter for FutureAdapter {
    fn ty(&self) -> TypeDescriptor {
        self.ty
    }

    fn write(&self, engine: &Engine, out: &mut JsonWriter<'_>, value: &dyn Any) -> Result<()> {
        self.target()?.write(engine, out, value)
    }

    fn read(&self, engine: &Engine, input: &mut JsonReader<'_>) -> Result<Box<dyn Any>> {
        self.target()?.read(engine, input)
    }
}

impl fmt::Debug for FutureAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureAdapter")
            .field("ty", &self.ty)
            .field("bound", &self.slot.get().is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Pending resolutions

/// Adapters resolved under a pending resolution, not cached yet.
pub(crate) type Deferred = Vec<(TypeId, Arc<dyn JsonAdapter>)>;

struct Frame {
    engine: usize,
    future: Arc<FutureAdapter>,
    deferred: Deferred,
}

std::thread_local! {
    static PENDING: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Looks up `type_id` among the resolutions by engine `engine` running on
/// this thread.
///
/// Returns the placeholder of a resolution still in progress, or an adapter
/// completed inside one and waiting to be cached.
pub(crate) fn pending(engine: usize, type_id: TypeId) -> Option<Arc<dyn JsonAdapter>> {
    PENDING.with_borrow(|pending| {
        for frame in pending.iter().rev().filter(|frame| frame.engine == engine) {
            if frame.future.ty.id() == type_id {
                return Some(Arc::clone(&frame.future) as Arc<dyn JsonAdapter>);
            }
            if let Some((_, adapter)) = frame.deferred.iter().find(|(id, _)| *id == type_id) {
                return Some(Arc::clone(adapter));
            }
        }
        None
    })
}

/// What to do with a completed resolution.
pub(crate) enum Completion {
    /// Handed to the enclosing resolution, cached only if that one succeeds.
    Nested,
    /// Nothing encloses it: the adapters are ready to be cached, the
    /// completed type last.
    Outermost(Deferred),
}

/// Marks a resolution as running on this thread until dropped.
///
/// Dropping the guard without [`complete`](Self::complete) discards every
/// adapter resolved under it.
pub(crate) struct PendingGuard {
    engine: usize,
    future: Arc<FutureAdapter>,
}

impl PendingGuard {
    pub(crate) fn push(engine: usize, ty: TypeDescriptor) -> Self {
        let future = Arc::new(FutureAdapter::new(ty));
        PENDING.with_borrow_mut(|pending| {
            pending.push(Frame {
                engine,
                future: Arc::clone(&future),
                deferred: Vec::new(),
            });
        });
        Self { engine, future }
    }

    /// Binds the placeholder, so adapters built during the resolution
    /// forward to `adapter` from now on.
    pub(crate) fn complete(self, adapter: &Arc<dyn JsonAdapter>) -> Completion {
        self.future.bind(adapter);
        PENDING.with_borrow_mut(|pending| {
            let Some(index) = self.position(pending) else {
                return Completion::Outermost(vec![(self.future.ty.id(), Arc::clone(adapter))]);
            };
            let mut frame = pending.remove(index);
            frame.deferred.push((self.future.ty.id(), Arc::clone(adapter)));
            match pending[..index]
                .iter_mut()
                .rev()
                .find(|parent| parent.engine == self.engine)
            {
                Some(parent) => {
                    parent.deferred.append(&mut frame.deferred);
                    Completion::Nested
                }
                None => Completion::Outermost(frame.deferred),
            }
        })
    }

    fn position(&self, pending: &[Frame]) -> Option<usize> {
        pending
            .iter()
            .rposition(|frame| Arc::ptr_eq(&frame.future, &self.future))
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        PENDING.with_borrow_mut(|pending| {
            if let Some(index) = self.position(pending) {
                pending.remove(index);
            }
        });
    }
}
