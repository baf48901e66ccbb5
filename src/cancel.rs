//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is shared between the caller and a run. Workers
//! look at it between tasks, never in the middle of one.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    parent: Option<CancellationToken>,
    // dropped on cancel so every clone of `signal` observes a disconnect
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<CancellationToken>) -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                parent,
                trigger: Mutex::new(Some(tx)),
                signal: rx,
            }),
        }
    }

    /// Request cancellation. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            self.inner.trigger.lock().take();
        }
    }

    /// Create a token that is cancelled whenever `self` is, but whose own
    /// cancellation does not reach back to `self`.
    pub fn child_token(&self) -> CancellationToken {
        Self::with_parent(Some(self.clone()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
            || self
                .inner
                .parent
                .as_ref()
                .map_or(false, |p| p.is_cancelled())
    }

    /// Receiver that never yields a message and disconnects once this token
    /// itself is cancelled. Cancelling a parent does not disconnect it.
    /// Meant for `select!` alongside blocking channel ops.
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
