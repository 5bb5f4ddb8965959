//! One-shot close broadcast.
//!
//! [`CloseSignal`] is a cancellation token shared by a socket, its pipe
//! workers and every blocked receiver. It is a flume channel that never
//! carries a value: firing drops the only sender, which disconnects every
//! clone of the receiver at once. Waiters observe it without extra locking.

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

struct Inner {
    trigger: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

/// Idempotent, broadcast cancellation token.
#[derive(Clone)]
pub struct CloseSignal {
    inner: Arc<Inner>,
}

impl CloseSignal {
    /// Create an unfired signal.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(0);
        Self {
            inner: Arc::new(Inner {
                trigger: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Fire the signal.
    ///
    /// Returns `true` for the call that actually fired it, `false` if it had
    /// already fired.
    pub fn fire(&self) -> bool {
        // Dropping the sender is the broadcast.
        self.inner.trigger.lock().take().is_some()
    }

    /// Check whether the signal has fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.rx.is_disconnected()
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    pub async fn wait(&self) {
        let _ = self.inner.rx.recv_async().await;
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseSignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}
