//! Transport pipe abstraction consumed by protocol sockets.
//!
//! A pipe is one live transport connection. Transports (inproc here, TCP or
//! IPC elsewhere) implement [`Pipe`]; protocol sockets only ever see the trait.

use crate::error::Result;
use crate::message::Message;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PIPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique pipe identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(u64);

impl PipeId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_PIPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pipe-{}", self.0)
    }
}

/// One transport connection bound to a socket.
///
/// `close()` may be called several times from different code paths
/// (the worker exiting, the socket removing the pipe, the peer hanging up);
/// only the first call has an effect.
#[async_trait::async_trait(?Send)]
pub trait Pipe: Send + Sync {
    /// Identifier used for bookkeeping and message tagging.
    fn id(&self) -> PipeId;

    /// Wait for the next message.
    ///
    /// `None` means the connection has ended and no more messages will come.
    async fn recv_msg(&self) -> Option<Message>;

    /// Deliver a message to the peer.
    ///
    /// # Errors
    ///
    /// Returns `SpoolError::Closed` once the pipe has ended.
    async fn send_msg(&self, msg: Message) -> Result<()>;

    /// Close the connection. Idempotent.
    ///
    /// # Errors
    ///
    /// Transports may report teardown failures; callers on shutdown paths
    /// usually ignore them.
    fn close(&self) -> Result<()>;
}
