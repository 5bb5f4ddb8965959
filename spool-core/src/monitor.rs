//! Socket event monitoring.
//!
//! Provides event streams for tracking pipe churn and socket lifecycle.

use crate::pipe::PipeId;
use std::fmt;

/// Socket lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// A pipe was attached and its worker started.
    PipeAttached(PipeId),

    /// A pipe was detached from the socket.
    PipeDetached(PipeId),

    /// A pipe was refused (socket closed or pipe already attached).
    AttachRejected {
        pipe: PipeId,
        reason: String,
    },

    /// The socket was closed.
    Closed,
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PipeAttached(id) => write!(f, "Attached {id}"),
            Self::PipeDetached(id) => write!(f, "Detached {id}"),
            Self::AttachRejected { pipe, reason } => {
                write!(f, "Rejected {pipe}: {reason}")
            }
            Self::Closed => write!(f, "Socket closed"),
        }
    }
}

/// Handle for receiving socket events.
pub type SocketMonitor = flume::Receiver<SocketEvent>;

/// Sender half used by sockets to emit events.
pub type SocketEventSender = flume::Sender<SocketEvent>;

/// Creates a new monitoring channel pair.
#[must_use]
pub fn create_monitor() -> (SocketEventSender, SocketMonitor) {
    flume::unbounded()
}
