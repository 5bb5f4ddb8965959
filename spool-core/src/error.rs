//! Spool Error Types
//!
//! Every socket operation reports failures through [`SpoolError`]. Timeouts,
//! closure and bad options are ordinary control flow for callers, not panics.

use std::io;
use thiserror::Error;

/// Main error type for Spool operations
#[derive(Error, Debug)]
pub enum SpoolError {
    /// The socket (or pipe) has been closed.
    ///
    /// Also returned by a second call to `close()`.
    #[error("object closed")]
    Closed,

    /// The receive deadline elapsed before a message arrived
    #[error("receive time out")]
    RecvTimeout,

    /// The pipe is already attached to this socket
    #[error("pipe already attached")]
    AlreadyAttached,

    /// Operation not valid for this protocol role
    /// (send on a receive-only socket, contexts on a context-less protocol)
    #[error("invalid operation for protocol")]
    ProtocolOperationUnsupported,

    /// Option value has the wrong type or is out of range
    #[error("invalid option value")]
    BadValue,

    /// Unknown (or read-only) option name
    #[error("invalid or unsupported socket option")]
    BadOption,

    /// IO error reported by a transport pipe
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for Spool operations
pub type Result<T> = std::result::Result<T, SpoolError>;

impl SpoolError {
    /// Check if this error means the socket or pipe is gone
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check if this error is a deadline expiry
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::RecvTimeout)
    }

    /// Check if retrying the same operation may succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RecvTimeout => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::Closed
            | Self::AlreadyAttached
            | Self::ProtocolOperationUnsupported
            | Self::BadValue
            | Self::BadOption => false,
        }
    }
}
