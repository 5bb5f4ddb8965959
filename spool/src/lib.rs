//! # Spool
//!
//! Scalable Protocols (nanomsg-style) sockets on the `compio` runtime.
//!
//! ## Architecture
//!
//! Spool is structured as a small **messaging kernel** with clean layering:
//!
//! - **`spool-core`**: messages, pipes, the bounded drop-oldest queue, close
//!   signalling, options and the `Protocol` contract
//! - **`spool-proto`**: protocol state machines (XSUB, SUB, PULL, STAR)
//! - **`spool`**: Public API surface (this crate)
//!
//! ## Protocols
//!
//! Protocol constructors are gated behind the `proto` feature (on by
//! default):
//!
//! ```toml
//! [dependencies]
//! spool = { version = "0.1", default-features = false }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "proto")]
//! # async fn example() -> spool::Result<()> {
//! use spool::{pipe_pair, Socket};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let socket = Socket::xsub();
//! socket.set_option(spool::options::OPTION_RECV_DEADLINE, Duration::from_secs(1))?;
//!
//! let (local, _remote) = pipe_pair(16);
//! socket.attach(Arc::new(local))?;
//!
//! match socket.recv().await {
//!     Ok(frames) => println!("Received {} frames", frames.len()),
//!     Err(e) if e.is_timeout() => println!("Nothing yet"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Delivery
//!
//! Receivers favour fresh data: when a receive queue is full the oldest
//! message is discarded to make room. Senders never block on slow peers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;
mod socket;

pub use bytes::Bytes;
pub use socket::Socket;

pub use spool_core::error::{Result, SpoolError};
pub use spool_core::identity::{Info, ProtocolId};
pub use spool_core::inproc::{pipe_pair, InprocPipe};
pub use spool_core::message::Message;
pub use spool_core::monitor::{SocketEvent, SocketMonitor};
pub use spool_core::options::{OptionValue, SocketOptions};
pub use spool_core::pipe::{Pipe, PipeId};
pub use spool_core::protocol::{Context, Protocol};

/// Option names and defaults.
pub mod options {
    pub use spool_core::options::*;
}

/// Protocol implementations, for constructing sockets with custom options.
#[cfg(feature = "proto")]
pub mod proto {
    pub use spool_proto::{PullSocket, StarSocket, SubSocket, XSubSocket};
}

/// Convenient imports.
///
/// # Example
///
/// ```rust
/// use spool::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{pipe_pair, Bytes, Message, OptionValue, Protocol, Socket, SocketOptions, SpoolError};
}
