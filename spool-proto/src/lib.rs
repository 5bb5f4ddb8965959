//! # Spool Protocols
//!
//! Scalable Protocols socket implementations over the `spool-core` kernel.
//!
//! ## Overview
//!
//! - **XSUB**: raw subscriber, every message passes through
//! - **SUB**: subscriber with topic prefix filtering
//! - **PULL**: pipeline sink
//! - **STAR**: raw star node, sends to and relays between all peers
//!
//! Every socket shares the same receive path: one task per pipe feeding a
//! bounded queue that keeps the newest messages when full.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spool_core::inproc::pipe_pair;
//! use spool_core::protocol::Protocol;
//! use spool_proto::XSubSocket;
//! use std::sync::Arc;
//!
//! #[compio::main]
//! async fn main() -> spool_core::error::Result<()> {
//!     let socket = XSubSocket::new();
//!     let (local, _remote) = pipe_pair(16);
//!     socket.add_pipe(Arc::new(local))?;
//!
//!     let msg = socket.recv_msg().await?;
//!     println!("{:?}", msg);
//!     Ok(())
//! }
//! ```

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

mod fanin;

pub mod pull;
pub mod star;
pub mod sub;
pub mod xsub;

pub use pull::PullSocket;
pub use star::StarSocket;
pub use sub::SubSocket;
pub use xsub::XSubSocket;

/// Commonly used types.
pub mod prelude {
    pub use crate::{PullSocket, StarSocket, SubSocket, XSubSocket};
    pub use spool_core::prelude::*;
}
