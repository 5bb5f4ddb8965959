//! XSUB (raw subscriber) socket implementation
//!
//! XSUB passes through every message received from its publishers, without
//! topic filtering. It is receive-only: `send_msg` is rejected.
//!
//! # Pattern
//!
//! ```text
//! PUB ──data──┐
//! PUB ──data──┼──> XSUB queue (newest kept) ──> recv_msg()
//! PUB ──data──┘
//! ```
//!
//! When the receive queue is full the oldest queued message is released to
//! make room: subscribers favour fresh data over complete data.

use crate::fanin::{FanIn, PassThrough};
use spool_core::error::{Result, SpoolError};
use spool_core::identity::{Info, ProtocolId};
use spool_core::message::Message;
use spool_core::options::{OptionValue, SocketOptions, OPTION_RAW};
use spool_core::pipe::{Pipe, PipeId};
use spool_core::protocol::{Context, Protocol};
use std::sync::Arc;

/// Our role.
pub const SELF: ProtocolId = ProtocolId::Sub;
/// Peer role.
pub const PEER: ProtocolId = ProtocolId::Pub;

/// XSUB (raw subscriber) socket.
///
/// # Examples
///
/// ```no_run
/// use spool_proto::xsub::XSubSocket;
/// use spool_core::inproc::pipe_pair;
/// use spool_core::protocol::Protocol;
/// use std::sync::Arc;
///
/// #[compio::main]
/// async fn main() -> spool_core::error::Result<()> {
///     let xsub = XSubSocket::new();
///     let (local, _remote) = pipe_pair(16);
///     xsub.add_pipe(Arc::new(local))?;
///
///     let msg = xsub.recv_msg().await?;
///     println!("Received: {:?}", msg);
///     Ok(())
/// }
/// ```
pub struct XSubSocket {
    core: Arc<FanIn>,
}

impl XSubSocket {
    /// Create a new XSUB socket with default options.
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    /// Create a new XSUB socket with custom options.
    pub fn with_options(options: SocketOptions) -> Self {
        Self {
            core: FanIn::new("[XSUB]", &options),
        }
    }

    /// Number of messages waiting in the receive queue.
    pub fn queued(&self) -> usize {
        self.core.queued()
    }
}

impl Default for XSubSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait(?Send)]
impl Protocol for XSubSocket {
    async fn send_msg(&self, _msg: Message) -> Result<()> {
        Err(SpoolError::ProtocolOperationUnsupported)
    }

    async fn recv_msg(&self) -> Result<Message> {
        // One unified queue for the whole socket; per-pipe priority
        // queues could replace it later.
        self.core.recv().await
    }

    fn set_option(&self, name: &str, value: OptionValue) -> Result<()> {
        self.core.set_option(name, &value)
    }

    fn get_option(&self, name: &str) -> Result<OptionValue> {
        match name {
            OPTION_RAW => Ok(OptionValue::Bool(true)),
            _ => self.core.get_option(name),
        }
    }

    fn add_pipe(&self, pipe: Arc<dyn Pipe>) -> Result<()> {
        self.core.attach(pipe, PassThrough, || {})
    }

    fn remove_pipe(&self, _id: PipeId) {}

    fn open_context(&self) -> Result<Box<dyn Context>> {
        Err(SpoolError::ProtocolOperationUnsupported)
    }

    fn close(&self) -> Result<()> {
        self.core.close()
    }

    fn info(&self) -> Info {
        Info::new(SELF, PEER)
    }
}

/// Create a new XSUB protocol instance.
pub fn new_protocol() -> Arc<dyn Protocol> {
    Arc::new(XSubSocket::new())
}
