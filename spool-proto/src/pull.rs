//! PULL socket implementation
//!
//! PULL sockets are receive-only endpoints in the pipeline pattern. They
//! collect messages from every attached PUSH peer into one queue.
//!
//! # Characteristics
//!
//! - **Receive-only**: Cannot send messages
//! - **Fan-in**: Receives from all PUSH peers
//! - **No filtering**: All messages are delivered

use crate::fanin::{FanIn, PassThrough};
use spool_core::error::{Result, SpoolError};
use spool_core::identity::{Info, ProtocolId};
use spool_core::message::Message;
use spool_core::options::{OptionValue, SocketOptions, OPTION_RAW};
use spool_core::pipe::{Pipe, PipeId};
use spool_core::protocol::{Context, Protocol};
use std::sync::Arc;

/// Our role.
pub const SELF: ProtocolId = ProtocolId::Pull;
/// Peer role.
pub const PEER: ProtocolId = ProtocolId::Push;

/// PULL socket for receiving messages in a pipeline.
pub struct PullSocket {
    core: Arc<FanIn>,
}

impl PullSocket {
    /// Create a new PULL socket with default options.
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    /// Create a new PULL socket with custom options.
    pub fn with_options(options: SocketOptions) -> Self {
        Self {
            core: FanIn::new("[PULL]", &options),
        }
    }
}

impl Default for PullSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait(?Send)]
impl Protocol for PullSocket {
    async fn send_msg(&self, _msg: Message) -> Result<()> {
        Err(SpoolError::ProtocolOperationUnsupported)
    }

    async fn recv_msg(&self) -> Result<Message> {
        self.core.recv().await
    }

    fn set_option(&self, name: &str, value: OptionValue) -> Result<()> {
        self.core.set_option(name, &value)
    }

    fn get_option(&self, name: &str) -> Result<OptionValue> {
        match name {
            OPTION_RAW => Ok(OptionValue::Bool(false)),
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

/// Create a new PULL protocol instance.
pub fn new_protocol() -> Arc<dyn Protocol> {
    Arc::new(PullSocket::new())
}
