//! SUB socket implementation
//!
//! SUB is the cooked counterpart of XSUB: messages are delivered only when
//! their first frame starts with one of the subscribed prefixes. A socket
//! with no subscriptions delivers nothing.
//!
//! The empty prefix matches every message.

use crate::fanin::{FanIn, Inbound};
use parking_lot::RwLock;
use spool_core::error::{Result, SpoolError};
use spool_core::identity::{Info, ProtocolId};
use spool_core::message::Message;
use spool_core::options::{OptionValue, SocketOptions, OPTION_RAW, OPTION_SUBSCRIBE, OPTION_UNSUBSCRIBE};
use spool_core::pipe::{Pipe, PipeId};
use spool_core::protocol::{Context, Protocol};
use spool_core::queue::{Enqueued, MsgQueue};
use spool_core::subscription::SubscriptionSet;
use std::sync::Arc;
use tracing::debug;

/// Our role.
pub const SELF: ProtocolId = ProtocolId::Sub;
/// Peer role.
pub const PEER: ProtocolId = ProtocolId::Pub;

/// Drops messages whose topic matches no subscription.
struct TopicFilter {
    subscriptions: Arc<RwLock<SubscriptionSet>>,
}

impl Inbound for TopicFilter {
    fn deliver(&mut self, msg: Message, recvq: &MsgQueue<Message>) -> Option<Enqueued> {
        // Held across the insert so `unsubscribe` purges after us, never before.
        let subscriptions = self.subscriptions.read();
        if !subscriptions.matches(msg.topic()) {
            return None;
        }
        Some(recvq.try_enqueue(msg))
    }
}

/// SUB socket with topic prefix filtering.
pub struct SubSocket {
    core: Arc<FanIn>,
    subscriptions: Arc<RwLock<SubscriptionSet>>,
}

impl SubSocket {
    /// Create a new SUB socket with default options.
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    /// Create a new SUB socket with custom options.
    pub fn with_options(options: SocketOptions) -> Self {
        Self {
            core: FanIn::new("[SUB]", &options),
            subscriptions: Arc::new(RwLock::new(SubscriptionSet::new())),
        }
    }

    /// Subscribe to a topic prefix.
    ///
    /// Subscribing twice to the same prefix is a no-op.
    pub fn subscribe(&self, prefix: impl Into<bytes::Bytes>) {
        let prefix = prefix.into();
        if self.subscriptions.write().subscribe(prefix.clone()) {
            debug!(prefix = ?prefix, "[SUB] Subscribed");
        }
    }

    /// Remove a subscription.
    ///
    /// Queued messages that no longer match any subscription are discarded.
    pub fn unsubscribe(&self, prefix: &[u8]) -> Result<()> {
        let mut subscriptions = self.subscriptions.write();
        if !subscriptions.unsubscribe(prefix) {
            return Err(SpoolError::BadValue);
        }
        let purged = self.core.purge(|msg| subscriptions.matches(msg.topic()));
        debug!(prefix = ?prefix, purged, "[SUB] Unsubscribed");
        Ok(())
    }

    /// Current number of subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Number of messages waiting in the receive queue.
    pub fn queued(&self) -> usize {
        self.core.queued()
    }
}

impl Default for SubSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait(?Send)]
impl Protocol for SubSocket {
    async fn send_msg(&self, _msg: Message) -> Result<()> {
        Err(SpoolError::ProtocolOperationUnsupported)
    }

    async fn recv_msg(&self) -> Result<Message> {
        self.core.recv().await
    }

    fn set_option(&self, name: &str, value: OptionValue) -> Result<()> {
        match name {
            OPTION_SUBSCRIBE => {
                self.subscribe(value.as_bytes().ok_or(SpoolError::BadValue)?);
                Ok(())
            }
            OPTION_UNSUBSCRIBE => {
                let prefix = value.as_bytes().ok_or(SpoolError::BadValue)?;
                self.unsubscribe(&prefix)
            }
            _ => self.core.set_option(name, &value),
        }
    }

    fn get_option(&self, name: &str) -> Result<OptionValue> {
        match name {
            OPTION_RAW => Ok(OptionValue::Bool(false)),
            _ => self.core.get_option(name),
        }
    }

    fn add_pipe(&self, pipe: Arc<dyn Pipe>) -> Result<()> {
        let filter = TopicFilter {
            subscriptions: Arc::clone(&self.subscriptions),
        };
        self.core.attach(pipe, filter, || {})
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

/// Create a new SUB protocol instance.
pub fn new_protocol() -> Arc<dyn Protocol> {
    Arc::new(SubSocket::new())
}
