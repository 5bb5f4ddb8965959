//! Protocol-agnostic socket handle.

use bytes::Bytes;
use spool_core::error::Result;
use spool_core::identity::Info;
use spool_core::message::Message;
use spool_core::monitor::{create_monitor, SocketEvent, SocketEventSender, SocketMonitor};
use spool_core::options::OptionValue;
use spool_core::pipe::{Pipe, PipeId};
use spool_core::protocol::{Context, Protocol};
use std::sync::Arc;
use tracing::debug;

/// A socket speaking one Scalable Protocols pattern.
///
/// `Socket` wraps any [`Protocol`] implementation and adds byte-level
/// convenience methods and lifecycle monitoring. Pipes are handed to it by a
/// transport (or by [`spool_core::inproc::pipe_pair`] in-process).
///
/// ## Example
///
/// ```rust,no_run
/// use spool::{pipe_pair, Socket};
/// use std::sync::Arc;
///
/// # async fn example() -> spool::Result<()> {
/// let socket = Socket::xsub();
/// let (local, _remote) = pipe_pair(16);
/// socket.attach(Arc::new(local))?;
///
/// let frames = socket.recv().await?;
/// println!("Received {} frames", frames.len());
/// # Ok(())
/// # }
/// ```
pub struct Socket {
    proto: Arc<dyn Protocol>,
    monitor: Option<SocketEventSender>,
}

impl Socket {
    /// Wrap a protocol implementation.
    pub fn new(proto: Arc<dyn Protocol>) -> Self {
        Self {
            proto,
            monitor: None,
        }
    }

    /// Create a raw subscriber (XSUB) socket.
    #[cfg(feature = "proto")]
    pub fn xsub() -> Self {
        Self::new(spool_proto::xsub::new_protocol())
    }

    /// Create a subscriber (SUB) socket.
    #[cfg(feature = "proto")]
    pub fn sub() -> Self {
        Self::new(spool_proto::sub::new_protocol())
    }

    /// Create a pipeline sink (PULL) socket.
    #[cfg(feature = "proto")]
    pub fn pull() -> Self {
        Self::new(spool_proto::pull::new_protocol())
    }

    /// Create a raw star node socket.
    #[cfg(feature = "proto")]
    pub fn star() -> Self {
        Self::new(spool_proto::star::new_protocol())
    }

    /// Enable monitoring for this socket.
    ///
    /// Returns a receiver for lifecycle events. Calling it again replaces
    /// the previous monitor.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use spool::{Socket, SocketEvent};
    ///
    /// # async fn example() {
    /// let mut socket = Socket::xsub();
    /// let monitor = socket.monitor();
    ///
    /// compio::runtime::spawn(async move {
    ///     while let Ok(event) = monitor.recv_async().await {
    ///         println!("Socket event: {}", event);
    ///     }
    /// })
    /// .detach();
    /// # }
    /// ```
    pub fn monitor(&mut self) -> SocketMonitor {
        let (sender, receiver) = create_monitor();
        self.monitor = Some(sender);
        receiver
    }

    fn emit_event(&self, event: SocketEvent) {
        if let Some(monitor) = &self.monitor {
            let _ = monitor.send(event); // Ignore errors if receiver dropped
        }
    }

    /// Send a single-frame message.
    pub async fn send(&self, payload: impl Into<Bytes>) -> Result<()> {
        self.proto.send_msg(Message::new().push(payload)).await
    }

    /// Send a multipart message.
    pub async fn send_msg(&self, msg: Message) -> Result<()> {
        self.proto.send_msg(msg).await
    }

    /// Receive the next message as its frames.
    pub async fn recv(&self) -> Result<Vec<Bytes>> {
        Ok(self.proto.recv_msg().await?.into_frames())
    }

    /// Receive the next message, including the pipe it arrived on.
    pub async fn recv_msg(&self) -> Result<Message> {
        self.proto.recv_msg().await
    }

    /// Change a socket option.
    pub fn set_option(&self, name: &str, value: impl Into<OptionValue>) -> Result<()> {
        self.proto.set_option(name, value.into())
    }

    /// Read a socket option.
    pub fn get_option(&self, name: &str) -> Result<OptionValue> {
        self.proto.get_option(name)
    }

    /// Attach a connected pipe.
    ///
    /// Must be called from within a compio runtime.
    pub fn attach(&self, pipe: Arc<dyn Pipe>) -> Result<PipeId> {
        let id = pipe.id();
        match self.proto.add_pipe(pipe) {
            Ok(()) => {
                debug!(pipe = %id, "[SOCKET] Pipe attached");
                self.emit_event(SocketEvent::PipeAttached(id));
                Ok(id)
            }
            Err(e) => {
                self.emit_event(SocketEvent::AttachRejected {
                    pipe: id,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Forget a pipe previously attached.
    pub fn detach(&self, id: PipeId) {
        self.proto.remove_pipe(id);
        self.emit_event(SocketEvent::PipeDetached(id));
    }

    /// Open an independent context, where the protocol supports it.
    pub fn open_context(&self) -> Result<Box<dyn Context>> {
        self.proto.open_context()
    }

    /// Close the socket, waking every blocked receiver.
    ///
    /// Closing twice returns `Closed`.
    pub fn close(&self) -> Result<()> {
        self.proto.close()?;
        self.emit_event(SocketEvent::Closed);
        Ok(())
    }

    /// Protocol identity.
    pub fn info(&self) -> Info {
        self.proto.info()
    }

    /// The underlying protocol.
    pub fn protocol(&self) -> &Arc<dyn Protocol> {
        &self.proto
    }
}

impl From<Arc<dyn Protocol>> for Socket {
    fn from(proto: Arc<dyn Protocol>) -> Self {
        Self::new(proto)
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.proto.info();
        f.debug_struct("Socket")
            .field("protocol", &info.self_name)
            .field("monitored", &self.monitor.is_some())
            .finish()
    }
}
