//! The contract every protocol socket implements.
//!
//! Transports and session managers drive `add_pipe` / `remove_pipe`;
//! applications drive the rest through the `spool` facade. Everything is
//! callable through `&self` so one socket can be shared between tasks.

use crate::error::Result;
use crate::identity::Info;
use crate::message::Message;
use crate::options::OptionValue;
use crate::pipe::{Pipe, PipeId};
use std::sync::Arc;

/// A protocol socket: one logical endpoint over any number of pipes.
#[async_trait::async_trait(?Send)]
pub trait Protocol: Send + Sync {
    /// Send a message.
    ///
    /// # Errors
    ///
    /// `ProtocolOperationUnsupported` on receive-only protocols,
    /// `Closed` after `close()`.
    async fn send_msg(&self, msg: Message) -> Result<()>;

    /// Receive the next message, honoring the receive deadline.
    ///
    /// # Errors
    ///
    /// `RecvTimeout` when the deadline elapses, `Closed` when the socket is
    /// closed (including while waiting).
    async fn recv_msg(&self) -> Result<Message>;

    /// Change a socket option.
    ///
    /// # Errors
    ///
    /// `BadOption` for unknown or read-only names, `BadValue` for values of
    /// the wrong type or range.
    fn set_option(&self, name: &str, value: OptionValue) -> Result<()>;

    /// Read a socket option.
    ///
    /// # Errors
    ///
    /// `BadOption` for unknown names.
    fn get_option(&self, name: &str) -> Result<OptionValue>;

    /// Attach a pipe and start its worker(s).
    ///
    /// Must be called from within a compio runtime.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket has been closed.
    fn add_pipe(&self, pipe: Arc<dyn Pipe>) -> Result<()>;

    /// Forget a pipe's bookkeeping.
    fn remove_pipe(&self, id: PipeId);

    /// Open an independent context over this socket.
    ///
    /// # Errors
    ///
    /// `ProtocolOperationUnsupported` for protocols without contexts.
    fn open_context(&self) -> Result<Box<dyn Context>>;

    /// Close the socket.
    ///
    /// # Errors
    ///
    /// `Closed` if the socket was already closed.
    fn close(&self) -> Result<()>;

    /// Static protocol identity.
    fn info(&self) -> Info;
}

/// An independent conversation multiplexed over one socket.
#[async_trait::async_trait(?Send)]
pub trait Context {
    /// Send within this context.
    async fn send_msg(&self, msg: Message) -> Result<()>;

    /// Receive within this context.
    async fn recv_msg(&self) -> Result<Message>;

    /// Close this context without closing the socket.
    fn close(&self) -> Result<()>;
}
