//! Fan-in receive core shared by every receiving protocol.
//!
//! One receiver task per pipe pumps messages into a single bounded
//! [`MsgQueue`]; the application drains it through `recv`.
//!
//! ```text
//! pipe A ─ receiver ─┐
//! pipe B ─ receiver ─┼─> MsgQueue (drop-oldest) ─> recv(deadline)
//! pipe C ─ receiver ─┘
//! ```
//!
//! Only the bookkeeping (closed flag, receive deadline, attached pipe ids)
//! sits behind the socket mutex; the queue synchronizes itself, so message
//! flow never contends on the socket lock.

use futures::FutureExt;
use parking_lot::Mutex;
use spool_core::error::{Result, SpoolError};
use spool_core::message::Message;
use spool_core::options::{OptionValue, SocketOptions, OPTION_READ_QLEN, OPTION_RECV_DEADLINE};
use spool_core::pipe::{Pipe, PipeId};
use spool_core::queue::{Enqueued, MsgQueue};
use spool_core::signal::CloseSignal;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Per-protocol hooks run by each pipe's receiver task.
pub(crate) trait Inbound: 'static {
    /// Hand a freshly received message to `recvq`.
    ///
    /// Return `None` when the message was discarded instead. Any lock the
    /// decision depends on must be held until the insert is done.
    fn deliver(&mut self, msg: Message, recvq: &MsgQueue<Message>) -> Option<Enqueued> {
        Some(recvq.try_enqueue(msg))
    }

    /// The receiver for `pipe` has stopped.
    fn detached(&mut self, _pipe: PipeId) {}
}

/// Accept everything.
pub(crate) struct PassThrough;

impl Inbound for PassThrough {}

struct FanInState {
    closed: bool,
    /// Zero waits without limit.
    recv_deadline: Duration,
    /// Pipes with a running receiver.
    pipes: HashSet<PipeId>,
}

/// Shared receive side of a socket.
pub(crate) struct FanIn {
    /// Log prefix, e.g. `"[XSUB]"`.
    tag: &'static str,
    state: Mutex<FanInState>,
    closed: CloseSignal,
    recvq: MsgQueue<Message>,
}

impl FanIn {
    pub(crate) fn new(tag: &'static str, options: &SocketOptions) -> Arc<Self> {
        debug!(read_qlen = options.read_qlen, "{tag} Creating socket");
        Arc::new(Self {
            tag,
            state: Mutex::new(FanInState {
                closed: false,
                recv_deadline: options.recv_deadline.unwrap_or(Duration::ZERO),
                pipes: HashSet::new(),
            }),
            closed: CloseSignal::new(),
            recvq: MsgQueue::new(options.read_qlen),
        })
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_fired()
    }

    /// The broadcast fired by `close`.
    pub(crate) fn close_signal(&self) -> &CloseSignal {
        &self.closed
    }

    pub(crate) fn queued(&self) -> usize {
        self.recvq.len()
    }

    pub(crate) async fn recv(&self) -> Result<Message> {
        let deadline = self.state.lock().recv_deadline;
        let msg = self.recvq.dequeue(Some(deadline), &self.closed).await?;
        trace!(frames = msg.len(), "{} Received message", self.tag);
        Ok(msg)
    }

    /// Apply a fan-in option. `BadOption` means the name is not ours.
    pub(crate) fn set_option(&self, name: &str, value: &OptionValue) -> Result<()> {
        match name {
            OPTION_RECV_DEADLINE => {
                let deadline = value.as_duration().ok_or(SpoolError::BadValue)?;
                self.state.lock().recv_deadline = deadline;
                Ok(())
            }
            OPTION_READ_QLEN => {
                let len = value.as_len().ok_or(SpoolError::BadValue)?;
                let released = self.recvq.resize(len);
                debug!(len, released, "{} Receive queue resized", self.tag);
                Ok(())
            }
            _ => Err(SpoolError::BadOption),
        }
    }

    /// Read a fan-in option. `BadOption` means the name is not ours.
    pub(crate) fn get_option(&self, name: &str) -> Result<OptionValue> {
        match name {
            OPTION_RECV_DEADLINE => Ok(OptionValue::Duration(self.state.lock().recv_deadline)),
            OPTION_READ_QLEN => Ok(self.recvq.capacity().into()),
            _ => Err(SpoolError::BadOption),
        }
    }

    /// Drop queued messages that `keep` rejects.
    pub(crate) fn purge<F>(&self, keep: F) -> usize
    where
        F: FnMut(&Message) -> bool,
    {
        self.recvq.retain(keep)
    }

    /// Start a receiver task for `pipe`.
    ///
    /// `on_attach` runs under the socket lock after the closed and
    /// duplicate checks, so protocol bookkeeping cannot race with `close`
    /// and never sees the same pipe twice.
    pub(crate) fn attach<I, F>(self: &Arc<Self>, pipe: Arc<dyn Pipe>, inbound: I, on_attach: F) -> Result<()>
    where
        I: Inbound,
        F: FnOnce(),
    {
        let id = pipe.id();
        let mut state = self.state.lock();
        if state.closed {
            debug!(pipe = %id, "{} Rejecting pipe on closed socket", self.tag);
            return Err(SpoolError::Closed);
        }
        if !state.pipes.insert(id) {
            debug!(pipe = %id, "{} Rejecting pipe already attached", self.tag);
            return Err(SpoolError::AlreadyAttached);
        }
        on_attach();

        let core = Arc::clone(self);
        compio::runtime::spawn(core.receiver(pipe, inbound)).detach();
        Ok(())
    }

    /// Transition to closed. Only the first call succeeds.
    pub(crate) fn close(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SpoolError::Closed);
            }
            state.closed = true;
        }
        self.closed.fire();
        let released = self.recvq.drain();
        debug!(released, "{} Socket closed", self.tag);
        Ok(())
    }

    async fn receiver<I: Inbound>(self: Arc<Self>, pipe: Arc<dyn Pipe>, mut inbound: I) {
        let id = pipe.id();
        debug!(pipe = %id, "{} Receiver started", self.tag);

        loop {
            let received = futures::select_biased! {
                _ = self.closed.wait().fuse() => None,
                msg = pipe.recv_msg().fuse() => msg,
            };
            let Some(mut msg) = received else {
                break;
            };
            msg.set_pipe(id);

            if self.closed.is_fired() {
                // Released here, never handed off.
                drop(msg);
                break;
            }

            match inbound.deliver(msg, &self.recvq) {
                None => trace!(pipe = %id, "{} Message filtered", self.tag),
                Some(Enqueued::Queued) => {}
                Some(Enqueued::EvictedOldest) => {
                    trace!(pipe = %id, "{} Queue full, evicted oldest", self.tag);
                }
                Some(Enqueued::DroppedIncoming { evicted }) => {
                    trace!(pipe = %id, evicted, "{} Queue contended, dropped incoming", self.tag);
                }
            }

            // `close` may have drained between the check above and the insert.
            if self.closed.is_fired() {
                let released = self.recvq.drain();
                trace!(pipe = %id, released, "{} Released messages queued during close", self.tag);
                break;
            }
        }

        inbound.detached(id);
        self.state.lock().pipes.remove(&id);
        let _ = pipe.close();
        debug!(pipe = %id, "{} Receiver stopped", self.tag);
    }
}
