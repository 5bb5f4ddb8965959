//! STAR (raw) socket implementation
//!
//! A star node is both sender and receiver. Every message sent is copied to
//! every attached pipe; every message received is relayed to every other
//! pipe and queued for the local reader.
//!
//! # Pattern
//!
//! ```text
//!            ┌─> sendq A ─ sender ─> pipe A ─┐
//! send_msg ──┼─> sendq B ─ sender ─> pipe B  │ relay to B, C
//!            └─> sendq C ─ sender ─> pipe C  │
//!                                            v
//!                          receiver A ─> recv queue ─> recv_msg()
//! ```
//!
//! Sending never waits on a slow peer: each pipe has its own bounded send
//! queue and a copy that does not fit is dropped.

use crate::fanin::{FanIn, Inbound};
use futures::FutureExt;
use parking_lot::Mutex;
use spool_core::error::{Result, SpoolError};
use spool_core::identity::{Info, ProtocolId};
use spool_core::message::Message;
use spool_core::options::{OptionValue, SocketOptions, OPTION_RAW, OPTION_WRITE_QLEN};
use spool_core::pipe::{Pipe, PipeId};
use spool_core::protocol::{Context, Protocol};
use spool_core::queue::{Enqueued, MsgQueue};
use spool_core::signal::CloseSignal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Our role.
pub const SELF: ProtocolId = ProtocolId::Star;
/// Peer role.
pub const PEER: ProtocolId = ProtocolId::Star;

/// Send side of one attached pipe.
struct Peer {
    sendq: flume::Sender<Message>,
    /// Stops this pipe's sender without closing the socket.
    closed: CloseSignal,
}

struct FanoutState {
    peers: HashMap<PipeId, Peer>,
    write_qlen: usize,
}

/// Pipe table shared by the socket and every receiver's relay hook.
struct Fanout {
    state: Mutex<FanoutState>,
}

impl Fanout {
    /// Copy `msg` into every send queue except `except`'s.
    ///
    /// Returns the number of queues that accepted a copy.
    fn broadcast(&self, msg: &Message, except: Option<PipeId>) -> usize {
        let state = self.state.lock();
        let mut delivered = 0;
        for (id, peer) in &state.peers {
            if Some(*id) == except {
                continue;
            }
            match peer.sendq.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(flume::TrySendError::Full(_)) => {
                    trace!(pipe = %id, "[STAR] Send queue full, dropped copy");
                }
                Err(flume::TrySendError::Disconnected(_)) => {}
            }
        }
        delivered
    }

    fn remove(&self, id: PipeId) -> bool {
        let removed = self.state.lock().peers.remove(&id);
        match removed {
            Some(peer) => {
                peer.closed.fire();
                true
            }
            None => false,
        }
    }

    fn clear(&self) {
        let peers: Vec<Peer> = self.state.lock().peers.drain().map(|(_, p)| p).collect();
        for peer in peers {
            peer.closed.fire();
        }
    }
}

/// Relays each received message to the other pipes.
struct Relay {
    fanout: Arc<Fanout>,
}

impl Inbound for Relay {
    fn deliver(&mut self, msg: Message, recvq: &MsgQueue<Message>) -> Option<Enqueued> {
        self.fanout.broadcast(&msg, msg.pipe());
        Some(recvq.try_enqueue(msg))
    }

    fn detached(&mut self, pipe: PipeId) {
        self.fanout.remove(pipe);
    }
}

/// Raw STAR socket.
pub struct StarSocket {
    core: Arc<FanIn>,
    fanout: Arc<Fanout>,
}

impl StarSocket {
    /// Create a new STAR socket with default options.
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    /// Create a new STAR socket with custom options.
    pub fn with_options(options: SocketOptions) -> Self {
        Self {
            core: FanIn::new("[STAR]", &options),
            fanout: Arc::new(Fanout {
                state: Mutex::new(FanoutState {
                    peers: HashMap::new(),
                    write_qlen: options.write_qlen,
                }),
            }),
        }
    }

    /// Number of attached pipes.
    pub fn peer_count(&self) -> usize {
        self.fanout.state.lock().peers.len()
    }

    async fn sender(core: Arc<FanIn>, pipe: Arc<dyn Pipe>, sendq: flume::Receiver<Message>, closed: CloseSignal) {
        let id = pipe.id();
        debug!(pipe = %id, "[STAR] Sender started");

        loop {
            let next = futures::select_biased! {
                _ = core.close_signal().wait().fuse() => None,
                _ = closed.wait().fuse() => None,
                msg = sendq.recv_async().fuse() => msg.ok(),
            };
            let Some(msg) = next else {
                break;
            };

            let sent = futures::select_biased! {
                _ = core.close_signal().wait().fuse() => Err(SpoolError::Closed),
                _ = closed.wait().fuse() => Err(SpoolError::Closed),
                sent = pipe.send_msg(msg).fuse() => sent,
            };
            if let Err(e) = sent {
                trace!(pipe = %id, error = %e, "[STAR] Send failed");
                break;
            }
        }

        let _ = pipe.close();
        debug!(pipe = %id, "[STAR] Sender stopped");
    }
}

impl Default for StarSocket {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait(?Send)]
impl Protocol for StarSocket {
    async fn send_msg(&self, msg: Message) -> Result<()> {
        if self.core.is_closed() {
            return Err(SpoolError::Closed);
        }
        let delivered = self.fanout.broadcast(&msg, None);
        trace!(delivered, "[STAR] Sent message");
        Ok(())
    }

    async fn recv_msg(&self) -> Result<Message> {
        self.core.recv().await
    }

    fn set_option(&self, name: &str, value: OptionValue) -> Result<()> {
        match name {
            OPTION_WRITE_QLEN => {
                let len = value.as_len().ok_or(SpoolError::BadValue)?;
                self.fanout.state.lock().write_qlen = len;
                Ok(())
            }
            _ => self.core.set_option(name, &value),
        }
    }

    fn get_option(&self, name: &str) -> Result<OptionValue> {
        match name {
            OPTION_RAW => Ok(OptionValue::Bool(true)),
            OPTION_WRITE_QLEN => Ok(self.fanout.state.lock().write_qlen.into()),
            _ => self.core.get_option(name),
        }
    }

    fn add_pipe(&self, pipe: Arc<dyn Pipe>) -> Result<()> {
        let relay = Relay {
            fanout: Arc::clone(&self.fanout),
        };
        let core = Arc::clone(&self.core);
        let fanout = &self.fanout;
        let sender_pipe = Arc::clone(&pipe);

        self.core.attach(pipe, relay, move || {
            let id = sender_pipe.id();
            let closed = CloseSignal::new();
            let mut state = fanout.state.lock();
            let (tx, rx) = flume::bounded(state.write_qlen);
            state.peers.insert(
                id,
                Peer {
                    sendq: tx,
                    closed: closed.clone(),
                },
            );
            drop(state);

            compio::runtime::spawn(Self::sender(core, sender_pipe, rx, closed)).detach();
        })
    }

    fn remove_pipe(&self, id: PipeId) {
        if self.fanout.remove(id) {
            debug!(pipe = %id, "[STAR] Pipe removed");
        }
    }

    fn open_context(&self) -> Result<Box<dyn Context>> {
        Err(SpoolError::ProtocolOperationUnsupported)
    }

    fn close(&self) -> Result<()> {
        self.core.close()?;
        self.fanout.clear();
        Ok(())
    }

    fn info(&self) -> Info {
        Info::new(SELF, PEER)
    }
}

/// Create a new STAR protocol instance.
pub fn new_protocol() -> Arc<dyn Protocol> {
    Arc::new(StarSocket::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spool_core::inproc::pipe_pair;

    #[test]
    fn test_write_qlen_option() {
        let star = StarSocket::new();
        assert_eq!(star.get_option(OPTION_WRITE_QLEN).unwrap(), OptionValue::Int(128));

        star.set_option(OPTION_WRITE_QLEN, 2usize.into()).unwrap();
        assert_eq!(star.get_option(OPTION_WRITE_QLEN).unwrap(), OptionValue::Int(2));

        assert!(matches!(
            star.set_option(OPTION_WRITE_QLEN, OptionValue::Int(-1)),
            Err(SpoolError::BadValue)
        ));
        assert!(matches!(
            star.set_option(OPTION_WRITE_QLEN, OptionValue::Bool(true)),
            Err(SpoolError::BadValue)
        ));
    }

    #[test]
    fn test_raw_is_true_and_read_only() {
        let star = StarSocket::new();
        assert_eq!(star.get_option(OPTION_RAW).unwrap(), OptionValue::Bool(true));
        assert!(star.set_option(OPTION_RAW, OptionValue::Bool(false)).is_err());
    }

    #[compio::test]
    async fn test_send_without_peers() {
        let star = StarSocket::new();
        star.send_msg(Message::new().push_str("nobody")).await.unwrap();
        star.close().unwrap();
        assert!(matches!(
            star.send_msg(Message::new()).await,
            Err(SpoolError::Closed)
        ));
    }

    #[compio::test]
    async fn test_remove_pipe_forgets_peer() {
        let star = StarSocket::new();
        let (local, _remote) = pipe_pair(4);
        let id = local.id();
        star.add_pipe(Arc::new(local)).unwrap();
        assert_eq!(star.peer_count(), 1);

        star.remove_pipe(id);
        assert_eq!(star.peer_count(), 0);
        star.remove_pipe(id);
    }

    #[compio::test]
    async fn test_close_clears_peers() {
        let star = StarSocket::new();
        let (local, _remote) = pipe_pair(4);
        star.add_pipe(Arc::new(local)).unwrap();

        star.close().unwrap();
        assert_eq!(star.peer_count(), 0);
        assert!(matches!(star.close(), Err(SpoolError::Closed)));
    }
}
