//! In-process transport pipes.
//!
//! An inproc connection is a pair of [`InprocPipe`] endpoints joined by two
//! bounded flume channels, one per direction. Messages are handed over
//! without copying: frames are refcounted `Bytes`.
//!
//! Closing either end ends the connection for both: pending receives on
//! either side return `None` and further sends fail with `Closed`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use spool_core::inproc::pipe_pair;
//! use spool_core::message::Message;
//! use spool_core::pipe::Pipe;
//!
//! # async fn example() -> spool_core::error::Result<()> {
//! let (local, remote) = pipe_pair(16);
//!
//! remote.send_msg(Message::new().push_str("hello")).await?;
//! if let Some(msg) = local.recv_msg().await {
//!     println!("Received: {:?}", msg);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SpoolError};
use crate::message::Message;
use crate::pipe::{Pipe, PipeId};
use crate::signal::CloseSignal;
use flume::{Receiver, Sender};
use futures::FutureExt;
use tracing::trace;

/// One end of an in-process connection.
pub struct InprocPipe {
    id: PipeId,
    tx: Sender<Message>,
    rx: Receiver<Message>,
    /// Shared by both ends.
    closed: CloseSignal,
}

/// Create a connected pair of pipes.
///
/// Each direction buffers up to `capacity` messages; a full direction makes
/// `send_msg` wait. A capacity of zero makes every send a rendezvous.
#[must_use]
pub fn pipe_pair(capacity: usize) -> (InprocPipe, InprocPipe) {
    let (a_tx, b_rx) = flume::bounded(capacity);
    let (b_tx, a_rx) = flume::bounded(capacity);
    let closed = CloseSignal::new();

    let a = InprocPipe {
        id: PipeId::next(),
        tx: a_tx,
        rx: a_rx,
        closed: closed.clone(),
    };
    let b = InprocPipe {
        id: PipeId::next(),
        tx: b_tx,
        rx: b_rx,
        closed,
    };
    trace!(a = %a.id, b = %b.id, "[INPROC] Pipe pair created");
    (a, b)
}

impl InprocPipe {
    /// Check whether the connection has been closed by either end.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_fired()
    }

    /// Number of messages waiting to be received on this end.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[async_trait::async_trait(?Send)]
impl Pipe for InprocPipe {
    fn id(&self) -> PipeId {
        self.id
    }

    async fn recv_msg(&self) -> Option<Message> {
        if self.closed.is_fired() {
            return None;
        }
        futures::select! {
            msg = self.rx.recv_async().fuse() => msg.ok(),
            _ = self.closed.wait().fuse() => None,
        }
    }

    async fn send_msg(&self, msg: Message) -> Result<()> {
        if self.closed.is_fired() {
            return Err(SpoolError::Closed);
        }
        futures::select! {
            sent = self.tx.send_async(msg).fuse() => sent.map_err(|_| SpoolError::Closed),
            _ = self.closed.wait().fuse() => Err(SpoolError::Closed),
        }
    }

    fn close(&self) -> Result<()> {
        if self.closed.fire() {
            trace!(pipe = %self.id, "[INPROC] Pipe closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for InprocPipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InprocPipe")
            .field("id", &self.id)
            .field("closed", &self.closed.is_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[compio::test]
    async fn test_pair_delivers_both_ways() {
        let (a, b) = pipe_pair(4);

        a.send_msg(Message::new().push_str("ping")).await.unwrap();
        let got = b.recv_msg().await.unwrap();
        assert_eq!(got.parse_frame_str(0).unwrap(), "ping");

        b.send_msg(Message::new().push_str("pong")).await.unwrap();
        let got = a.recv_msg().await.unwrap();
        assert_eq!(got.parse_frame_str(0).unwrap(), "pong");
    }

    #[compio::test]
    async fn test_close_ends_both_sides() {
        let (a, b) = pipe_pair(4);
        a.close().unwrap();
        // Idempotent.
        a.close().unwrap();
        b.close().unwrap();

        assert!(a.is_closed() && b.is_closed());
        assert!(b.recv_msg().await.is_none());
        assert!(matches!(
            b.send_msg(Message::new()).await,
            Err(SpoolError::Closed)
        ));
    }

    #[compio::test]
    async fn test_close_wakes_pending_recv() {
        let (a, b) = pipe_pair(4);
        compio::runtime::spawn(async move {
            compio::time::sleep(Duration::from_millis(10)).await;
            a.close().unwrap();
        })
        .detach();

        assert!(b.recv_msg().await.is_none());
    }

    #[compio::test]
    async fn test_ids_differ() {
        let (a, b) = pipe_pair(1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.pending(), 0);
    }
}
