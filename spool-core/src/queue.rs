//! Bounded drop-oldest message queue.
//!
//! `MsgQueue` is the shared buffer between pipe workers (many writers) and
//! the socket consumer. It never blocks a writer:
//!
//! ```text
//! try_enqueue(m):
//!   room?            -> queue m                      (Queued)
//!   full?            -> release oldest, queue m      (EvictedOldest)
//!   lost the race?   -> release m                    (DroppedIncoming)
//! ```
//!
//! The buffer is a bounded flume channel behind an `RwLock`. Writers and
//! readers only take the read side; `resize` takes the write side so the
//! drain-and-swap is atomic with respect to writers. Readers parked on the
//! old channel are woken by its sender being dropped and move on to the new
//! one.
//!
//! A zero-capacity queue keeps a single hand-off slot that is only filled
//! while a reader is parked in `dequeue`; with nobody waiting the incoming
//! message is released.

use crate::error::{Result, SpoolError};
use crate::signal::CloseSignal;
use flume::{Receiver, Sender, TrySendError};
use futures::FutureExt;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Outcome of a non-blocking insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Inserted without disturbing resident messages.
    Queued,
    /// The oldest resident message was released to make room.
    EvictedOldest,
    /// No room could be made under contention; the incoming message was
    /// released, along with the oldest one if it had already been evicted.
    DroppedIncoming {
        /// Whether an eviction happened before the retry failed.
        evicted: bool,
    },
}

impl Enqueued {
    /// Number of messages this insert released.
    #[must_use]
    pub const fn released(self) -> usize {
        match self {
            Self::Queued => 0,
            Self::EvictedOldest | Self::DroppedIncoming { evicted: false } => 1,
            Self::DroppedIncoming { evicted: true } => 2,
        }
    }
}

struct Channel<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
}

impl<T> Channel<T> {
    fn bounded(capacity: usize) -> Self {
        // flume's own rendezvous channel never completes a `try_send`, so a
        // zero capacity is backed by one hand-off slot.
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self { tx, rx, capacity }
    }

    fn push(&self, item: T, parked: usize) -> Enqueued {
        if self.capacity > 0 {
            return push_evicting(&self.tx, &self.rx, item);
        }
        if parked == 0 {
            return Enqueued::DroppedIncoming { evicted: false };
        }
        match self.tx.try_send(item) {
            Ok(()) => Enqueued::Queued,
            // Slot already taken by a message the reader has not picked up.
            Err(_) => Enqueued::DroppedIncoming { evicted: false },
        }
    }
}

/// Bounded FIFO with drop-oldest eviction and atomic resize.
pub struct MsgQueue<T> {
    chan: RwLock<Channel<T>>,
    /// Readers currently parked in `dequeue`.
    parked: AtomicUsize,
}

/// Counts a reader as parked for as long as it lives.
struct ParkedReader<'a>(&'a AtomicUsize);

impl<'a> ParkedReader<'a> {
    fn enter(parked: &'a AtomicUsize) -> Self {
        parked.fetch_add(1, Ordering::SeqCst);
        Self(parked)
    }
}

impl Drop for ParkedReader<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T> MsgQueue<T> {
    /// Create a queue holding at most `capacity` items.
    ///
    /// A capacity of zero makes the queue a rendezvous point: an insert
    /// only succeeds while a reader is waiting.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            chan: RwLock::new(Channel::bounded(capacity)),
            parked: AtomicUsize::new(0),
        }
    }

    /// Current capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.chan.read().capacity
    }

    /// Number of resident items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chan.read().rx.len()
    }

    /// Check if no items are resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert without blocking, evicting the oldest item when full.
    pub fn try_enqueue(&self, item: T) -> Enqueued {
        let chan = self.chan.read();
        chan.push(item, self.parked.load(Ordering::SeqCst))
    }

    /// Take the oldest item if one is resident.
    pub fn try_dequeue(&self) -> Option<T> {
        self.chan.read().rx.try_recv().ok()
    }

    /// Wait for the next item.
    ///
    /// Resolves to exactly one of: the item, `RecvTimeout` once `deadline`
    /// has elapsed, or `Closed` once `closed` fires. `None` or a zero
    /// deadline waits without limit.
    ///
    /// # Errors
    ///
    /// `SpoolError::RecvTimeout` or `SpoolError::Closed`.
    pub async fn dequeue(&self, deadline: Option<Duration>, closed: &CloseSignal) -> Result<T> {
        // Armed once so a resize mid-wait does not extend the deadline.
        let timer = async move {
            match deadline {
                Some(d) if !d.is_zero() => compio::time::sleep(d).await,
                _ => futures::future::pending::<()>().await,
            }
        }
        .fuse();
        futures::pin_mut!(timer);
        let _parked = ParkedReader::enter(&self.parked);

        loop {
            if closed.is_fired() {
                return Err(SpoolError::Closed);
            }
            let rx = self.chan.read().rx.clone();
            // Closure wins over a ready item, an item wins over the deadline.
            futures::select_biased! {
                _ = closed.wait().fuse() => return Err(SpoolError::Closed),
                item = rx.recv_async().fuse() => match item {
                    Ok(item) => return Ok(item),
                    // The channel was swapped out by `resize`.
                    Err(flume::RecvError::Disconnected) => continue,
                },
                _ = timer => return Err(SpoolError::RecvTimeout),
            }
        }
    }

    /// Replace the buffer with one of `capacity`, keeping the newest items.
    ///
    /// Resident items are moved over oldest first with drop-oldest
    /// semantics, so at most `capacity` of the most recent survive in their
    /// original order. Returns how many items were released.
    pub fn resize(&self, capacity: usize) -> usize {
        let fresh = Channel::bounded(capacity);
        let mut chan = self.chan.write();

        let mut released = 0;
        while let Ok(item) = chan.rx.try_recv() {
            released += fresh.push(item, 0).released();
        }

        let old = std::mem::replace(&mut *chan, fresh);
        drop(chan);
        // Anything a parked reader has not taken yet goes with the old channel.
        drop(old);
        released
    }

    /// Keep only the resident items for which `keep` returns `true`,
    /// preserving their order. Returns how many were released.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let chan = self.chan.write();
        let parked = self.parked.load(Ordering::SeqCst);
        let resident: Vec<T> = chan.rx.try_iter().collect();
        let mut released = 0;
        for item in resident {
            if keep(&item) {
                released += chan.push(item, parked).released();
            } else {
                released += 1;
            }
        }
        released
    }

    /// Release every resident item. Returns how many were released.
    pub fn drain(&self) -> usize {
        self.chan.read().rx.try_iter().count()
    }
}

fn push_evicting<T>(tx: &Sender<T>, rx: &Receiver<T>, item: T) -> Enqueued {
    match tx.try_send(item) {
        Ok(()) => Enqueued::Queued,
        Err(TrySendError::Full(item)) => {
            // Prefer fresh data: yank the oldest first.
            let evicted = rx.try_recv().is_ok();
            match tx.try_send(item) {
                Ok(()) if evicted => Enqueued::EvictedOldest,
                Ok(()) => Enqueued::Queued,
                // Contending with other writers; give up on this one.
                Err(_) => Enqueued::DroppedIncoming { evicted },
            }
        }
        Err(TrySendError::Disconnected(_)) => Enqueued::DroppedIncoming { evicted: false },
    }
}

impl<T> std::fmt::Debug for MsgQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chan = self.chan.read();
        f.debug_struct("MsgQueue")
            .field("capacity", &chan.capacity)
            .field("len", &chan.rx.len())
            .field("parked", &self.parked.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    /// Payload that counts its own release.
    struct Tracked {
        id: usize,
        released: Arc<AtomicUsize>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracked(id: usize, released: &Arc<AtomicUsize>) -> Tracked {
        Tracked {
            id,
            released: Arc::clone(released),
        }
    }

    fn drain_ids(q: &MsgQueue<Tracked>) -> Vec<usize> {
        std::iter::from_fn(|| q.try_dequeue()).map(|t| t.id).collect()
    }

    #[test]
    fn test_enqueue_within_capacity() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(4);
        for i in 0..4 {
            assert_eq!(q.try_enqueue(tracked(i, &released)), Enqueued::Queued);
        }
        assert_eq!(q.len(), 4);
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(drain_ids(&q), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(2);
        assert_eq!(q.try_enqueue(tracked(1, &released)), Enqueued::Queued);
        assert_eq!(q.try_enqueue(tracked(2, &released)), Enqueued::Queued);
        assert_eq!(q.try_enqueue(tracked(3, &released)), Enqueued::EvictedOldest);

        // The first message was released, not retained.
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(q.len(), 2);
        assert_eq!(drain_ids(&q), vec![2, 3]);
    }

    #[test]
    fn test_sustained_overflow_keeps_newest() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(3);
        for i in 0..30 {
            q.try_enqueue(tracked(i, &released));
        }
        assert_eq!(released.load(Ordering::SeqCst), 27);
        assert_eq!(drain_ids(&q), vec![27, 28, 29]);
    }

    #[test]
    fn test_zero_capacity_without_reader_drops_incoming() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(0);
        assert_eq!(q.try_enqueue(tracked(1, &released)), Enqueued::DroppedIncoming { evicted: false });
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(q.is_empty());
    }

    #[compio::test]
    async fn test_zero_capacity_hands_off_to_parked_reader() {
        let q: Arc<MsgQueue<u32>> = Arc::new(MsgQueue::new(0));
        let closed = CloseSignal::new();
        let (tx, rx) = flume::bounded(1);

        let writer = Arc::clone(&q);
        compio::runtime::spawn(async move {
            compio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(writer.try_enqueue(5));
        })
        .detach();

        let item = q.dequeue(Some(Duration::from_millis(500)), &closed).await.unwrap();
        assert_eq!(item, 5);
        assert_eq!(rx.recv_async().await.unwrap(), Enqueued::Queued);
        assert_eq!(q.capacity(), 0);

        // The reader is gone again, so the next insert has nowhere to go.
        assert_eq!(q.try_enqueue(6), Enqueued::DroppedIncoming { evicted: false });
        assert!(q.is_empty());
    }

    #[test]
    fn test_resize_shrink_keeps_newest_in_order() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(5);
        for i in 0..5 {
            q.try_enqueue(tracked(i, &released));
        }

        assert_eq!(q.resize(2), 3);
        assert_eq!(q.capacity(), 2);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert_eq!(drain_ids(&q), vec![3, 4]);
    }

    #[test]
    fn test_resize_grow_keeps_everything() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(2);
        q.try_enqueue(tracked(0, &released));
        q.try_enqueue(tracked(1, &released));

        assert_eq!(q.resize(8), 0);
        assert_eq!(q.capacity(), 8);
        for i in 2..8 {
            assert_eq!(q.try_enqueue(tracked(i, &released)), Enqueued::Queued);
        }
        assert_eq!(drain_ids(&q), (0..8).collect::<Vec<_>>());
        assert_eq!(released.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_resize_to_zero_releases_all() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(3);
        for i in 0..3 {
            q.try_enqueue(tracked(i, &released));
        }
        assert_eq!(q.resize(0), 3);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert!(q.is_empty());
    }

    #[test]
    fn test_retain_filters_in_order() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(8);
        for i in 0..6 {
            q.try_enqueue(tracked(i, &released));
        }
        assert_eq!(q.retain(|t| t.id % 2 == 1), 3);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert_eq!(drain_ids(&q), vec![1, 3, 5]);
    }

    #[test]
    fn test_drain_releases_resident() {
        let released = Arc::new(AtomicUsize::new(0));
        let q = MsgQueue::new(4);
        for i in 0..3 {
            q.try_enqueue(tracked(i, &released));
        }
        assert_eq!(q.drain(), 3);
        assert_eq!(released.load(Ordering::SeqCst), 3);
        assert!(q.is_empty());
    }

    #[compio::test]
    async fn test_dequeue_returns_resident_item() {
        let q = MsgQueue::new(2);
        q.try_enqueue(7u32);
        let closed = CloseSignal::new();
        assert_eq!(q.dequeue(None, &closed).await.unwrap(), 7);
    }

    #[compio::test]
    async fn test_dequeue_deadline() {
        let q: MsgQueue<u32> = MsgQueue::new(2);
        let closed = CloseSignal::new();
        let deadline = Duration::from_millis(50);

        let start = Instant::now();
        let err = q.dequeue(Some(deadline), &closed).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, SpoolError::RecvTimeout));
        assert!(elapsed >= deadline, "returned early: {elapsed:?}");
        assert!(elapsed < deadline + Duration::from_millis(500), "too late: {elapsed:?}");
    }

    #[compio::test]
    async fn test_dequeue_wakes_on_close() {
        let q: MsgQueue<u32> = MsgQueue::new(2);
        let closed = CloseSignal::new();
        let closer = closed.clone();
        compio::runtime::spawn(async move {
            compio::time::sleep(Duration::from_millis(10)).await;
            closer.fire();
        })
        .detach();

        let err = q.dequeue(None, &closed).await.unwrap_err();
        assert!(matches!(err, SpoolError::Closed));
    }

    #[compio::test]
    async fn test_dequeue_survives_resize() {
        let q: Arc<MsgQueue<u32>> = Arc::new(MsgQueue::new(2));
        let closed = CloseSignal::new();

        let writer = Arc::clone(&q);
        compio::runtime::spawn(async move {
            compio::time::sleep(Duration::from_millis(10)).await;
            writer.resize(4);
            compio::time::sleep(Duration::from_millis(10)).await;
            writer.try_enqueue(99);
        })
        .detach();

        let item = q
            .dequeue(Some(Duration::from_secs(2)), &closed)
            .await
            .unwrap();
        assert_eq!(item, 99);
        assert_eq!(q.capacity(), 4);
    }
}
