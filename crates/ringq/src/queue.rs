use crate::multi::MultiProducerRing;
use crate::single::SingleProducerRing;
use crate::{Config, MetricsSnapshot};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

/// Error types for queue handle management.
///
/// Note that full and empty are *not* errors: `push` and `pop` report them
/// as ordinary boolean/`Option` outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The single push handle for this queue was already handed out.
    #[error("producer handle already claimed")]
    ProducerAlreadyClaimed,
}

mod sealed {
    pub trait Sealed {}
    impl<T> Sealed for crate::single::SingleProducerRing<T> {}
    impl<T> Sealed for crate::multi::MultiProducerRing<T> {}
}

/// A queue backend: slot storage plus one of the two cursor protocols.
///
/// Selected as a type parameter of [`Queue`], so the choice is made at
/// compile time and every call is statically dispatched — there is no
/// vtable on the push/pop path. The trait is sealed: the two backends are
/// the protocol implementations, not an extension point.
pub trait Backend<T>: sealed::Sealed {
    #[doc(hidden)]
    fn with_config(config: Config) -> Self
    where
        Self: Sized;

    /// Dequeues the element at the head of the queue, or `None` if empty.
    /// Never blocks.
    fn pop(&self) -> Option<T>;

    /// Current number of elements. Approximate unless `Config::exact_size`
    /// is set.
    fn len(&self) -> usize;

    /// True if the queue holds no elements (approximate, like `len`).
    fn is_empty(&self) -> bool;

    /// True if a push would currently be rejected (approximate, like
    /// `len`).
    fn is_full(&self) -> bool;

    /// Total slot count N.
    fn capacity(&self) -> usize;

    /// Number of elements the queue can hold: N - 1.
    fn usable_capacity(&self) -> usize;

    /// Operation counters (all zeroes unless `Config::enable_metrics`).
    fn metrics(&self) -> MetricsSnapshot;
}

impl<T> Backend<T> for SingleProducerRing<T> {
    fn with_config(config: Config) -> Self {
        SingleProducerRing::with_config(config)
    }
    fn pop(&self) -> Option<T> {
        SingleProducerRing::pop(self)
    }
    fn len(&self) -> usize {
        SingleProducerRing::len(self)
    }
    fn is_empty(&self) -> bool {
        SingleProducerRing::is_empty(self)
    }
    fn is_full(&self) -> bool {
        SingleProducerRing::is_full(self)
    }
    fn capacity(&self) -> usize {
        SingleProducerRing::capacity(self)
    }
    fn usable_capacity(&self) -> usize {
        SingleProducerRing::usable_capacity(self)
    }
    fn metrics(&self) -> MetricsSnapshot {
        SingleProducerRing::metrics(self)
    }
}

impl<T> Backend<T> for MultiProducerRing<T> {
    fn with_config(config: Config) -> Self {
        MultiProducerRing::with_config(config)
    }
    fn pop(&self) -> Option<T> {
        MultiProducerRing::pop(self)
    }
    fn len(&self) -> usize {
        MultiProducerRing::len(self)
    }
    fn is_empty(&self) -> bool {
        MultiProducerRing::is_empty(self)
    }
    fn is_full(&self) -> bool {
        MultiProducerRing::is_full(self)
    }
    fn capacity(&self) -> usize {
        MultiProducerRing::capacity(self)
    }
    fn usable_capacity(&self) -> usize {
        MultiProducerRing::usable_capacity(self)
    }
    fn metrics(&self) -> MetricsSnapshot {
        MultiProducerRing::metrics(self)
    }
}

/// Fixed-capacity lock-free queue facade over a chosen backend.
///
/// The backend is bound at construction together with the capacity and
/// never changes; every call forwards to it unchanged. Use the
/// [`SingleProducerQueue`] alias when exactly one thread pushes (wait-free
/// push) and [`MultiProducerQueue`] when any number do. Consumers are
/// unrestricted in both cases: clone the queue handle into as many threads
/// as needed and call [`pop`](Self::pop).
///
/// Capacity rules: a queue built over N slots holds at most N - 1 elements
/// (one slot is kept empty to tell "full" from "empty"). Capacities that
/// are not a power of two work correctly — indexing falls back from a mask
/// to a true modulo.
///
/// `push` and `pop` never block and never return errors; "full" and
/// "empty" are steady-state outcomes to poll or back off from.
pub struct Queue<T, B: Backend<T>> {
    backend: Arc<B>,
    _marker: PhantomData<fn() -> T>,
}

/// Queue with one producer thread (wait-free push) and any number of
/// consumers. Push goes through the single [`Producer`] handle.
pub type SingleProducerQueue<T> = Queue<T, SingleProducerRing<T>>;

/// Queue with any number of producer and consumer threads.
pub type MultiProducerQueue<T> = Queue<T, MultiProducerRing<T>>;

impl<T, B: Backend<T>> Queue<T, B> {
    /// Creates a queue from a full configuration.
    pub fn new(config: Config) -> Self {
        Self {
            backend: Arc::new(B::with_config(config)),
            _marker: PhantomData,
        }
    }

    /// Creates a queue with the given total slot count and default options.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Config::new(capacity))
    }

    /// Dequeues the element at the head of the queue, or `None` if empty.
    /// Never blocks; callable from any number of threads.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        self.backend.pop()
    }

    /// Current number of elements. Approximate under concurrent mutation
    /// unless the queue was configured with `exact_size`.
    #[inline]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// True if the queue holds no elements (approximate, like
    /// [`len`](Self::len)).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// True if a push would currently be rejected (approximate, like
    /// [`len`](Self::len)).
    #[inline]
    pub fn is_full(&self) -> bool {
        self.backend.is_full()
    }

    /// Total slot count N.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    /// Number of elements the queue can hold: N - 1.
    #[inline]
    pub fn usable_capacity(&self) -> usize {
        self.backend.usable_capacity()
    }

    /// Operation counters (all zeroes unless configured with
    /// `enable_metrics`).
    pub fn metrics(&self) -> MetricsSnapshot {
        self.backend.metrics()
    }
}

impl<T> Queue<T, MultiProducerRing<T>> {
    /// Enqueues `value`, returning false if the queue is full. Never
    /// blocks; callable from any number of threads.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        self.backend.push(value)
    }
}

impl<T> Queue<T, SingleProducerRing<T>> {
    /// Claims the queue's single push handle.
    ///
    /// The handle can be claimed exactly once over the queue's lifetime;
    /// later calls return [`QueueError::ProducerAlreadyClaimed`]. Routing
    /// every push through one non-clonable handle is what upholds the
    /// backend's single-writer invariant on the write cursor.
    pub fn producer(&self) -> Result<Producer<T>, QueueError> {
        if self.backend.claim_producer() {
            Ok(Producer {
                ring: Arc::clone(&self.backend),
            })
        } else {
            Err(QueueError::ProducerAlreadyClaimed)
        }
    }
}

// Manual impl: a clone is a second handle to the same queue, which needs no
// `T: Clone`.
impl<T, B: Backend<T>> Clone for Queue<T, B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

/// The single push handle of a [`SingleProducerQueue`].
///
/// Intentionally not `Clone`: a second handle would let two threads race
/// the write cursor, which the wait-free push relies on never happening.
/// `push` takes `&mut self` so even a shared `Producer` cannot be pushed
/// through concurrently.
pub struct Producer<T> {
    ring: Arc<SingleProducerRing<T>>,
}

impl<T> Producer<T> {
    /// Enqueues `value`, returning false if the queue is full. Wait-free:
    /// no loop, a bounded number of steps.
    #[inline]
    pub fn push(&mut self, value: T) -> bool {
        self.ring.push(value)
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.ring.capacity())
            .finish_non_exhaustive()
    }
}

impl<T, B: Backend<T>> std::fmt::Debug for Queue<T, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_four_walkthrough() {
        // Usable capacity 3: three pushes fit, the fourth is rejected
        // until a pop frees a slot.
        let queue = MultiProducerQueue::with_capacity(4);
        assert_eq!(queue.usable_capacity(), 3);

        assert!(queue.push('A'));
        assert!(queue.push('B'));
        assert!(queue.push('C'));
        assert!(!queue.push('D'));

        assert_eq!(queue.pop(), Some('A'));
        assert!(queue.push('D'));

        assert_eq!(queue.pop(), Some('B'));
        assert_eq!(queue.pop(), Some('C'));
        assert_eq!(queue.pop(), Some('D'));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn single_producer_handle_is_exclusive() {
        let queue = SingleProducerQueue::<u32>::with_capacity(8);
        let mut producer = queue.producer().unwrap();
        assert_eq!(queue.producer().unwrap_err(), QueueError::ProducerAlreadyClaimed);

        assert!(producer.push(7));
        assert_eq!(queue.pop(), Some(7));
    }

    #[test]
    fn cloned_handles_share_the_queue() {
        let queue = MultiProducerQueue::with_capacity(8);
        let other = queue.clone();

        assert!(queue.push(1u64));
        assert_eq!(other.pop(), Some(1));
        assert_eq!(other.pop(), None);
    }

    #[test]
    fn pop_on_fresh_queue_returns_none_immediately() {
        let queue = SingleProducerQueue::<String>::with_capacity(16);
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
        assert!(!queue.is_full());
    }
}
