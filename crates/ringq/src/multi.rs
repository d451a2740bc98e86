use crate::backoff::Backoff;
use crate::invariants::{debug_assert_bounded, debug_assert_cursor_order, debug_assert_monotonic};
use crate::metrics::Metrics;
use crate::slots::SlotArray;
use crate::{Config, MetricsSnapshot};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// =============================================================================
// SYNCHRONIZATION STRATEGY
// =============================================================================
//
// Any number of producer threads, any number of consumer threads. Three
// cursors instead of the single-producer backend's two:
//
// - `write`: the reservation cursor. A producer CAS-claims one value of it,
//   which grants exclusive ownership of the mapped slot.
// - `committed`: the publication boundary. It trails `write` while
//   reservations are being filled in and advances strictly in reservation
//   order. Consumers read only below it.
// - `read`: CAS-claimed by consumers, exactly as in the single-producer
//   backend.
//
// A single shared write cursor cannot do both jobs: it has to serialize
// slot allocation among producers *and* tell consumers that data is
// actually present, but for each producer those are two separate steps
// (reserve, then store). `committed` closes that gap: a slot becomes
// readable only after its bytes are in place, and never before every
// earlier reservation has also published.
//
// Invariant: read <= committed <= write, with write - read <= N - 1.
//
// Ordering protocol:
//
// - Reservation CAS on `write` is Relaxed — it only arbitrates ownership;
//   no data is published through it.
// - Commit CAS on `committed` is Release — it publishes the slot bytes to
//   consumers, which gate on an Acquire load of `committed`.
// - `read` claims are Release, as in the single-producer backend.
//
// Push is lock-free but not wait-free: both CAS loops can retry under
// contention (the commit loop until every earlier producer has published).
// The retry wait is the configured BackoffPolicy rather than a hardwired
// yield.
// =============================================================================

/// Multi-producer backend: contended two-phase push (reserve, then publish
/// in reservation order), lock-free shared pop.
pub struct MultiProducerRing<T> {
    /// Reservation cursor, CAS-claimed by producers.
    write: CachePadded<AtomicU64>,
    /// Publication boundary; trails `write`, advances in reservation order.
    committed: CachePadded<AtomicU64>,
    /// Next cursor to be read, CAS-claimed by consumers.
    read: CachePadded<AtomicU64>,
    /// Exact element count, maintained only in `exact_size` mode.
    count: AtomicUsize,
    metrics: Metrics,
    config: Config,
    slots: SlotArray<T>,
}

// Safety: slot access is serialized by the reservation/commit protocol
// above; all other shared state is atomic.
unsafe impl<T: Send> Send for MultiProducerRing<T> {}
unsafe impl<T: Send> Sync for MultiProducerRing<T> {}

impl<T> MultiProducerRing<T> {
    pub(crate) fn with_config(config: Config) -> Self {
        Self {
            write: CachePadded::new(AtomicU64::new(0)),
            committed: CachePadded::new(AtomicU64::new(0)),
            read: CachePadded::new(AtomicU64::new(0)),
            count: AtomicUsize::new(0),
            metrics: Metrics::new(),
            config,
            slots: SlotArray::new(config.capacity()),
        }
    }

    /// Lock-free push from any thread. Returns false if the queue is full.
    pub(crate) fn push(&self, value: T) -> bool {
        let mut backoff = Backoff::new(self.config.backoff);

        // Phase 1: reserve a cursor. Losing the CAS means another producer
        // claimed this cursor value; re-check fullness and try the next.
        let reserved = loop {
            let write = self.write.load(Ordering::Relaxed);
            let read = self.read.load(Ordering::Acquire);

            if write.wrapping_sub(read) as usize >= self.slots.usable_capacity() {
                if self.config.enable_metrics {
                    self.metrics.add_full_rejection();
                }
                return false;
            }

            // Relaxed: the CAS only arbitrates which producer owns this
            // cursor value. Publication happens on `committed` below.
            match self.write.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break write,
                Err(_) => {
                    if self.config.enable_metrics {
                        self.metrics.add_reserve_retry();
                    }
                    backoff.wait();
                }
            }
        };

        // SAFETY: this thread exclusively owns cursor `reserved`. Live
        // cursors span less than one full lap of the ring (write - read
        // <= N - 1), so no other reservation maps to this slot, and no
        // consumer reads it until `committed` passes it.
        unsafe {
            self.slots.write(self.slots.index(reserved), value);
        }

        if self.config.exact_size {
            // Before the publish below, so the counter can never lag behind
            // a visible element.
            self.count.fetch_add(1, Ordering::Relaxed);
        }

        // Phase 2: publish. The CAS can only succeed when `committed` has
        // reached our reservation, i.e. once every earlier reservation has
        // published — commits become visible in reservation order, never
        // out of order.
        backoff.reset();
        let published = reserved.wrapping_add(1);
        debug_assert_monotonic!("committed", reserved, published);
        while self
            .committed
            .compare_exchange(reserved, published, Ordering::Release, Ordering::Relaxed)
            .is_err()
        {
            if self.config.enable_metrics {
                self.metrics.add_commit_retry();
            }
            backoff.wait();
        }

        if self.config.enable_metrics {
            self.metrics.add_push();
        }
        true
    }

    /// Lock-free pop, shared by any number of consumers. Returns `None` if
    /// the queue is empty or every pending element is still reserved but
    /// not yet published.
    pub(crate) fn pop(&self) -> Option<T> {
        loop {
            let read = self.read.load(Ordering::Relaxed);
            // Gate on `committed`, never on `write`: a reserved slot whose
            // bytes are still being written must not be read.
            let committed = self.committed.load(Ordering::Acquire);
            debug_assert_cursor_order!(read, committed, self.write.load(Ordering::Relaxed));

            if committed.wrapping_sub(read) == 0 {
                if self.config.enable_metrics {
                    self.metrics.add_empty_pop();
                }
                return None;
            }

            // Copy the slot bytes before claiming; a lost claim discards
            // the copy without ever treating it as a T.
            let bytes = unsafe { self.slots.read_speculative(self.slots.index(read)) };

            if self
                .read
                .compare_exchange(
                    read,
                    read.wrapping_add(1),
                    Ordering::Release,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                if self.config.exact_size {
                    self.count.fetch_sub(1, Ordering::Relaxed);
                }
                if self.config.enable_metrics {
                    self.metrics.add_pop();
                }
                // SAFETY: exclusive owner of cursor `read`; the acquire
                // load of `committed` synchronized with the publishing
                // producer's Release commit for this slot.
                return Some(unsafe { bytes.assume_init() });
            }
            // Another consumer claimed this element first; retry.
        }
    }

    /// Current number of elements.
    ///
    /// Without `exact_size` this snapshots the reservation and read
    /// cursors, so elements that are reserved but not yet published are
    /// counted (matching the push-side fullness check) and the result may
    /// be stale under concurrent mutation. Always within
    /// `0..=usable_capacity()`.
    pub(crate) fn len(&self) -> usize {
        if self.config.exact_size {
            return self.count.load(Ordering::Relaxed);
        }
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Relaxed);
        (write.wrapping_sub(read) as usize).min(self.slots.usable_capacity())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if a push would currently be rejected. Approximate under the
    /// same conditions as [`len`](Self::len).
    pub(crate) fn is_full(&self) -> bool {
        self.len() == self.slots.usable_capacity()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    #[inline]
    pub(crate) fn usable_capacity(&self) -> usize {
        self.slots.usable_capacity()
    }

    pub(crate) fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl<T> Drop for MultiProducerRing<T> {
    fn drop(&mut self) {
        // Only published elements are guaranteed initialized. A producer
        // that panicked between reserving and committing leaks its one
        // element rather than risking a drop of half-written bytes.
        let read = self.read.load(Ordering::Relaxed);
        let committed = self.committed.load(Ordering::Relaxed);
        debug_assert_bounded!(
            committed.wrapping_sub(read) as usize,
            self.slots.usable_capacity()
        );
        let count = committed.wrapping_sub(read) as usize;
        if count > 0 {
            unsafe {
                self.slots.drop_range(read, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(capacity: usize) -> MultiProducerRing<u64> {
        MultiProducerRing::with_config(Config::new(capacity))
    }

    #[test]
    fn push_pop_round_trip() {
        let q = ring(8);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn rejects_push_at_usable_capacity() {
        let q = ring(4);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert!(q.is_full());
        assert!(!q.push(4));
        assert_eq!(q.pop(), Some(1));
        assert!(q.push(4));
    }

    #[test]
    fn cursors_keep_working_across_many_laps() {
        let q = ring(3);
        for lap in 0..1_000u64 {
            assert!(q.push(lap));
            assert_eq!(q.pop(), Some(lap));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn non_power_of_two_capacity_round_trips() {
        let q = ring(7);
        for i in 0..6u64 {
            assert!(q.push(i));
        }
        assert!(!q.push(99));
        for i in 0..6u64 {
            assert_eq!(q.pop(), Some(i));
        }
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn exact_size_never_exceeds_usable() {
        let mut config = Config::new(6);
        config.exact_size = true;
        let q = MultiProducerRing::<u64>::with_config(config);

        for i in 0..5 {
            assert!(q.push(i));
            assert!(q.len() <= q.usable_capacity());
        }
        assert!(q.is_full());
        assert!(!q.push(5));
        assert_eq!(q.len(), 5);

        while q.pop().is_some() {}
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn metrics_count_outcomes() {
        let mut config = Config::new(4);
        config.enable_metrics = true;
        let q = MultiProducerRing::<u64>::with_config(config);

        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert!(!q.push(4));
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), None);

        let m = q.metrics();
        assert_eq!(m.pushes, 3);
        assert_eq!(m.full_rejections, 1);
        assert_eq!(m.pops, 3);
        assert_eq!(m.empty_pops, 1);
    }

    #[test]
    fn drops_resident_elements_on_teardown() {
        use std::sync::atomic::AtomicUsize;

        static DROPS: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROPS.store(0, Ordering::SeqCst);
        {
            let q = MultiProducerRing::with_config(Config::new(8));
            for _ in 0..6 {
                assert!(q.push(Tracked));
            }
            drop(q.pop());
            drop(q.pop());
            assert_eq!(DROPS.load(Ordering::SeqCst), 2);
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 6);
    }
}
