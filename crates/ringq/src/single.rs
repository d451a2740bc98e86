use crate::invariants::{debug_assert_bounded, debug_assert_cursor_order, debug_assert_monotonic};
use crate::metrics::Metrics;
use crate::slots::SlotArray;
use crate::{Config, MetricsSnapshot};
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

// =============================================================================
// SYNCHRONIZATION STRATEGY
// =============================================================================
//
// One producer thread, any number of consumer threads. Two cursors:
//
// - `write`: written only by the producer. Because there is no gap between
//   storing an element and publishing it, `write` doubles as the commit
//   boundary that the multi-producer backend needs a third cursor for.
// - `read`: advanced by whichever consumer wins a CAS claim.
//
// Cursors are unbounded u64 sequence numbers; the slot index is computed as
// `cursor mod N` only at access time. At one push per nanosecond the
// counter wraps after ~584 years, so wrap-around (and with it the classic
// ABA window and the original 32-bit design's capacity distortion for
// non-power-of-two N) is out of reach.
//
// Ordering protocol:
//
// - Producer: load own `write` Relaxed, load `read` Acquire (synchronizes
//   with consumer claims so freed slots are seen), write the slot, store
//   `write + 1` Release (publishes the slot bytes).
// - Consumer: load `read` Relaxed, load `write` Acquire (synchronizes with
//   the producer's Release publish), copy the slot bytes, CAS `read`
//   Release (publishes the claim so the producer may reuse the slot).
//
// Push is wait-free: no loop, a bounded number of steps. Pop is lock-free:
// a consumer only repeats its loop when another consumer claimed the
// element first, i.e. when the system as a whole made progress.
// =============================================================================

/// Single-producer backend: wait-free push, lock-free shared pop.
///
/// Push access is restricted to one thread via the facade's
/// [`Producer`](crate::Producer) handle; pop may be called from any number
/// of threads concurrently.
pub struct SingleProducerRing<T> {
    /// Next cursor to be written. Only the producer stores to it.
    write: CachePadded<AtomicU64>,
    /// Next cursor to be read. CAS-claimed by consumers.
    read: CachePadded<AtomicU64>,
    /// Exact element count, maintained only in `exact_size` mode.
    count: AtomicUsize,
    /// Whether the single push handle has been handed out.
    producer_claimed: AtomicBool,
    metrics: Metrics,
    config: Config,
    slots: SlotArray<T>,
}

// Safety: slot access is serialized by the cursor protocol above; all other
// shared state is atomic.
unsafe impl<T: Send> Send for SingleProducerRing<T> {}
unsafe impl<T: Send> Sync for SingleProducerRing<T> {}

impl<T> SingleProducerRing<T> {
    pub(crate) fn with_config(config: Config) -> Self {
        Self {
            write: CachePadded::new(AtomicU64::new(0)),
            read: CachePadded::new(AtomicU64::new(0)),
            count: AtomicUsize::new(0),
            producer_claimed: AtomicBool::new(false),
            metrics: Metrics::new(),
            config,
            slots: SlotArray::new(config.capacity()),
        }
    }

    /// Claims the single push handle. Returns false if already claimed.
    pub(crate) fn claim_producer(&self) -> bool {
        self.producer_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Wait-free push. Returns false if the queue is full.
    ///
    /// Must only be called by the thread holding the producer handle.
    pub(crate) fn push(&self, value: T) -> bool {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        debug_assert_cursor_order!(read, write, write);

        if write.wrapping_sub(read) as usize >= self.slots.usable_capacity() {
            if self.config.enable_metrics {
                self.metrics.add_full_rejection();
            }
            return false;
        }

        // SAFETY: the slot at `write` is outside [read, write), so no
        // consumer considers it readable, and this thread is the only
        // producer. Its previous occupant was moved out when `read` passed
        // this cursor a full lap ago.
        unsafe {
            self.slots.write(self.slots.index(write), value);
        }

        if self.config.exact_size {
            // Incremented before the publish below so the counter can never
            // lag behind a visible element (a consumer that pops it would
            // otherwise drive the count negative).
            self.count.fetch_add(1, Ordering::Relaxed);
        }

        let new_write = write.wrapping_add(1);
        debug_assert_monotonic!("write", write, new_write);
        // Release: a consumer that acquire-loads the new cursor value is
        // guaranteed to see the slot bytes (and the count increment).
        self.write.store(new_write, Ordering::Release);

        if self.config.enable_metrics {
            self.metrics.add_push();
        }
        true
    }

    /// Lock-free pop, shared by any number of consumers. Returns `None` if
    /// the queue is empty.
    pub(crate) fn pop(&self) -> Option<T> {
        loop {
            let read = self.read.load(Ordering::Relaxed);
            // `write` is the commit boundary: every cursor below it has
            // fully published slot bytes.
            let write = self.write.load(Ordering::Acquire);

            if write.wrapping_sub(read) == 0 {
                if self.config.enable_metrics {
                    self.metrics.add_empty_pop();
                }
                return None;
            }

            // Copy the slot bytes before claiming. If the CAS below fails
            // the element belongs to the winning consumer and the copy is
            // discarded without ever being treated as a T.
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
                // SAFETY: this thread now exclusively owns cursor `read`,
                // and the acquire load of `write` above synchronized with
                // the producer's publishing store for this slot.
                return Some(unsafe { bytes.assume_init() });
            }
            // Lost the claim race; retry from a fresh snapshot.
        }
    }

    /// Current number of elements.
    ///
    /// Without `exact_size` this is a snapshot of two independently moving
    /// cursors: under concurrent mutation the result may be stale by the
    /// time it returns. It is always within `0..=usable_capacity()`.
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

impl<T> Drop for SingleProducerRing<T> {
    fn drop(&mut self) {
        // Elements still resident between the cursors are dropped here;
        // everything else was moved out by pop.
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Relaxed);
        debug_assert_bounded!(
            write.wrapping_sub(read) as usize,
            self.slots.usable_capacity()
        );
        let count = write.wrapping_sub(read) as usize;
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

    fn ring(capacity: usize) -> SingleProducerRing<u64> {
        SingleProducerRing::with_config(Config::new(capacity))
    }

    #[test]
    fn push_pop_round_trip() {
        let q = ring(8);
        assert!(q.push(10));
        assert!(q.push(20));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(10));
        assert_eq!(q.pop(), Some(20));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn rejects_push_at_usable_capacity() {
        let q = ring(4);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert!(q.is_full());
        assert!(!q.push(4));
        // One pop frees exactly one slot.
        assert_eq!(q.pop(), Some(1));
        assert!(q.push(4));
        assert!(!q.push(5));
    }

    #[test]
    fn cursors_keep_working_across_many_laps() {
        let q = ring(3);
        for lap in 0..1_000u64 {
            assert!(q.push(lap));
            assert!(q.push(lap + 1));
            assert_eq!(q.pop(), Some(lap));
            assert_eq!(q.pop(), Some(lap + 1));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn non_power_of_two_capacity_round_trips() {
        let q = ring(5);
        for i in 0..4u64 {
            assert!(q.push(i));
        }
        assert!(!q.push(99));
        for i in 0..4u64 {
            assert_eq!(q.pop(), Some(i));
        }
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn exact_size_tracks_every_operation() {
        let mut config = Config::new(8);
        config.exact_size = true;
        let q = SingleProducerRing::<u64>::with_config(config);

        assert_eq!(q.len(), 0);
        for i in 0..7 {
            assert!(q.push(i));
        }
        assert_eq!(q.len(), 7);
        assert!(q.is_full());
        assert!(!q.push(7));
        assert_eq!(q.len(), 7);

        while q.pop().is_some() {}
        assert_eq!(q.len(), 0);
        assert!(q.is_empty());
    }

    #[test]
    fn producer_handle_claimed_once() {
        let q = ring(4);
        assert!(q.claim_producer());
        assert!(!q.claim_producer());
    }

    #[test]
    fn metrics_count_outcomes() {
        let mut config = Config::new(4);
        config.enable_metrics = true;
        let q = SingleProducerRing::<u64>::with_config(config);

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
        assert_eq!(m.pops, 3);
        assert_eq!(m.full_rejections, 1);
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
            let q = SingleProducerRing::with_config(Config::new(8));
            for _ in 0..5 {
                assert!(q.push(Tracked));
            }
            drop(q.pop()); // one dropped by the caller
            assert_eq!(DROPS.load(Ordering::SeqCst), 1);
        }
        // The four still resident are released at teardown.
        assert_eq!(DROPS.load(Ordering::SeqCst), 5);
    }
}
