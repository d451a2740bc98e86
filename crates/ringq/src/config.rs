use crate::BackoffPolicy;

/// Configuration for a queue, fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Total slot count N. One slot is always kept empty, so the queue
    /// holds at most N - 1 elements.
    capacity: usize,
    /// Maintain an exact element counter instead of snapshotting cursors.
    ///
    /// `len()` and `is_full()` are otherwise approximate under concurrent
    /// mutation; the counter makes them reliable at a throughput cost on
    /// every push and pop.
    pub exact_size: bool,
    /// Collect operation counters (slight overhead).
    pub enable_metrics: bool,
    /// How contended retry loops wait (multi-producer backend only).
    pub backoff: BackoffPolicy,
}

impl Config {
    /// Default slot count (64K slots).
    pub const DEFAULT_CAPACITY: usize = 65_536;

    /// Creates a configuration with the given total slot count.
    ///
    /// The capacity does not need to be a power of two; non-power-of-two
    /// capacities use a genuine modulo for slot indexing. Usable capacity
    /// is always `capacity - 1`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2` — with one slot permanently empty, a
    /// smaller queue could never hold an element.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 2,
            "queue capacity must be at least 2 (one slot is always kept empty)"
        );
        Self {
            capacity,
            exact_size: false,
            enable_metrics: false,
            backoff: BackoffPolicy::default(),
        }
    }

    /// Returns the total slot count N.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of elements the queue can actually hold, N - 1.
    #[inline]
    pub const fn usable_capacity(&self) -> usize {
        self.capacity - 1
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
