use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe operation counters, updated only when
/// `Config::enable_metrics` is set.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    pushes: AtomicU64,
    pops: AtomicU64,
    full_rejections: AtomicU64,
    empty_pops: AtomicU64,
    reserve_retries: AtomicU64,
    commit_retries: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_push(&self) {
        self.pushes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_pop(&self) {
        self.pops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_full_rejection(&self) {
        self.full_rejections.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_empty_pop(&self) {
        self.empty_pops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_reserve_retry(&self) {
        self.reserve_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_commit_retry(&self) {
        self.commit_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pushes: self.pushes.load(Ordering::Relaxed),
            pops: self.pops.load(Ordering::Relaxed),
            full_rejections: self.full_rejections.load(Ordering::Relaxed),
            empty_pops: self.empty_pops.load(Ordering::Relaxed),
            reserve_retries: self.reserve_retries.load(Ordering::Relaxed),
            commit_retries: self.commit_retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a queue's operation counters.
///
/// All zeroes when metrics collection is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful pushes.
    pub pushes: u64,
    /// Successful pops.
    pub pops: u64,
    /// Pushes rejected because the queue was full.
    pub full_rejections: u64,
    /// Pops that found the queue empty.
    pub empty_pops: u64,
    /// Reservation CAS retries (multi-producer backend).
    pub reserve_retries: u64,
    /// Commit CAS retries while waiting on earlier reservations
    /// (multi-producer backend).
    pub commit_retries: u64,
}
