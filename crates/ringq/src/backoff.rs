use std::hint;
use std::thread;

/// How a contended retry loop waits before trying again.
///
/// The multi-producer backend retries in two places: when losing a
/// reservation race, and when waiting for earlier reservations to publish
/// before its own commit can go through. The right way to wait depends on
/// the deployment: a real-time thread must not make yield syscalls, while a
/// heavily oversubscribed host wants to give the core away quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPolicy {
    /// Busy-spin with PAUSE hints only. Never yields to the OS.
    Spin,
    /// Yield to the OS scheduler on every retry.
    Yield,
    /// Spin with exponentially increasing pause counts, then start
    /// yielding (Crossbeam-style progression).
    #[default]
    Adaptive,
}

/// Driver for a single wait cycle under a [`BackoffPolicy`].
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    step: u32,
}

impl Backoff {
    const SPIN_LIMIT: u32 = 6; // 2^6 = 64 spins max before yielding

    /// Creates a new backoff instance for one wait cycle.
    #[inline]
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy, step: 0 }
    }

    /// Waits once, escalating according to the policy.
    #[inline]
    pub fn wait(&mut self) {
        match self.policy {
            BackoffPolicy::Spin => self.spin(),
            BackoffPolicy::Yield => thread::yield_now(),
            BackoffPolicy::Adaptive => {
                if self.step <= Self::SPIN_LIMIT {
                    self.spin();
                } else {
                    thread::yield_now();
                }
            }
        }
    }

    /// Light spin with PAUSE hints, doubling up to the spin limit.
    #[inline]
    fn spin(&mut self) {
        let spins = 1 << self.step.min(Self::SPIN_LIMIT);
        for _ in 0..spins {
            hint::spin_loop();
        }
        if self.step <= Self::SPIN_LIMIT {
            self.step += 1;
        }
    }

    /// Reset for the next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}
