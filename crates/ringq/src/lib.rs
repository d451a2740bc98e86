//! ringq - Fixed-Capacity Array-Backed Lock-Free Queue
//!
//! A circular-array queue that never takes a lock: all coordination happens
//! through atomic cursors. Two backends share the same storage and facade:
//!
//! - **Single-producer** ([`SingleProducerQueue`]): exactly one thread
//!   pushes (wait-free — no retry loop at all), any number of threads pop.
//! - **Multi-producer** ([`MultiProducerQueue`]): any number of threads
//!   push via a two-phase reserve/commit protocol, any number pop.
//!
//! The backend is chosen at compile time through the [`Queue`] type
//! parameter, so the hot paths are statically dispatched.
//!
//! # Key properties
//!
//! - Capacity fixed at construction; a queue over N slots holds N - 1
//!   elements (one slot stays empty so full and empty are distinguishable)
//! - `push`/`pop` return immediately — full and empty are ordinary
//!   outcomes, not errors, and nothing ever blocks or parks
//! - Acquire/release cursor discipline: an element's bytes are visible to
//!   any consumer that observes the cursor advance
//! - Pluggable backoff for the multi-producer retry loops
//!   ([`BackoffPolicy`]), optional exact size accounting and operation
//!   counters ([`Config`])
//!
//! # Example
//!
//! ```
//! use ringq::MultiProducerQueue;
//! use std::thread;
//!
//! let queue = MultiProducerQueue::with_capacity(128);
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|p| {
//!         let q = queue.clone();
//!         thread::spawn(move || {
//!             for i in 0..10u64 {
//!                 while !q.push(p * 100 + i) {}
//!             }
//!         })
//!     })
//!     .collect();
//! for h in handles {
//!     h.join().unwrap();
//! }
//!
//! let mut drained = 0;
//! while queue.pop().is_some() {
//!     drained += 1;
//! }
//! assert_eq!(drained, 40);
//! ```

mod backoff;
mod config;
mod invariants;
mod metrics;
mod multi;
mod queue;
mod single;
mod slots;

pub use backoff::{Backoff, BackoffPolicy};
pub use config::Config;
pub use metrics::MetricsSnapshot;
pub use multi::MultiProducerRing;
pub use queue::{
    Backend, MultiProducerQueue, Producer, Queue, QueueError, SingleProducerQueue,
};
pub use single::SingleProducerRing;
