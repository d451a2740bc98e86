//! ringq-consumer - Blocking and Background-Thread Companions for ringq
//!
//! The lock-free queues in `ringq` never block and never sleep; this crate
//! holds the pieces for callers that want to:
//!
//! - [`BlockingQueue`]: a mutex/condvar queue with blocking, non-blocking
//!   and timed push/pop, for threads that would rather sleep than poll.
//! - [`ConsumerThread`]: a background thread that drains a queue through a
//!   per-item callback, waking on a short timeout to check for shutdown.
//!   Works over its own [`BlockingQueue`] or over any shared source
//!   implementing [`TimedPoll`] — including the `ringq` queues, which it
//!   polls with backoff.
//! - [`VirtualTimer`]: a periodic callback driven by externally supplied
//!   timestamps, for systems that already own a time loop.
//!
//! # Example
//!
//! ```
//! use ringq_consumer::ConsumerThread;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let sum = Arc::new(AtomicU32::new(0));
//! let sink = Arc::clone(&sum);
//!
//! let consumer = ConsumerThread::new(move |v: u32| {
//!     sink.fetch_add(v, Ordering::Relaxed);
//! });
//!
//! for i in 1..=10 {
//!     consumer.produce_blocking(i);
//! }
//! # while sum.load(Ordering::Relaxed) < 55 { std::thread::yield_now(); }
//! consumer.join();
//! assert_eq!(sum.load(Ordering::Relaxed), 55);
//! ```

mod blocking;
mod consumer;
mod timer;

pub use blocking::{BlockingQueue, Full};
pub use consumer::{ConsumerThread, TimedPoll};
pub use timer::VirtualTimer;
