//! Demo wiring the pieces together: producers push into a lock-free
//! multi-producer queue, a consumer thread drains it through a callback,
//! and a virtual timer reports progress on a simulated clock.
//!
//! Run with: `cargo run --bin demo`

use ringq::MultiProducerQueue;
use ringq_consumer::{ConsumerThread, VirtualTimer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let queue: MultiProducerQueue<u64> = MultiProducerQueue::with_capacity(256);
    let consumed = Arc::new(AtomicU64::new(0));

    // Background consumer draining the lock-free queue via TimedPoll.
    let sink = Arc::clone(&consumed);
    let consumer = ConsumerThread::over(Arc::new(queue.clone()), move |_v: u64| {
        sink.fetch_add(1, Ordering::Relaxed);
    });

    // Three producers pushing disjoint ranges.
    let producers: Vec<_> = (0..3u64)
        .map(|p| {
            let q = queue.clone();
            thread::spawn(move || {
                for i in 0..1_000 {
                    while !q.push(p * 1_000 + i) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    // A virtual timer on a simulated millisecond clock, reporting once per
    // simulated second while the consumer catches up.
    let progress = Arc::clone(&consumed);
    let mut reporter = VirtualTimer::new(1_000u64, move |now| {
        info!(
            simulated_ms = now,
            consumed = progress.load(Ordering::Relaxed),
            "progress"
        );
    });

    let mut clock = 0u64;
    reporter.update(clock);
    while consumed.load(Ordering::Relaxed) < 3_000 {
        thread::sleep(Duration::from_millis(1));
        clock += 100;
        reporter.update(clock);
    }

    consumer.join();
    info!(total = consumed.load(Ordering::Relaxed), "done");
}
