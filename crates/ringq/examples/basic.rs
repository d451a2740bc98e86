//! Basic usage of both queue backends.
//!
//! Run with: `cargo run --example basic`

use ringq::{MultiProducerQueue, SingleProducerQueue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

fn main() {
    // Single producer, two consumers. Push goes through the one handle.
    let queue = SingleProducerQueue::with_capacity(64);
    let mut producer = queue.producer().expect("first claim");
    let remaining = Arc::new(AtomicU64::new(20));

    let consumers: Vec<_> = (0..2)
        .map(|id| {
            let q = queue.clone();
            let remaining = Arc::clone(&remaining);
            thread::spawn(move || {
                while remaining.load(Ordering::Relaxed) > 0 {
                    if let Some(v) = q.pop() {
                        println!("consumer {id} got {v}");
                        remaining.fetch_sub(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    for i in 0..20u64 {
        while !producer.push(i) {
            thread::yield_now();
        }
    }
    for c in consumers {
        c.join().unwrap();
    }

    // Multiple producers, draining on the main thread.
    let queue = MultiProducerQueue::with_capacity(64);
    let producers: Vec<_> = (0..3)
        .map(|p| {
            let q = queue.clone();
            thread::spawn(move || {
                for i in 0..5u64 {
                    while !q.push(p * 100 + i) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();
    for p in producers {
        p.join().unwrap();
    }

    let mut drained = Vec::new();
    while let Some(v) = queue.pop() {
        drained.push(v);
    }
    println!("drained {} values: {drained:?}", drained.len());
}
