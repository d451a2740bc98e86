//! Property-based tests checking the queues against a reference model.
//!
//! Single-threaded: proptest drives arbitrary operation sequences and
//! capacities (power-of-two and not) and compares every outcome against a
//! `VecDeque` bounded to the same usable capacity. The threaded contracts
//! live in `integration_tests.rs`.

use proptest::prelude::*;
use ringq::{Config, MultiProducerQueue, SingleProducerQueue};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum Op {
    Push(u64),
    Pop,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u64>().prop_map(Op::Push),
        Just(Op::Pop),
    ]
}

proptest! {
    /// The multi-producer queue behaves exactly like a bounded deque when
    /// driven from one thread.
    #[test]
    fn multi_producer_matches_model(
        capacity in 2usize..64,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let queue = MultiProducerQueue::with_capacity(capacity);
        let usable = capacity - 1;
        let mut model: VecDeque<u64> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    let accepted = queue.push(v);
                    prop_assert_eq!(accepted, model.len() < usable,
                        "push accepted={} but model holds {}/{}", accepted, model.len(), usable);
                    if accepted {
                        model.push_back(v);
                    }
                }
                Op::Pop => {
                    prop_assert_eq!(queue.pop(), model.pop_front());
                }
            }
            prop_assert!(queue.len() <= usable);
            prop_assert_eq!(queue.is_empty(), model.is_empty());
        }

        // Drain and compare the tails.
        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(queue.pop(), Some(expected));
        }
        prop_assert_eq!(queue.pop(), None);
    }

    /// Same model check for the single-producer backend through its
    /// producer handle.
    #[test]
    fn single_producer_matches_model(
        capacity in 2usize..64,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let queue = SingleProducerQueue::with_capacity(capacity);
        let mut producer = queue.producer().unwrap();
        let usable = capacity - 1;
        let mut model: VecDeque<u64> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    let accepted = producer.push(v);
                    prop_assert_eq!(accepted, model.len() < usable);
                    if accepted {
                        model.push_back(v);
                    }
                }
                Op::Pop => {
                    prop_assert_eq!(queue.pop(), model.pop_front());
                }
            }
            prop_assert!(queue.len() <= usable);
        }

        while let Some(expected) = model.pop_front() {
            prop_assert_eq!(queue.pop(), Some(expected));
        }
        prop_assert_eq!(queue.pop(), None);
    }

    /// Exact-size accounting agrees with the model after every operation.
    #[test]
    fn exact_size_matches_model(
        capacity in 2usize..32,
        ops in prop::collection::vec(op_strategy(), 1..150),
    ) {
        let mut config = Config::new(capacity);
        config.exact_size = true;
        let queue: MultiProducerQueue<u64> = MultiProducerQueue::new(config);
        let mut model: VecDeque<u64> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(v) => {
                    if queue.push(v) {
                        model.push_back(v);
                    }
                }
                Op::Pop => {
                    prop_assert_eq!(queue.pop(), model.pop_front());
                }
            }
            prop_assert_eq!(queue.len(), model.len());
            prop_assert_eq!(queue.is_full(), model.len() == capacity - 1);
        }
    }

    /// The capacity bound holds for any fill level: usable slots accept
    /// pushes, the next one is rejected, and one pop reopens exactly one
    /// slot.
    #[test]
    fn capacity_bound_round_trip(capacity in 2usize..48) {
        let queue = MultiProducerQueue::with_capacity(capacity);

        for i in 0..capacity as u64 - 1 {
            prop_assert!(queue.push(i));
        }
        prop_assert!(!queue.push(u64::MAX));
        prop_assert!(queue.is_full());

        prop_assert_eq!(queue.pop(), Some(0));
        prop_assert!(queue.push(u64::MAX));
        prop_assert!(!queue.push(0));
    }
}
