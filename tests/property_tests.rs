//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations and verify that the
//! structural invariants of every queue hold after each step.

mod common;

use proptest::prelude::*;
use pq_engine::fibonacci::{max_degree_for, FibonacciHeap};
use pq_engine::fifo::FifoQueue;
use pq_engine::kary::IndexedKAryHeap;
use pq_engine::shared::SharedPartitionedHeap;
use pq_engine::storage::{SharedStorage, WorkerId};
use pq_engine::{Heap, HeapConfig};

const MAX_SIZE: usize = 64;

#[derive(Debug, Clone)]
enum Op {
    Push(usize, i32),
    Pop,
    Decrease(usize, i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..=MAX_SIZE, -1000i32..1000).prop_map(|(k, v)| Op::Push(k, v)),
        2 => Just(Op::Pop),
        2 => (1..=MAX_SIZE, 0i32..200).prop_map(|(k, d)| Op::Decrease(k, d)),
    ]
}

/// Applies `ops`, checking the minimum and size against a flat model after every step.
fn check_ops<H: Heap<i32>>(
    heap: &mut H,
    ops: &[Op],
    mut invariant: impl FnMut(&H) -> bool,
) -> Result<(), TestCaseError> {
    let mut model: Vec<Option<i32>> = vec![None; MAX_SIZE + 1];

    for op in ops {
        match *op {
            Op::Push(key, value) => {
                let accepted = heap.push(key, value);
                prop_assert_eq!(accepted, model[key].is_none());
                if accepted {
                    model[key] = Some(value);
                }
            }
            Op::Pop => {
                let popped = heap.pop();
                let expected = model.iter().flatten().min().copied();
                prop_assert_eq!(popped.map(|(_, v)| v), expected);
                if let Some((key, value)) = popped {
                    prop_assert_eq!(model[key].take(), Some(value));
                }
            }
            Op::Decrease(key, delta) => match model[key] {
                Some(current) => {
                    prop_assert!(heap.decrease_key(key, current - delta).is_ok());
                    model[key] = Some(current - delta);
                }
                None => prop_assert!(heap.decrease_key(key, 0).is_err()),
            },
        }

        prop_assert!(invariant(&*heap));
        prop_assert_eq!(heap.len(), model.iter().flatten().count());
        prop_assert_eq!(
            heap.peek().map(|(_, v)| v),
            model.iter().flatten().min().copied()
        );
    }
    Ok(())
}

fn pop_all<H: Heap<i32>>(heap: &mut H) -> Vec<i32> {
    std::iter::from_fn(|| heap.pop()).map(|(_, v)| v).collect()
}

proptest! {
    #[test]
    fn test_kary_invariants(
        k in 2usize..9,
        ops in prop::collection::vec(op_strategy(), 0..200)
    ) {
        let mut heap = IndexedKAryHeap::new(HeapConfig::new(MAX_SIZE).branching_factor(k)).unwrap();
        check_ops(&mut heap, &ops, |h| h.verify_heap_order() && h.verify_reverse_index())?;
    }

    #[test]
    fn test_fibonacci_invariants(ops in prop::collection::vec(op_strategy(), 0..200)) {
        let mut heap = FibonacciHeap::new(HeapConfig::new(MAX_SIZE)).unwrap();
        check_ops(&mut heap, &ops, |h| {
            h.verify_structure() && h.max_degree() <= max_degree_for(h.len()) + 1
        })?;
    }

    #[test]
    fn test_kary_pop_order(
        k in 2usize..9,
        values in prop::collection::vec(-1000i32..1000, 1..=MAX_SIZE)
    ) {
        let mut heap = IndexedKAryHeap::new(HeapConfig::new(MAX_SIZE).branching_factor(k)).unwrap();
        for (i, &value) in values.iter().enumerate() {
            prop_assert!(heap.push(i + 1, value));
        }
        let mut sorted = values.clone();
        sorted.sort_unstable();
        prop_assert_eq!(pop_all(&mut heap), sorted);
    }

    #[test]
    fn test_fibonacci_pop_order(values in prop::collection::vec(-1000i32..1000, 1..=MAX_SIZE)) {
        let mut heap = FibonacciHeap::new(HeapConfig::new(MAX_SIZE)).unwrap();
        for (i, &value) in values.iter().enumerate() {
            prop_assert!(heap.push(i + 1, value));
        }
        let mut sorted = values.clone();
        sorted.sort_unstable();
        prop_assert_eq!(pop_all(&mut heap), sorted);
    }

    #[test]
    fn test_decrease_key_preserves_size(
        values in prop::collection::vec(0i32..1000, 1..=MAX_SIZE),
        decreases in prop::collection::vec((0usize..MAX_SIZE, 0i32..1000), 0..50)
    ) {
        let mut kary = IndexedKAryHeap::new(HeapConfig::new(MAX_SIZE)).unwrap();
        let mut fib = FibonacciHeap::new(HeapConfig::new(MAX_SIZE)).unwrap();
        for (i, &value) in values.iter().enumerate() {
            kary.push(i + 1, value);
            fib.push(i + 1, value);
        }
        for (i, delta) in decreases {
            let key = i % values.len() + 1;
            let lowered = kary.get(key).unwrap() - delta;
            kary.decrease_key(key, lowered).unwrap();
            fib.decrease_key(key, lowered).unwrap();
            prop_assert_eq!(kary.get(key), Some(lowered));
        }
        prop_assert_eq!(kary.len(), values.len());
        prop_assert_eq!(fib.len(), values.len());
        prop_assert!(fib.verify_structure());
        prop_assert_eq!(pop_all(&mut kary), pop_all(&mut fib));
    }

    #[test]
    fn test_capacity_boundary(max_size in 1usize..40, extra in 1usize..10) {
        let mut kary = IndexedKAryHeap::new(HeapConfig::new(max_size).branching_factor(3)).unwrap();
        let mut fib = FibonacciHeap::new(HeapConfig::new(max_size)).unwrap();
        for key in 1..=max_size {
            prop_assert!(kary.push(key, key as i32));
            prop_assert!(fib.push(key, key as i32));
        }
        prop_assert!(!kary.push(max_size + extra, 0));
        prop_assert!(!fib.push(max_size + extra, 0));
        prop_assert_eq!(kary.len(), max_size);
        prop_assert_eq!(fib.len(), max_size);
    }

    #[test]
    fn test_fifo_preserves_order(
        capacity in 1usize..32,
        values in prop::collection::vec(any::<u16>(), 0..64)
    ) {
        let mut queue = FifoQueue::new(capacity, u16::MAX).unwrap();
        let accepted = queue.push_slice(&values);
        prop_assert_eq!(accepted, values.len().min(capacity));
        let drained: Vec<u16> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(&drained[..], &values[..accepted]);
        prop_assert!(queue.is_empty());
    }
}

proptest! {
    #[test]
    fn test_kary_modify_in_both_directions(
        k in 2usize..9,
        values in prop::collection::vec(-1000i32..1000, 1..=MAX_SIZE),
        updates in prop::collection::vec((0usize..MAX_SIZE, -2000i32..2000), 0..100)
    ) {
        let mut heap = IndexedKAryHeap::new(HeapConfig::new(MAX_SIZE).branching_factor(k)).unwrap();
        for (i, &value) in values.iter().enumerate() {
            heap.push(i + 1, value);
        }
        let mut expected = values.clone();
        for (i, value) in updates {
            let key = i % values.len() + 1;
            heap.modify(key, value).unwrap();
            expected[key - 1] = value;
            prop_assert_eq!(heap.get(key), Some(value));
            prop_assert_eq!(heap.len(), values.len());
            prop_assert!(heap.verify_heap_order());
            prop_assert!(heap.verify_reverse_index());
        }
        expected.sort_unstable();
        prop_assert_eq!(pop_all(&mut heap), expected);
    }

    #[test]
    fn test_shared_column_modify_in_both_directions(
        k in 2usize..9,
        worker in 0usize..3,
        values in prop::collection::vec(-1000i32..1000, 1..=MAX_SIZE),
        updates in prop::collection::vec((0usize..MAX_SIZE, -2000i32..2000), 0..100)
    ) {
        let storage = SharedStorage::new(MAX_SIZE, 3).unwrap();
        let config = HeapConfig::new(MAX_SIZE).branching_factor(k);
        let mut heap = SharedPartitionedHeap::new(config, storage).unwrap();
        let w = WorkerId(worker);
        for (i, &value) in values.iter().enumerate() {
            heap.push(w, i + 1, value);
        }
        for (i, value) in updates {
            let key = i % values.len() + 1;
            heap.decrease_key(w, key, value).unwrap();
            prop_assert_eq!(heap.get(w, key), Some(value));
            prop_assert_eq!(heap.len(w), values.len());
            prop_assert!(heap.verify_column(w));
        }
        prop_assert_eq!(heap.total_len(), values.len());
    }
}
