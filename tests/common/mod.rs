//! Helpers shared by the integration test binaries

#![allow(dead_code)]

use pq_engine::fibonacci::FibonacciHeap;
use pq_engine::kary::IndexedKAryHeap;
use pq_engine::shared::{Partition, SharedPartitionedHeap};
use pq_engine::storage::{SharedStorage, WorkerId};
use pq_engine::HeapConfig;

/// Routes `log` output through the test harness; `RUST_LOG=trace` shows heap internals.
#[ctor::ctor]
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const CAPACITY: usize = 128;

pub fn run_binary(test: impl FnOnce(&mut IndexedKAryHeap<i32>)) {
    run_kary(2, test);
}

pub fn run_quaternary(test: impl FnOnce(&mut IndexedKAryHeap<i32>)) {
    run_kary(4, test);
}

pub fn run_octonary(test: impl FnOnce(&mut IndexedKAryHeap<i32>)) {
    run_kary(8, test);
}

pub fn run_kary(k: usize, test: impl FnOnce(&mut IndexedKAryHeap<i32>)) {
    let config = HeapConfig::new(CAPACITY).branching_factor(k);
    let mut heap = IndexedKAryHeap::new(config).unwrap();
    test(&mut heap);
    assert!(heap.verify_heap_order());
    assert!(heap.verify_reverse_index());
}

pub fn run_fibonacci(test: impl FnOnce(&mut FibonacciHeap<i32>)) {
    let mut heap = FibonacciHeap::new(HeapConfig::new(CAPACITY)).unwrap();
    test(&mut heap);
    assert!(heap.verify_structure());
}

/// Runs `test` on the middle column of a three-worker shared heap and checks
/// that the neighbouring columns were not touched.
pub fn run_partition(test: impl FnOnce(&mut Partition<'_, i32>)) {
    let storage = SharedStorage::new(CAPACITY, 3).unwrap();
    let mut shared = SharedPartitionedHeap::new(HeapConfig::new(CAPACITY), storage).unwrap();
    {
        let mut partitions = shared.partitions_mut();
        test(&mut partitions[1]);
    }
    for worker in [0, 2] {
        assert!(shared.is_empty(WorkerId(worker)));
    }
    assert!(shared.verify_column(WorkerId(1)));
}

/// Deterministic xorshift generator so failures reproduce without a seed file.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        XorShift(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform value in `0..bound`
    pub fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}
