//! Column-partitioned k-ary heaps over one shared buffer
//!
//! A [`SharedPartitionedHeap`] holds one independent indexed k-ary heap per
//! worker inside a single [`SharedStorage`]. Every operation names the worker
//! column it acts on; no operation touches another worker's column. The
//! coordinator view ([`all_empty`](SharedPartitionedHeap::all_empty),
//! [`total_len`](SharedPartitionedHeap::total_len),
//! [`reset_all`](SharedPartitionedHeap::reset_all)) takes no worker argument
//! and iterates every column.
//!
//! For parallel use, [`partitions_mut`](SharedPartitionedHeap::partitions_mut)
//! splits the buffer into disjoint [`Partition`] handles. Each holds `&mut`
//! borrows of its own column only, so the handles can be moved into scoped
//! threads with no locking at all.
//!
//! # Example
//!
//! ```rust
//! use pq_engine::{Heap, HeapConfig};
//! use pq_engine::shared::SharedPartitionedHeap;
//! use pq_engine::storage::{SharedStorage, WorkerId};
//!
//! let storage = SharedStorage::<u32>::new(16, 4).unwrap();
//! let mut heap = SharedPartitionedHeap::new(HeapConfig::new(16), storage).unwrap();
//!
//! std::thread::scope(|scope| {
//!     for (worker, mut partition) in heap.partitions_mut().into_iter().enumerate() {
//!         scope.spawn(move || {
//!             for key in 1..=8 {
//!                 partition.push(key, (key * (worker + 1)) as u32);
//!             }
//!         });
//!     }
//! });
//!
//! assert_eq!(heap.total_len(), 32);
//! assert_eq!(heap.pop(WorkerId(2)), Some((1, 3)));
//! ```

use log::{debug, trace};

use crate::config::HeapConfig;
use crate::kary::{query, KAryView};
use crate::storage::{ColumnMut, SharedStorage, WorkerId};
use crate::traits::{Heap, HeapError, Priority};

/// One k-ary heap per worker, all living in one [`SharedStorage`]
#[derive(Debug, Clone)]
pub struct SharedPartitionedHeap<V> {
    storage: SharedStorage<V>,
    config: HeapConfig,
}

impl<V: Priority> SharedPartitionedHeap<V> {
    /// Binds a heap per column to already partitioned storage.
    ///
    /// The storage must have exactly `config.max_size()` rows; there is no
    /// allocation path once storage is partitioned.
    ///
    /// # Errors
    /// Configuration errors, or [`HeapError::StorageMismatch`] if the row
    /// count differs from the configured capacity.
    pub fn new(config: HeapConfig, storage: SharedStorage<V>) -> Result<Self, HeapError> {
        config.validate()?;
        if storage.rows() != config.max_size {
            return Err(HeapError::StorageMismatch {
                expected: config.max_size,
                actual: storage.rows(),
            });
        }
        debug!(
            "partitioned {}-ary heap: {} workers x {} keys",
            config.branching_factor,
            storage.workers(),
            config.max_size
        );
        Ok(SharedPartitionedHeap { storage, config })
    }

    /// Releases the partitioned storage.
    pub fn into_storage(self) -> SharedStorage<V> {
        self.storage
    }

    /// Number of worker columns.
    pub fn workers(&self) -> usize {
        self.storage.workers()
    }

    /// Capacity of each column.
    pub fn capacity(&self) -> usize {
        self.config.max_size
    }

    fn view(&mut self, worker: WorkerId) -> KAryView<'_, V> {
        let ColumnMut {
            data,
            index,
            reverse,
            size,
        } = self.storage.column_mut(worker);
        KAryView::new(data, index, reverse, size, self.config)
    }

    /// Inserts `key` into `worker`'s heap. Returns `false` if it was not inserted.
    ///
    /// # Panics
    /// Panics if `worker` has no column. Use [`check_worker`](Self::check_worker)
    /// to validate untrusted ids.
    pub fn push(&mut self, worker: WorkerId, key: usize, value: V) -> bool {
        self.view(worker).push(key, value)
    }

    /// Removes and returns the minimum of `worker`'s heap.
    pub fn pop(&mut self, worker: WorkerId) -> Option<(usize, V)> {
        self.view(worker).pop()
    }

    /// Updates `key` in `worker`'s heap; see [`Heap::decrease_key`].
    pub fn decrease_key(&mut self, worker: WorkerId, key: usize, value: V) -> Result<(), HeapError> {
        self.view(worker).decrease_key(key, value)
    }

    /// Marks an absent key of `worker`'s heap as deactivated.
    pub fn deactivate(&mut self, worker: WorkerId, key: usize) -> bool {
        self.view(worker).deactivate(key)
    }

    /// Returns the minimum of `worker`'s heap.
    pub fn peek(&self, worker: WorkerId) -> Option<(usize, V)> {
        let column = self.storage.column(worker);
        query::peek(column.data, column.index, column.size)
    }

    /// Returns the value of `key` in `worker`'s heap.
    pub fn get(&self, worker: WorkerId, key: usize) -> Option<V> {
        let column = self.storage.column(worker);
        query::get(column.data, column.reverse, key)
    }

    /// Returns true if `key` is in `worker`'s heap.
    pub fn contains(&self, worker: WorkerId, key: usize) -> bool {
        query::contains(self.storage.column(worker).reverse, key)
    }

    /// Returns true if `key` is deactivated in `worker`'s heap.
    pub fn is_deactivated(&self, worker: WorkerId, key: usize) -> bool {
        query::is_deactivated(self.storage.column(worker).reverse, key)
    }

    /// Number of entries in `worker`'s heap.
    pub fn len(&self, worker: WorkerId) -> usize {
        self.storage.column(worker).size
    }

    /// Returns true if `worker`'s heap is empty. Other columns are not consulted.
    pub fn is_empty(&self, worker: WorkerId) -> bool {
        self.len(worker) == 0
    }

    /// Empties `worker`'s heap, keeping its deactivation marks.
    pub fn clear(&mut self, worker: WorkerId) {
        self.view(worker).clear();
    }

    /// Empties `worker`'s heap and wipes its column.
    pub fn reset(&mut self, worker: WorkerId) {
        self.storage.fill_column(worker);
    }

    /// Validates a worker id.
    pub fn check_worker(&self, worker: WorkerId) -> Result<(), HeapError> {
        self.storage.check_worker(worker)
    }

    /// Coordinator view: true if every worker's heap is empty.
    pub fn all_empty(&self) -> bool {
        (0..self.workers()).all(|w| self.is_empty(WorkerId(w)))
    }

    /// Coordinator view: number of entries across all workers.
    pub fn total_len(&self) -> usize {
        (0..self.workers()).map(|w| self.len(WorkerId(w))).sum()
    }

    /// Coordinator view: empties and wipes every column.
    pub fn reset_all(&mut self) {
        self.storage.fill_all();
    }

    /// Checks heap order and reverse-index coherence of `worker`'s column.
    pub fn verify_column(&self, worker: WorkerId) -> bool {
        let column = self.storage.column(worker);
        query::heap_order_holds(column.data, column.size, self.config.branching_factor)
            && query::reverse_index_coherent(column.index, column.reverse, column.size)
    }

    /// Splits the heap into one handle per worker, in worker order.
    ///
    /// The handles borrow disjoint columns and are `Send` when `V` is, so they
    /// can be moved into scoped threads.
    pub fn partitions_mut(&mut self) -> Vec<Partition<'_, V>> {
        let config = self.config;
        trace!("splitting shared heap into {} partitions", self.workers());
        self.storage
            .columns_mut()
            .into_iter()
            .enumerate()
            .map(|(w, column)| Partition {
                worker: WorkerId(w),
                view: KAryView::new(
                    column.data,
                    column.index,
                    column.reverse,
                    column.size,
                    config,
                ),
            })
            .collect()
    }
}

/// Exclusive handle on one worker's column of a [`SharedPartitionedHeap`]
pub struct Partition<'a, V> {
    worker: WorkerId,
    view: KAryView<'a, V>,
}

impl<'a, V: Priority> Partition<'a, V> {
    /// The worker owning this column.
    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: usize) -> Option<V> {
        query::get(self.view.data(), self.view.reverse(), key)
    }

    /// Returns true if `key` is deactivated.
    pub fn is_deactivated(&self, key: usize) -> bool {
        query::is_deactivated(self.view.reverse(), key)
    }

    /// Marks an absent key as deactivated.
    pub fn deactivate(&mut self, key: usize) -> bool {
        self.view.deactivate(key)
    }
}

impl<'a, V: Priority> Heap<V> for Partition<'a, V> {
    fn len(&self) -> usize {
        self.view.len()
    }

    fn capacity(&self) -> usize {
        self.view.data().len()
    }

    fn push(&mut self, key: usize, value: V) -> bool {
        self.view.push(key, value)
    }

    fn peek(&self) -> Option<(usize, V)> {
        query::peek(self.view.data(), self.view.index(), self.view.len())
    }

    fn pop(&mut self) -> Option<(usize, V)> {
        self.view.pop()
    }

    fn decrease_key(&mut self, key: usize, value: V) -> Result<(), HeapError> {
        self.view.decrease_key(key, value)
    }

    fn contains(&self, key: usize) -> bool {
        query::contains(self.view.reverse(), key)
    }

    fn clear(&mut self) {
        self.view.clear();
    }
}
