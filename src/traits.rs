//! Common traits for the priority queues in this crate
//!
//! - [`Priority`]: the numeric ordering scalar stored next to each key
//! - [`Heap`]: the capability interface shared by every heap variant
//! - [`HeapError`]: construction and update failures
//!
//! Every heap stores `(key, value)` pairs. Keys are small integer identities in
//! `1..=capacity` and values are ordered min-first. Routine outcomes such as
//! "heap is empty" or "heap is full" are reported through `Option`/`bool`
//! rather than errors, since iterative algorithms hit them constantly.

use std::fmt;

/// Error type for heap construction and updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The requested capacity is zero
    InvalidCapacity,
    /// The branching factor of a k-ary heap is smaller than two
    InvalidBranchingFactor(usize),
    /// A partitioned store was requested with zero workers
    InvalidWorkerCount,
    /// A supplied buffer does not have a usable length under the active size policy
    StorageMismatch {
        /// Length the structure needs
        expected: usize,
        /// Length of the supplied buffer
        actual: usize,
    },
    /// The key is outside `1..=capacity`
    KeyOutOfRange(usize),
    /// The key is not present and push-on-missing is disabled
    KeyNotFound(usize),
    /// The new priority is larger than the current one (Fibonacci heap only)
    PriorityNotDecreased,
    /// A push triggered by an update was rejected because the heap is full
    CapacityExhausted,
    /// The worker id does not name a column of the partitioned store
    UnknownWorker(usize),
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::InvalidCapacity => write!(f, "heap capacity must be at least 1"),
            HeapError::InvalidBranchingFactor(k) => {
                write!(f, "branching factor must be at least 2, got {k}")
            }
            HeapError::InvalidWorkerCount => {
                write!(f, "partitioned storage needs at least one worker")
            }
            HeapError::StorageMismatch { expected, actual } => {
                write!(
                    f,
                    "supplied buffer has length {actual}, but {expected} is required"
                )
            }
            HeapError::KeyOutOfRange(key) => write!(f, "key {key} is outside the heap's key range"),
            HeapError::KeyNotFound(key) => write!(f, "key {key} is not in the heap"),
            HeapError::PriorityNotDecreased => {
                write!(f, "new priority is greater than current priority")
            }
            HeapError::CapacityExhausted => write!(f, "heap is full"),
            HeapError::UnknownWorker(worker) => write!(f, "worker {worker} has no column"),
        }
    }
}

impl std::error::Error for HeapError {}

/// Numeric ordering scalar stored in the heaps
///
/// Only primitive numbers implement this; there is no support for custom
/// comparators. `VACANT` is written into slots that no longer hold an entry so
/// stale values never linger in reused buffers. It is never compared against
/// live entries.
pub trait Priority: Copy + PartialOrd + fmt::Debug {
    /// Filler for unoccupied slots
    const VACANT: Self;
}

macro_rules! impl_priority_int {
    ($($int:ty),*) => {
        $(
            impl Priority for $int {
                const VACANT: Self = <$int>::MAX;
            }
        )*
    };
}

macro_rules! impl_priority_float {
    ($($float:ty),*) => {
        $(
            impl Priority for $float {
                const VACANT: Self = <$float>::INFINITY;
            }
        )*
    };
}

impl_priority_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
impl_priority_float!(f32, f64);

/// Capability interface shared by every heap variant
///
/// Implementations are bounded: they are built with a fixed capacity and keys
/// must lie in `1..=capacity()`. The trait is implemented by
/// [`IndexedKAryHeap`](crate::kary::IndexedKAryHeap),
/// [`FibonacciHeap`](crate::fibonacci::FibonacciHeap) and the per-worker
/// [`Partition`](crate::shared::Partition) of a shared heap.
///
/// # Example
///
/// ```rust
/// use pq_engine::{Heap, HeapConfig};
/// use pq_engine::kary::IndexedKAryHeap;
///
/// let mut heap = IndexedKAryHeap::new(HeapConfig::new(8)).unwrap();
/// assert!(heap.push(3, 30.0));
/// assert!(heap.push(1, 10.0));
/// heap.decrease_key(3, 5.0).unwrap();
///
/// assert_eq!(heap.peek(), Some((3, 5.0)));
/// assert_eq!(heap.pop(), Some((3, 5.0)));
/// ```
pub trait Heap<V: Priority> {
    /// Returns true if the heap holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of entries in the heap
    fn len(&self) -> usize;

    /// Returns the fixed capacity, which is also the largest valid key
    fn capacity(&self) -> usize;

    /// Inserts `key` with priority `value`
    ///
    /// Returns `false` and leaves the heap untouched when the heap is full or
    /// the key cannot be inserted.
    fn push(&mut self, key: usize, value: V) -> bool;

    /// Returns the minimum entry without removing it
    fn peek(&self) -> Option<(usize, V)>;

    /// Removes and returns the minimum entry
    fn pop(&mut self) -> Option<(usize, V)>;

    /// Updates the priority of a present key
    ///
    /// If the key is absent and the heap was configured with push-on-missing,
    /// the key is pushed instead.
    ///
    /// # Errors
    /// - [`HeapError::KeyNotFound`] if the key is absent and push-on-missing is off
    /// - [`HeapError::CapacityExhausted`] if the fallback push found the heap full
    /// - [`HeapError::PriorityNotDecreased`] for heaps that only support decreases
    fn decrease_key(&mut self, key: usize, value: V) -> Result<(), HeapError>;

    /// Returns true if `key` is currently stored in the heap
    fn contains(&self, key: usize) -> bool;

    /// Removes every entry, keeping the allocated buffers for reuse
    fn clear(&mut self);
}
