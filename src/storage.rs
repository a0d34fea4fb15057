//! Backing storage for the array-based heaps
//!
//! Heaps in this crate never grow. They are built on top of preallocated flat
//! buffers so one instance can be reused across many push/pop cycles, and the
//! buffers can be handed back to the caller and bound to a new heap later.
//!
//! - [`prepare_buffer`]: the allocate-or-reuse contract for a single buffer
//! - [`KAryStorage`]: the three buffers behind one indexed k-ary heap
//! - [`SharedStorage`]: the same buffers partitioned into one column per worker
//!
//! # Reverse index encoding
//!
//! Each heap keeps a `reverse` buffer indexed by key. An entry is one of
//!
//! | raw value | meaning |
//! |-----------|---------|
//! | `0`       | key absent |
//! | `1`       | key deactivated by the caller |
//! | `s + 2`   | key stored at heap slot `s` |
//!
//! [`SlotState`] decodes these values. Deactivation has no meaning inside the
//! heap; it is a mark callers use to remember keys they are done with (the
//! settled vertices of a shortest-path search, for instance).
//!
//! # Partitioned layout
//!
//! [`SharedStorage`] is logically a matrix with one row per heap slot and one
//! column per worker. Physically each column is contiguous, so the whole
//! buffer can be split into disjoint `&mut` column slices that workers use in
//! parallel without any locking.

use log::{debug, warn};

use crate::traits::{HeapError, Priority};

/// Raw reverse-index value of an absent key
pub(crate) const ABSENT: usize = 0;
/// Raw reverse-index value of a deactivated key
pub(crate) const DEACTIVATED: usize = 1;
/// Offset added to a slot number before it is stored in the reverse index
pub(crate) const SLOT_OFFSET: usize = 2;

/// How a supplied buffer is checked against the length a structure needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizePolicy {
    /// The buffer length must match exactly
    #[default]
    Exact,
    /// The buffer may be longer; the excess is kept but never used
    AtLeast,
    /// The buffer is truncated or extended to the required length
    Resize,
}

/// Decoded state of a key in a reverse index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// The key is not in the heap
    Absent,
    /// The key is not in the heap and was marked by the caller
    Deactivated,
    /// The key is stored at this heap slot (0-based)
    Occupied(usize),
}

impl SlotState {
    #[inline]
    pub(crate) fn decode(raw: usize) -> Self {
        match raw {
            ABSENT => SlotState::Absent,
            DEACTIVATED => SlotState::Deactivated,
            raw => SlotState::Occupied(raw - SLOT_OFFSET),
        }
    }

    /// Reads the state of `key`; keys outside the buffer are absent.
    #[inline]
    pub(crate) fn of(reverse: &[usize], key: usize) -> Self {
        match reverse.get(key) {
            Some(&raw) if key != 0 => SlotState::decode(raw),
            _ => SlotState::Absent,
        }
    }

    /// Returns the slot if the key is stored in the heap.
    #[inline]
    pub fn slot(self) -> Option<usize> {
        match self {
            SlotState::Occupied(slot) => Some(slot),
            _ => None,
        }
    }
}

/// Encodes a heap slot as a reverse-index value.
#[inline]
pub(crate) fn encode_slot(slot: usize) -> usize {
    slot + SLOT_OFFSET
}

/// Returns a buffer of length `len` ready for use.
///
/// Without an existing buffer a new one is allocated and filled with `fill`.
/// An existing buffer is validated against `policy` and, when `refill` is set,
/// every element is overwritten with `fill`. Under [`SizePolicy::AtLeast`] the
/// returned buffer may be longer than `len`.
///
/// # Errors
/// [`HeapError::StorageMismatch`] if the buffer length is incompatible with
/// `policy`.
///
/// # Example
///
/// ```rust
/// use pq_engine::storage::{prepare_buffer, SizePolicy};
///
/// let fresh = prepare_buffer(None, 3, 0u32, false, SizePolicy::Exact).unwrap();
/// assert_eq!(fresh, vec![0, 0, 0]);
///
/// let reused = prepare_buffer(Some(vec![7u32; 5]), 3, 0, true, SizePolicy::AtLeast).unwrap();
/// assert_eq!(reused, vec![0; 5]);
///
/// assert!(prepare_buffer(Some(vec![7u32; 2]), 3, 0, false, SizePolicy::Exact).is_err());
/// ```
pub fn prepare_buffer<T: Clone>(
    existing: Option<Vec<T>>,
    len: usize,
    fill: T,
    refill: bool,
    policy: SizePolicy,
) -> Result<Vec<T>, HeapError> {
    let mut buffer = match existing {
        None => return Ok(vec![fill; len]),
        Some(buffer) => buffer,
    };

    let actual = buffer.len();
    match policy {
        SizePolicy::Exact if actual != len => {
            debug!("rejecting buffer of length {actual}, exactly {len} required");
            return Err(HeapError::StorageMismatch {
                expected: len,
                actual,
            });
        }
        SizePolicy::AtLeast if actual < len => {
            debug!("rejecting buffer of length {actual}, at least {len} required");
            return Err(HeapError::StorageMismatch {
                expected: len,
                actual,
            });
        }
        SizePolicy::Resize if actual != len => {
            warn!("resizing supplied buffer from {actual} to {len} elements");
            buffer.truncate(len);
            buffer.resize(len, fill.clone());
        }
        _ => {}
    }

    if refill {
        buffer.fill(fill);
    }
    Ok(buffer)
}

/// Buffers backing one [`IndexedKAryHeap`](crate::kary::IndexedKAryHeap)
///
/// `data` and `index` hold one element per heap slot, `reverse` holds one
/// element per key plus the unused key `0`.
#[derive(Debug, Clone)]
pub struct KAryStorage<V> {
    pub(crate) data: Vec<V>,
    pub(crate) index: Vec<usize>,
    pub(crate) reverse: Vec<usize>,
}

impl<V: Priority> KAryStorage<V> {
    /// Allocates fresh buffers for `max_size` keys.
    pub fn allocate(max_size: usize) -> Self {
        KAryStorage {
            data: vec![V::VACANT; max_size],
            index: vec![0; max_size],
            reverse: vec![ABSENT; max_size + 1],
        }
    }

    /// Wraps caller-owned buffers so they can be validated and reused.
    pub fn from_buffers(data: Vec<V>, index: Vec<usize>, reverse: Vec<usize>) -> Self {
        KAryStorage {
            data,
            index,
            reverse,
        }
    }

    /// Validates the buffers for a heap of `max_size` keys.
    ///
    /// The reverse index is always wiped; leftover slot positions from a
    /// previous heap would otherwise alias live entries. Slot buffers are not
    /// touched since slots past the current size are never read.
    pub fn prepare(self, max_size: usize, policy: SizePolicy) -> Result<Self, HeapError> {
        let data = prepare_buffer(Some(self.data), max_size, V::VACANT, false, policy)?;
        let index = prepare_buffer(Some(self.index), max_size, 0, false, policy)?;
        let reverse = prepare_buffer(Some(self.reverse), max_size + 1, ABSENT, true, policy)?;
        Ok(KAryStorage {
            data,
            index,
            reverse,
        })
    }

    /// Splits the storage back into its raw buffers.
    pub fn into_buffers(self) -> (Vec<V>, Vec<usize>, Vec<usize>) {
        (self.data, self.index, self.reverse)
    }
}

/// Identity of a worker, selecting one column of a [`SharedStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl From<usize> for WorkerId {
    fn from(id: usize) -> Self {
        WorkerId(id)
    }
}

/// Mutable borrow of one worker's column
pub(crate) struct ColumnMut<'a, V> {
    pub(crate) data: &'a mut [V],
    pub(crate) index: &'a mut [usize],
    pub(crate) reverse: &'a mut [usize],
    pub(crate) size: &'a mut usize,
}

/// Shared borrow of one worker's column
pub(crate) struct ColumnRef<'a, V> {
    pub(crate) data: &'a [V],
    pub(crate) index: &'a [usize],
    pub(crate) reverse: &'a [usize],
    pub(crate) size: usize,
}

/// Column-partitioned buffers for a [`SharedPartitionedHeap`](crate::shared::SharedPartitionedHeap)
///
/// Holds `workers` independent heaps of `rows` slots each. The shape is fixed
/// once built: there is no way to add columns or rows afterwards.
#[derive(Debug, Clone)]
pub struct SharedStorage<V> {
    rows: usize,
    workers: usize,
    data: Vec<V>,
    index: Vec<usize>,
    reverse: Vec<usize>,
    sizes: Vec<usize>,
}

impl<V: Priority> SharedStorage<V> {
    /// Allocates storage for `workers` columns of `rows` slots.
    pub fn new(rows: usize, workers: usize) -> Result<Self, HeapError> {
        Self::with_buffers(rows, workers, None, None, None, SizePolicy::Exact)
    }

    /// Builds the partitioned storage, reusing any supplied buffers.
    ///
    /// `data` and `index` need `rows * workers` elements and `reverse` needs
    /// `(rows + 1) * workers`, validated against `policy`. Every column starts
    /// empty.
    pub fn with_buffers(
        rows: usize,
        workers: usize,
        data: Option<Vec<V>>,
        index: Option<Vec<usize>>,
        reverse: Option<Vec<usize>>,
        policy: SizePolicy,
    ) -> Result<Self, HeapError> {
        if rows < 1 {
            return Err(HeapError::InvalidCapacity);
        }
        if workers < 1 {
            return Err(HeapError::InvalidWorkerCount);
        }
        let cells = rows * workers;
        let storage = SharedStorage {
            rows,
            workers,
            data: prepare_buffer(data, cells, V::VACANT, true, policy)?,
            index: prepare_buffer(index, cells, 0, false, policy)?,
            reverse: prepare_buffer(reverse, (rows + 1) * workers, ABSENT, true, policy)?,
            sizes: vec![0; workers],
        };
        debug!("partitioned storage ready: {rows} rows x {workers} workers");
        Ok(storage)
    }

    /// Number of slots in each column.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn check_worker(&self, worker: WorkerId) -> Result<(), HeapError> {
        if worker.0 < self.workers {
            Ok(())
        } else {
            Err(HeapError::UnknownWorker(worker.0))
        }
    }

    /// Borrows one column.
    ///
    /// # Panics
    /// Panics if `worker` has no column.
    pub(crate) fn column(&self, worker: WorkerId) -> ColumnRef<'_, V> {
        let w = worker.0;
        let rows = self.rows;
        let keys = rows + 1;
        ColumnRef {
            data: &self.data[w * rows..(w + 1) * rows],
            index: &self.index[w * rows..(w + 1) * rows],
            reverse: &self.reverse[w * keys..(w + 1) * keys],
            size: self.sizes[w],
        }
    }

    /// Mutably borrows one column.
    ///
    /// # Panics
    /// Panics if `worker` has no column.
    pub(crate) fn column_mut(&mut self, worker: WorkerId) -> ColumnMut<'_, V> {
        let w = worker.0;
        let rows = self.rows;
        let keys = rows + 1;
        ColumnMut {
            data: &mut self.data[w * rows..(w + 1) * rows],
            index: &mut self.index[w * rows..(w + 1) * rows],
            reverse: &mut self.reverse[w * keys..(w + 1) * keys],
            size: &mut self.sizes[w],
        }
    }

    /// Splits the storage into disjoint mutable columns, in worker order.
    pub(crate) fn columns_mut(&mut self) -> Vec<ColumnMut<'_, V>> {
        let rows = self.rows;
        let cells = rows * self.workers;
        let keys = rows + 1;
        self.data[..cells]
            .chunks_exact_mut(rows)
            .zip(self.index[..cells].chunks_exact_mut(rows))
            .zip(self.reverse[..keys * self.workers].chunks_exact_mut(keys))
            .zip(self.sizes.iter_mut())
            .map(|(((data, index), reverse), size)| ColumnMut {
                data,
                index,
                reverse,
                size,
            })
            .collect()
    }

    /// Empties one worker's column. Other columns are not touched.
    pub fn fill_column(&mut self, worker: WorkerId) {
        let column = self.column_mut(worker);
        column.data.fill(V::VACANT);
        column.reverse.fill(ABSENT);
        *column.size = 0;
    }

    /// Empties every column.
    pub fn fill_all(&mut self) {
        self.data.fill(V::VACANT);
        self.reverse.fill(ABSENT);
        self.sizes.fill(0);
    }

    /// Splits the storage back into `(data, index, reverse)` buffers.
    pub fn into_buffers(self) -> (Vec<V>, Vec<usize>, Vec<usize>) {
        (self.data, self.index, self.reverse)
    }
}
