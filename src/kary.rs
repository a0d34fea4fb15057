//! Indexed k-ary heap
//!
//! An array-backed min-heap of `(key, value)` pairs with branching factor `k`
//! and an O(1) reverse index from key to heap slot. The reverse index is what
//! makes `decrease_key`, `get` and `contains` constant-time lookups instead of
//! linear scans.
//!
//! # Layout
//!
//! Slots are 0-based. The children of slot `p` are `k*p + 1 ..= k*p + k` and
//! the parent of slot `i > 0` is `(i - 1) / k`. With `k = 2` this is the
//! ordinary binary heap.
//!
//! # Time Complexity
//!
//! | Operation      | Complexity     |
//! |----------------|----------------|
//! | `push`         | O(log_k n)     |
//! | `pop`          | O(k log_k n)   |
//! | `peek`         | O(1)           |
//! | `decrease_key` | O(k log_k n)   |
//! | `get`          | O(1)           |
//! | `contains`     | O(1)           |
//!
//! # Example
//!
//! ```rust
//! use pq_engine::{Heap, HeapConfig};
//! use pq_engine::kary::IndexedKAryHeap;
//!
//! let mut heap = IndexedKAryHeap::new(HeapConfig::new(4).branching_factor(4)).unwrap();
//! heap.push(1, 50);
//! heap.push(2, 10);
//! heap.push(3, 30);
//! heap.push(4, 10);
//!
//! let values: Vec<i32> = std::iter::from_fn(|| heap.pop()).map(|(_, v)| v).collect();
//! assert_eq!(values, vec![10, 10, 30, 50]);
//! ```

use log::debug;

use crate::config::HeapConfig;
use crate::storage::{encode_slot, KAryStorage, SlotState, ABSENT, DEACTIVATED};
use crate::traits::{Heap, HeapError, Priority};

/// Mutable view of one k-ary heap laid over borrowed buffers
///
/// This is the whole heap algorithm. [`IndexedKAryHeap`] builds it over its own
/// buffers and the shared heap builds it over one worker's column.
///
/// `data.len()` is the capacity and `reverse.len()` is the capacity plus one.
pub(crate) struct KAryView<'a, V> {
    data: &'a mut [V],
    index: &'a mut [usize],
    reverse: &'a mut [usize],
    size: &'a mut usize,
    config: HeapConfig,
}

impl<'a, V: Priority> KAryView<'a, V> {
    pub(crate) fn new(
        data: &'a mut [V],
        index: &'a mut [usize],
        reverse: &'a mut [usize],
        size: &'a mut usize,
        config: HeapConfig,
    ) -> Self {
        debug_assert_eq!(data.len(), index.len());
        debug_assert_eq!(data.len() + 1, reverse.len());
        KAryView {
            data,
            index,
            reverse,
            size,
            config,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        *self.size
    }

    pub(crate) fn data(&self) -> &[V] {
        self.data
    }

    pub(crate) fn index(&self) -> &[usize] {
        self.index
    }

    pub(crate) fn reverse(&self) -> &[usize] {
        self.reverse
    }

    #[inline]
    fn k(&self) -> usize {
        self.config.branching_factor
    }

    #[inline]
    fn state(&self, key: usize) -> SlotState {
        SlotState::of(self.reverse, key)
    }

    pub(crate) fn push(&mut self, key: usize, value: V) -> bool {
        if key == 0 || key > self.capacity() {
            return false;
        }
        let present = matches!(self.state(key), SlotState::Occupied(_));
        if present && self.config.check_duplicates {
            return false;
        }
        debug_assert!(!present, "key {key} pushed twice");
        let slot = *self.size;
        if slot == self.capacity() {
            return false;
        }

        self.data[slot] = value;
        self.index[slot] = key;
        self.reverse[key] = encode_slot(slot);
        *self.size += 1;
        self.sift_up(slot);
        true
    }

    pub(crate) fn pop(&mut self) -> Option<(usize, V)> {
        if *self.size == 0 {
            return None;
        }
        let key = self.index[0];
        let value = self.data[0];
        let last = *self.size - 1;

        self.swap(0, last);
        self.data[last] = V::VACANT;
        self.index[last] = 0;
        *self.size = last;
        self.reverse[key] = ABSENT;

        if last > 0 {
            self.sift_down(0);
        }
        Some((key, value))
    }

    pub(crate) fn decrease_key(&mut self, key: usize, value: V) -> Result<(), HeapError> {
        if key == 0 || key > self.capacity() {
            return Err(HeapError::KeyOutOfRange(key));
        }
        match self.state(key) {
            SlotState::Occupied(slot) => {
                self.data[slot] = value;
                // The direction of the change is not known, so try both ways.
                // At most one of them moves the entry.
                let slot = self.sift_up(slot);
                self.sift_down(slot);
                Ok(())
            }
            _ if self.config.push_on_missing => {
                if self.push(key, value) {
                    Ok(())
                } else {
                    Err(HeapError::CapacityExhausted)
                }
            }
            _ => Err(HeapError::KeyNotFound(key)),
        }
    }

    /// Marks an absent key as deactivated. Present keys are left alone.
    pub(crate) fn deactivate(&mut self, key: usize) -> bool {
        match self.state(key) {
            SlotState::Absent if key != 0 && key <= self.capacity() => {
                self.reverse[key] = DEACTIVATED;
                true
            }
            SlotState::Deactivated => true,
            _ => false,
        }
    }

    /// Drops every entry but keeps deactivation marks. O(size).
    pub(crate) fn clear(&mut self) {
        for slot in 0..*self.size {
            let key = self.index[slot];
            self.reverse[key] = ABSENT;
            self.data[slot] = V::VACANT;
        }
        *self.size = 0;
    }

    /// Drops every entry and every deactivation mark. O(capacity).
    pub(crate) fn reset(&mut self) {
        self.data.fill(V::VACANT);
        self.reverse.fill(ABSENT);
        *self.size = 0;
    }

    /// Exchanges two slots, reverse index first.
    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.reverse[self.index[a]] = encode_slot(b);
        self.reverse[self.index[b]] = encode_slot(a);
        self.data.swap(a, b);
        self.index.swap(a, b);
    }

    /// Moves the entry at `slot` towards the root; returns its final slot.
    fn sift_up(&mut self, mut slot: usize) -> usize {
        let k = self.k();
        while slot > 0 {
            let parent = (slot - 1) / k;
            if self.data[slot] < self.data[parent] {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
        slot
    }

    /// Moves the entry at `slot` towards the leaves; returns its final slot.
    fn sift_down(&mut self, mut slot: usize) -> usize {
        let k = self.k();
        let size = *self.size;
        loop {
            let first = k * slot + 1;
            if first >= size {
                break; // No children
            }
            let last = (first + k).min(size);

            let mut smallest = first;
            for child in first + 1..last {
                if self.data[child] < self.data[smallest] {
                    smallest = child;
                }
            }

            if self.data[smallest] < self.data[slot] {
                self.swap(slot, smallest);
                slot = smallest;
            } else {
                break;
            }
        }
        slot
    }
}

/// Read-only queries over heap buffers, shared by the owned and partitioned heaps.
pub(crate) mod query {
    use super::*;

    pub(crate) fn peek<V: Priority>(data: &[V], index: &[usize], size: usize) -> Option<(usize, V)> {
        (size > 0).then(|| (index[0], data[0]))
    }

    pub(crate) fn get<V: Priority>(data: &[V], reverse: &[usize], key: usize) -> Option<V> {
        SlotState::of(reverse, key).slot().map(|slot| data[slot])
    }

    pub(crate) fn contains(reverse: &[usize], key: usize) -> bool {
        matches!(SlotState::of(reverse, key), SlotState::Occupied(_))
    }

    pub(crate) fn is_deactivated(reverse: &[usize], key: usize) -> bool {
        SlotState::of(reverse, key) == SlotState::Deactivated
    }

    pub(crate) fn heap_order_holds<V: Priority>(data: &[V], size: usize, k: usize) -> bool {
        (1..size).all(|slot| data[(slot - 1) / k] <= data[slot])
    }

    pub(crate) fn reverse_index_coherent(index: &[usize], reverse: &[usize], size: usize) -> bool {
        let slots_agree = (0..size)
            .all(|slot| SlotState::of(reverse, index[slot]) == SlotState::Occupied(slot));
        let occupied = reverse
            .iter()
            .skip(1)
            .filter(|&&raw| matches!(SlotState::decode(raw), SlotState::Occupied(_)))
            .count();
        slots_agree && occupied == size
    }
}

/// Bounded k-ary min-heap with an O(1) key → slot reverse index
///
/// Keys are `1..=max_size`. The heap owns its buffers; they can be supplied on
/// construction with [`with_storage`](Self::with_storage) and taken back with
/// [`into_storage`](Self::into_storage) so a single allocation serves any
/// number of heaps in sequence.
#[derive(Debug, Clone)]
pub struct IndexedKAryHeap<V> {
    storage: KAryStorage<V>,
    size: usize,
    config: HeapConfig,
}

impl<V: Priority> IndexedKAryHeap<V> {
    /// Creates an empty heap with freshly allocated buffers.
    ///
    /// # Errors
    /// [`HeapError::InvalidCapacity`] or [`HeapError::InvalidBranchingFactor`]
    /// if the configuration is unusable.
    pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        debug!(
            "allocating {}-ary heap for {} keys",
            config.branching_factor, config.max_size
        );
        Ok(IndexedKAryHeap {
            storage: KAryStorage::allocate(config.max_size),
            size: 0,
            config,
        })
    }

    /// Creates an empty heap on top of existing buffers.
    ///
    /// The buffers are validated with the configured
    /// [`SizePolicy`](crate::storage::SizePolicy).
    ///
    /// # Errors
    /// Configuration errors as for [`new`](Self::new), and
    /// [`HeapError::StorageMismatch`] if a buffer has an unusable length.
    pub fn with_storage(config: HeapConfig, storage: KAryStorage<V>) -> Result<Self, HeapError> {
        config.validate()?;
        let storage = storage.prepare(config.max_size, config.size_policy)?;
        debug!(
            "reusing buffers for {}-ary heap of {} keys",
            config.branching_factor, config.max_size
        );
        Ok(IndexedKAryHeap {
            storage,
            size: 0,
            config,
        })
    }

    /// Releases the buffers for reuse by another heap.
    pub fn into_storage(self) -> KAryStorage<V> {
        self.storage
    }

    fn view(&mut self) -> KAryView<'_, V> {
        let n = self.config.max_size;
        KAryView::new(
            &mut self.storage.data[..n],
            &mut self.storage.index[..n],
            &mut self.storage.reverse[..=n],
            &mut self.size,
            self.config,
        )
    }

    /// Returns the branching factor `k`.
    pub fn branching_factor(&self) -> usize {
        self.config.branching_factor
    }

    /// Alias of [`decrease_key`](Heap::decrease_key); the new value may be larger.
    pub fn modify(&mut self, key: usize, value: V) -> Result<(), HeapError> {
        self.view().decrease_key(key, value)
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: usize) -> Option<V> {
        query::get(&self.storage.data, &self.storage.reverse, key)
    }

    /// Returns the value stored for `key`, or `not_found` if it is absent.
    pub fn get_or(&self, key: usize, not_found: V) -> V {
        self.get(key).unwrap_or(not_found)
    }

    /// Returns true if `key` was deactivated and has not been pushed since.
    pub fn is_deactivated(&self, key: usize) -> bool {
        query::is_deactivated(&self.storage.reverse, key)
    }

    /// Marks an absent key as deactivated.
    ///
    /// Returns `false` if the key is in the heap or out of range. Pushing a
    /// deactivated key re-activates it.
    pub fn deactivate(&mut self, key: usize) -> bool {
        self.view().deactivate(key)
    }

    /// Returns the slot currently holding `key`.
    pub fn slot_of(&self, key: usize) -> Option<usize> {
        SlotState::of(&self.storage.reverse, key).slot()
    }

    /// Drops every entry and every deactivation mark.
    ///
    /// Unlike [`clear`](Heap::clear) this touches the whole reverse index.
    pub fn reset(&mut self) {
        self.view().reset();
    }

    /// Checks `data[parent(i)] <= data[i]` for every occupied non-root slot.
    pub fn verify_heap_order(&self) -> bool {
        query::heap_order_holds(&self.storage.data, self.size, self.config.branching_factor)
    }

    /// Checks that every stored key maps back to its own slot and nothing else
    /// claims a slot.
    pub fn verify_reverse_index(&self) -> bool {
        let n = self.config.max_size;
        query::reverse_index_coherent(&self.storage.index, &self.storage.reverse[..=n], self.size)
    }
}

impl<V: Priority> Heap<V> for IndexedKAryHeap<V> {
    fn len(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.config.max_size
    }

    fn push(&mut self, key: usize, value: V) -> bool {
        self.view().push(key, value)
    }

    fn peek(&self) -> Option<(usize, V)> {
        query::peek(&self.storage.data, &self.storage.index, self.size)
    }

    fn pop(&mut self) -> Option<(usize, V)> {
        self.view().pop()
    }

    fn decrease_key(&mut self, key: usize, value: V) -> Result<(), HeapError> {
        self.view().decrease_key(key, value)
    }

    fn contains(&self, key: usize) -> bool {
        query::contains(&self.storage.reverse, key)
    }

    fn clear(&mut self) {
        self.view().clear();
    }
}
