//! Bounded FIFO queue over a preallocated buffer
//!
//! Insertion order only, no reordering. `pop` shifts the remaining elements
//! left, so it is O(n); the queue exists for callers that want the same
//! fixed-capacity, reusable-buffer contract as the heaps.
//!
//! # Example
//!
//! ```rust
//! use pq_engine::fifo::FifoQueue;
//!
//! let mut queue = FifoQueue::new(3, 0u32).unwrap();
//! assert_eq!(queue.push_slice(&[7, 8, 9, 10]), 3);
//! assert_eq!(queue.pop(), Some(7));
//! assert!(queue.push(11));
//! assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![8, 9, 11]);
//! ```

use crate::storage::{prepare_buffer, SizePolicy};
use crate::traits::HeapError;

/// Fixed-capacity first-in first-out queue
#[derive(Debug, Clone)]
pub struct FifoQueue<T> {
    buffer: Vec<T>,
    len: usize,
    capacity: usize,
    /// Written into slots that do not hold an element
    missing: T,
}

impl<T: Copy> FifoQueue<T> {
    /// Creates an empty queue of `capacity` elements, every slot set to `missing`.
    pub fn new(capacity: usize, missing: T) -> Result<Self, HeapError> {
        Self::with_buffer(capacity, missing, None, SizePolicy::Exact)
    }

    /// Creates an empty queue on top of an existing buffer.
    ///
    /// The buffer is validated with `policy` and refilled with `missing`.
    pub fn with_buffer(
        capacity: usize,
        missing: T,
        buffer: Option<Vec<T>>,
        policy: SizePolicy,
    ) -> Result<Self, HeapError> {
        if capacity < 1 {
            return Err(HeapError::InvalidCapacity);
        }
        let buffer = prepare_buffer(buffer, capacity, missing, true, policy)?;
        Ok(FifoQueue {
            buffer,
            len: 0,
            capacity,
            missing,
        })
    }

    /// Releases the buffer for reuse.
    pub fn into_buffer(self) -> Vec<T> {
        self.buffer
    }

    /// Number of queued elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if no more elements fit.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Maximum number of queued elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `value`. Returns `false` and does nothing if the queue is full.
    pub fn push(&mut self, value: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.buffer[self.len] = value;
        self.len += 1;
        true
    }

    /// Appends as many of `values` as fit; returns how many were appended.
    pub fn push_slice(&mut self, values: &[T]) -> usize {
        let count = values.len().min(self.capacity - self.len);
        self.buffer[self.len..self.len + count].copy_from_slice(&values[..count]);
        self.len += count;
        count
    }

    /// Removes and returns the oldest element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let front = self.buffer[0];
        self.buffer.copy_within(1..self.len, 0);
        self.len -= 1;
        self.buffer[self.len] = self.missing;
        Some(front)
    }

    /// Returns the oldest element without removing it.
    pub fn peek(&self) -> Option<T> {
        (self.len > 0).then(|| self.buffer[0])
    }

    /// Empties the queue and fills every slot with the missing value.
    pub fn reset(&mut self) {
        self.buffer[..self.capacity].fill(self.missing);
        self.len = 0;
    }

    /// Iterates the queued elements, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.buffer[..self.len].iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = FifoQueue::new(5, -1i32).unwrap();
        for value in [30, 10, 20] {
            assert!(queue.push(value));
        }
        assert_eq!(queue.peek(), Some(30));
        assert_eq!(queue.pop(), Some(30));
        assert_eq!(queue.pop(), Some(10));
        assert_eq!(queue.pop(), Some(20));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_full_queue_rejects() {
        let mut queue = FifoQueue::new(2, 0u8).unwrap();
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert!(queue.is_full());
        assert!(!queue.push(3));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.push_slice(&[4, 5]), 0);
    }

    #[test]
    fn test_push_slice_clips() {
        let mut queue = FifoQueue::new(4, 0u16).unwrap();
        queue.push(1);
        assert_eq!(queue.push_slice(&[2, 3, 4, 5, 6]), 3);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_pop_clears_vacated_slot() {
        let mut queue = FifoQueue::new(3, u32::MAX).unwrap();
        queue.push_slice(&[1, 2, 3]);
        queue.pop();
        let buffer = queue.into_buffer();
        assert_eq!(buffer, vec![2, 3, u32::MAX]);
    }

    #[test]
    fn test_reset() {
        let mut queue = FifoQueue::new(3, 0i64).unwrap();
        queue.push_slice(&[4, 5]);
        queue.reset();
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.into_buffer(), vec![0; 3]);
    }

    #[test]
    fn test_buffer_reuse() {
        let buffer = vec![9u8; 8];
        let queue = FifoQueue::with_buffer(4, 0, Some(buffer), SizePolicy::AtLeast).unwrap();
        assert_eq!(queue.capacity(), 4);
        assert!(queue.is_empty());

        assert_eq!(
            FifoQueue::with_buffer(4, 0u8, Some(vec![0; 3]), SizePolicy::AtLeast).unwrap_err(),
            HeapError::StorageMismatch {
                expected: 4,
                actual: 3
            }
        );
        assert_eq!(
            FifoQueue::new(0, 0u8).unwrap_err(),
            HeapError::InvalidCapacity
        );
    }
}
