//! Fixed-capacity priority queues with decrease-key
//!
//! This crate provides priority queues keyed by small integers (`1..=max_size`)
//! that are allocated once and reused, for workloads like repeated shortest-path
//! searches where the same queue sees millions of push/pop cycles.
//!
//! # Structures
//!
//! - **Indexed k-ary heap** ([`kary::IndexedKAryHeap`]): implicit k-ary heap over
//!   flat buffers with a reverse index for O(log_k n) decrease-key
//! - **Shared partitioned heap** ([`shared::SharedPartitionedHeap`]): one k-ary heap
//!   per worker, all living in a single column-partitioned allocation
//! - **Fibonacci heap** ([`fibonacci::FibonacciHeap`]): O(1) amortized push and
//!   decrease-key, O(log n) amortized pop
//! - **FIFO queue** ([`fifo::FifoQueue`]): bounded insertion-order queue over a
//!   reusable buffer
//!
//! Storage and buffer reuse live in [`storage`]; [`pathfinding`] has a reusable
//! Dijkstra driver generic over any [`Heap`].
//!
//! # Example
//!
//! ```rust
//! use pq_engine::fibonacci::FibonacciHeap;
//! use pq_engine::{Heap, HeapConfig};
//!
//! let mut heap = FibonacciHeap::new(HeapConfig::new(10)).unwrap();
//! heap.push(1, 5);
//! heap.push(2, 3);
//! heap.decrease_key(1, 1).unwrap();
//! assert_eq!(heap.peek(), Some((1, 1)));
//! ```

pub mod config;
pub mod fibonacci;
pub mod fifo;
pub mod kary;
pub mod pathfinding;
pub mod shared;
pub mod storage;
pub mod traits;

pub use config::HeapConfig;
pub use traits::{Heap, HeapError, Priority};
