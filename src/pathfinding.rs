//! Reusable Dijkstra shortest-path driver
//!
//! [`ShortestPaths`] owns one heap and the per-vertex buffers of a search and
//! keeps all of them between runs, so running thousands of searches over the
//! same graph allocates only once.
//!
//! Vertices are `0..n`; vertex `v` is stored in the heap under key `v + 1`.
//! Edge weights must be non-negative.
//!
//! # Example
//!
//! ```rust
//! use pq_engine::HeapConfig;
//! use pq_engine::kary::IndexedKAryHeap;
//! use pq_engine::pathfinding::ShortestPaths;
//!
//! let graph = vec![
//!     vec![(1, 4u32), (2, 1)],
//!     vec![(3, 1)],
//!     vec![(1, 2), (3, 5)],
//!     vec![],
//! ];
//! let heap = IndexedKAryHeap::new(HeapConfig::new(graph.len())).unwrap();
//! let mut search = ShortestPaths::new(heap);
//!
//! let dist = search.run(&graph, 0).unwrap();
//! assert_eq!(dist, &[Some(0), Some(3), Some(1), Some(4)]);
//! ```

use std::ops::Add;

use log::debug;

use crate::traits::{Heap, HeapError, Priority};

/// Edge weights and path lengths.
///
/// `Default` must be the additive zero.
pub trait Cost: Priority + Add<Output = Self> + Default {}

impl<T> Cost for T where T: Priority + Add<Output = T> + Default {}

/// Adjacency list: `graph[u]` holds `(v, weight)` for every edge `u -> v`
pub type Graph<V> = [Vec<(usize, V)>];

/// Dijkstra search state reused across runs
pub struct ShortestPaths<V, H> {
    heap: H,
    dist: Vec<Option<V>>,
    settled: Vec<bool>,
}

impl<V: Cost, H: Heap<V>> ShortestPaths<V, H> {
    /// Wraps a heap whose capacity bounds the number of vertices.
    pub fn new(heap: H) -> Self {
        let n = heap.capacity();
        ShortestPaths {
            heap,
            dist: vec![None; n],
            settled: vec![false; n],
        }
    }

    /// Releases the heap.
    pub fn into_heap(self) -> H {
        self.heap
    }

    /// Computes distances from `source` to every vertex of `graph`.
    ///
    /// Unreachable vertices are `None`. The returned slice is valid until the
    /// next run.
    ///
    /// # Errors
    /// - [`HeapError::StorageMismatch`] if the graph has more vertices than the heap has keys
    /// - [`HeapError::KeyOutOfRange`] if `source` or an edge target is not a vertex
    pub fn run(&mut self, graph: &Graph<V>, source: usize) -> Result<&[Option<V>], HeapError> {
        let n = graph.len();
        if n > self.heap.capacity() {
            return Err(HeapError::StorageMismatch {
                expected: n,
                actual: self.heap.capacity(),
            });
        }
        if source >= n {
            return Err(HeapError::KeyOutOfRange(source));
        }

        self.heap.clear();
        self.dist[..n].fill(None);
        self.settled[..n].fill(false);

        self.dist[source] = Some(V::default());
        self.heap.push(source + 1, V::default());

        let mut pops = 0usize;
        let mut relaxations = 0usize;
        while let Some((key, d)) = self.heap.pop() {
            pops += 1;
            let u = key - 1;
            self.settled[u] = true;

            for &(v, weight) in &graph[u] {
                if v >= n {
                    return Err(HeapError::KeyOutOfRange(v));
                }
                if self.settled[v] {
                    continue;
                }
                let candidate = d + weight;
                if let Some(best) = self.dist[v] {
                    if best <= candidate {
                        continue;
                    }
                }
                self.dist[v] = Some(candidate);
                relaxations += 1;
                if self.heap.contains(v + 1) {
                    self.heap.decrease_key(v + 1, candidate)?;
                } else {
                    self.heap.push(v + 1, candidate);
                }
            }
        }

        debug!("dijkstra from {source}: {pops} settled, {relaxations} relaxations");
        Ok(&self.dist[..n])
    }

    /// Distance of `vertex` found by the last run.
    pub fn distance(&self, vertex: usize) -> Option<V> {
        self.dist.get(vertex).copied().flatten()
    }
}
