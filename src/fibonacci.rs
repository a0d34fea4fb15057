//! Fibonacci Heap implementation
//!
//! A Fibonacci heap is a data structure for priority queue operations with:
//! - O(1) amortized insert and decrease_key
//! - O(log n) amortized delete_min
//!
//! The structure consists of a collection of heap-ordered trees. Roots are linked
//! in a circular doubly linked list, as are the children of every node. The heap
//! maintains the minimum root. All restructuring is deferred to `pop`, which
//! consolidates roots of equal degree.
//!
//! # Arena layout
//!
//! Nodes live in a [`SlotMap`] and refer to each other through [`NodeKey`]
//! handles. "No parent" and "no child" are the null key. The arena and the
//! consolidation scratch space keep their allocations across `clear`, so a
//! heap reused for many searches stops allocating after the first one.
//!
//! # Example
//!
//! ```rust
//! use pq_engine::{Heap, HeapConfig};
//! use pq_engine::fibonacci::FibonacciHeap;
//!
//! let mut heap = FibonacciHeap::new(HeapConfig::new(10)).unwrap();
//! heap.push(1, 5);
//! heap.push(2, 3);
//! heap.decrease_key(1, 1).unwrap();
//! assert_eq!(heap.pop(), Some((1, 1)));
//! assert_eq!(heap.pop(), Some((2, 3)));
//! ```

use log::{debug, trace};
use slotmap::{new_key_type, Key, SlotMap};

use crate::config::HeapConfig;
use crate::traits::{Heap, HeapError, Priority};

new_key_type! {
    /// Arena handle of a Fibonacci heap node
    pub struct NodeKey;
}

/// The golden ratio; the maximum degree of a heap of `n` nodes is below `log_phi(n) + 1`.
const PHI: f64 = 1.618_033_988_749_895;

#[derive(Debug)]
struct Node<V> {
    key: usize,
    value: V,
    parent: NodeKey,
    child: NodeKey,
    left: NodeKey,
    right: NodeKey,
    degree: usize,
    marked: bool,
}

/// Returns `floor(log_phi(n))`, the largest degree a node can reach in a heap of `n` nodes.
pub fn max_degree_for(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        ((n as f64).ln() / PHI.ln()).floor() as usize
    }
}

/// Bounded Fibonacci min-heap over keys `1..=max_size`
///
/// The arena is private: node links are only meaningful to this heap, so
/// there is no supplied-storage constructor. `clear` keeps every allocation.
#[derive(Debug)]
pub struct FibonacciHeap<V> {
    nodes: SlotMap<NodeKey, Node<V>>,
    /// Node of each key; null if the key is absent
    handles: Vec<NodeKey>,
    min: NodeKey,
    len: usize,
    config: HeapConfig,
    /// Consolidation scratch: roots bucketed by degree
    degree_table: Vec<NodeKey>,
    /// Consolidation scratch: snapshot of the root list
    roots: Vec<NodeKey>,
}

impl<V: Priority> FibonacciHeap<V> {
    /// Creates an empty heap for keys `1..=config.max_size()`.
    ///
    /// The branching factor of the configuration is ignored.
    pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
        if config.max_size < 1 {
            return Err(HeapError::InvalidCapacity);
        }
        let buckets = max_degree_for(config.max_size) + 2;
        debug!(
            "allocating Fibonacci heap for {} keys ({buckets} degree buckets)",
            config.max_size
        );
        Ok(FibonacciHeap {
            nodes: SlotMap::with_capacity_and_key(config.max_size),
            handles: vec![NodeKey::null(); config.max_size + 1],
            min: NodeKey::null(),
            len: 0,
            config,
            degree_table: vec![NodeKey::null(); buckets],
            roots: Vec::with_capacity(config.max_size),
        })
    }

    /// Alias of [`Heap::pop`].
    pub fn pop_min(&mut self) -> Option<(usize, V)> {
        self.pop()
    }

    /// Largest degree of any node, root or not.
    pub fn max_degree(&self) -> usize {
        self.nodes.values().map(|n| n.degree).max().unwrap_or(0)
    }

    /// Number of trees in the root list.
    pub fn root_count(&self) -> usize {
        if self.min.is_null() {
            0
        } else {
            self.ring(self.min).map_or(0, |ring| ring.len())
        }
    }

    /// Inserts `x` into the root list next to `min`. `x` must be detached.
    fn add_root(&mut self, x: NodeKey) {
        if self.min.is_null() {
            let node = &mut self.nodes[x];
            node.left = x;
            node.right = x;
            self.min = x;
        } else {
            self.insert_before(self.min, x);
        }
    }

    /// Splices the detached node `x` into the ring containing `at`, left of `at`.
    fn insert_before(&mut self, at: NodeKey, x: NodeKey) {
        let left = self.nodes[at].left;
        self.nodes[x].left = left;
        self.nodes[x].right = at;
        self.nodes[left].right = x;
        self.nodes[at].left = x;
    }

    /// Removes `x` from whatever ring contains it, leaving it a singleton ring.
    fn unlink(&mut self, x: NodeKey) {
        let (left, right) = (self.nodes[x].left, self.nodes[x].right);
        self.nodes[left].right = right;
        self.nodes[right].left = left;
        let node = &mut self.nodes[x];
        node.left = x;
        node.right = x;
    }

    /// Makes the root `y` a child of the root `x`.
    fn link(&mut self, y: NodeKey, x: NodeKey) {
        self.unlink(y);
        self.nodes[y].parent = x;
        self.nodes[y].marked = false;

        let child = self.nodes[x].child;
        if child.is_null() {
            self.nodes[x].child = y;
        } else {
            self.insert_before(child, y);
        }
        self.nodes[x].degree += 1;
    }

    /// Moves `x` from the child list of `parent` to the root list.
    fn cut(&mut self, x: NodeKey, parent: NodeKey) {
        if self.nodes[parent].child == x {
            let right = self.nodes[x].right;
            self.nodes[parent].child = if right == x { NodeKey::null() } else { right };
        }
        self.unlink(x);
        self.nodes[parent].degree -= 1;

        let node = &mut self.nodes[x];
        node.parent = NodeKey::null();
        node.marked = false;
        self.add_root(x);
    }

    /// Walks up from `y`, cutting marked ancestors until an unmarked one is marked.
    fn cascading_cut(&mut self, mut y: NodeKey) {
        loop {
            let parent = self.nodes[y].parent;
            if parent.is_null() {
                return; // Roots are never marked
            }
            if !self.nodes[y].marked {
                self.nodes[y].marked = true;
                return;
            }
            self.cut(y, parent);
            y = parent;
        }
    }

    /// Merges roots of equal degree until all degrees are distinct, then
    /// rebuilds the root list and recomputes `min`.
    fn consolidate(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        let mut table = std::mem::take(&mut self.degree_table);

        roots.clear();
        let start = self.min;
        let mut x = start;
        loop {
            roots.push(x);
            x = self.nodes[x].right;
            if x == start {
                break;
            }
        }
        table.fill(NodeKey::null());

        for &root in &roots {
            let mut x = root;
            let mut degree = self.nodes[x].degree;
            loop {
                if degree >= table.len() {
                    table.resize(degree + 1, NodeKey::null());
                }
                let y = table[degree];
                if y.is_null() {
                    break;
                }
                // On ties the root seen later stays a root.
                let (parent, child) = if self.nodes[y].value < self.nodes[x].value {
                    (y, x)
                } else {
                    (x, y)
                };
                self.link(child, parent);
                table[degree] = NodeKey::null();
                x = parent;
                degree += 1;
            }
            table[degree] = x;
        }

        self.min = NodeKey::null();
        let mut best: Option<NodeKey> = None;
        for &root in table.iter().filter(|r| !r.is_null()) {
            self.unlink(root);
            self.add_root(root);
            best = match best {
                Some(b) if self.nodes[b].value <= self.nodes[root].value => Some(b),
                _ => Some(root),
            };
        }
        if let Some(best) = best {
            self.min = best;
        }
        trace!(
            "consolidated {} roots into {}",
            roots.len(),
            table.iter().filter(|r| !r.is_null()).count()
        );

        self.roots = roots;
        self.degree_table = table;
    }

    /// Collects the ring starting at `start`; `None` if it is not closed.
    fn ring(&self, start: NodeKey) -> Option<Vec<NodeKey>> {
        let mut ring = Vec::new();
        let mut x = start;
        loop {
            ring.push(x);
            if ring.len() > self.nodes.len() {
                return None;
            }
            let right = self.nodes.get(x)?.right;
            if self.nodes.get(right)?.left != x {
                return None;
            }
            x = right;
            if x == start {
                return Some(ring);
            }
        }
    }

    /// Checks every structural invariant of the heap.
    ///
    /// - every ring is closed and doubly linked
    /// - roots have no parent, children point at their parent
    /// - `degree` equals the child count and no child is smaller than its parent
    /// - `min` is a smallest root, and the handle table agrees with the arena
    /// - every node is reachable and the count matches `len`
    pub fn verify_structure(&self) -> bool {
        if self.min.is_null() {
            return self.len == 0 && self.nodes.is_empty();
        }
        let roots = match self.ring(self.min) {
            Some(roots) => roots,
            None => return false,
        };
        let min_value = self.nodes[self.min].value;
        if roots
            .iter()
            .any(|&r| !self.nodes[r].parent.is_null() || self.nodes[r].value < min_value)
        {
            return false;
        }

        let mut seen = 0;
        let mut stack = roots;
        while let Some(x) = stack.pop() {
            seen += 1;
            let node = &self.nodes[x];
            if self.handles.get(node.key) != Some(&x) {
                return false;
            }
            if node.child.is_null() {
                if node.degree != 0 {
                    return false;
                }
                continue;
            }
            let children = match self.ring(node.child) {
                Some(children) => children,
                None => return false,
            };
            if children.len() != node.degree {
                return false;
            }
            for &c in &children {
                let child = &self.nodes[c];
                if child.parent != x || child.value < node.value {
                    return false;
                }
            }
            stack.extend(children);
        }
        seen == self.len && seen == self.nodes.len()
    }
}

impl<V: Priority> Heap<V> for FibonacciHeap<V> {
    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.config.max_size
    }

    fn push(&mut self, key: usize, value: V) -> bool {
        if key == 0 || key > self.config.max_size || self.len == self.config.max_size {
            return false;
        }
        if !self.handles[key].is_null() {
            return false;
        }

        let x = self.nodes.insert(Node {
            key,
            value,
            parent: NodeKey::null(),
            child: NodeKey::null(),
            left: NodeKey::null(),
            right: NodeKey::null(),
            degree: 0,
            marked: false,
        });
        let was_empty = self.min.is_null();
        self.add_root(x);
        if !was_empty && value < self.nodes[self.min].value {
            self.min = x;
        }
        self.handles[key] = x;
        self.len += 1;
        true
    }

    fn peek(&self) -> Option<(usize, V)> {
        self.nodes.get(self.min).map(|n| (n.key, n.value))
    }

    fn pop(&mut self) -> Option<(usize, V)> {
        let z = self.min;
        if z.is_null() {
            return None;
        }

        // Promote all children of the minimum to roots
        let first = self.nodes[z].child;
        if !first.is_null() {
            let mut c = first;
            loop {
                let next = self.nodes[c].right;
                let node = &mut self.nodes[c];
                node.parent = NodeKey::null();
                node.marked = false;
                node.left = c;
                node.right = c;
                self.insert_before(z, c);
                if next == first {
                    break;
                }
                c = next;
            }
            let node = &mut self.nodes[z];
            node.child = NodeKey::null();
            node.degree = 0;
        }

        let right = self.nodes[z].right;
        self.unlink(z);
        let Node { key, value, .. } = self.nodes.remove(z)?;
        self.handles[key] = NodeKey::null();
        self.len -= 1;

        if right == z {
            self.min = NodeKey::null();
        } else {
            self.min = right;
            self.consolidate();
        }
        Some((key, value))
    }

    fn decrease_key(&mut self, key: usize, value: V) -> Result<(), HeapError> {
        if key == 0 || key > self.config.max_size {
            return Err(HeapError::KeyOutOfRange(key));
        }
        let x = self.handles[key];
        if x.is_null() {
            if !self.config.push_on_missing {
                return Err(HeapError::KeyNotFound(key));
            }
            return if self.push(key, value) {
                Ok(())
            } else {
                Err(HeapError::CapacityExhausted)
            };
        }
        if value > self.nodes[x].value {
            return Err(HeapError::PriorityNotDecreased);
        }

        self.nodes[x].value = value;
        let parent = self.nodes[x].parent;
        if !parent.is_null() && value < self.nodes[parent].value {
            self.cut(x, parent);
            self.cascading_cut(parent);
        }
        if value < self.nodes[self.min].value {
            self.min = x;
        }
        Ok(())
    }

    fn contains(&self, key: usize) -> bool {
        self.handles.get(key).is_some_and(|h| !h.is_null())
    }

    fn clear(&mut self) {
        for node in self.nodes.values() {
            self.handles[node.key] = NodeKey::null();
        }
        self.nodes.clear();
        self.min = NodeKey::null();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_heap(max_size: usize) -> FibonacciHeap<i32> {
        FibonacciHeap::new(HeapConfig::new(max_size)).unwrap()
    }

    #[test]
    fn test_debug_output() {
        let mut heap = new_heap(4);
        heap.push(3, 42);
        let rendered = format!("{heap:?}");
        assert!(rendered.starts_with("FibonacciHeap"));
        assert!(rendered.contains("value: 42"));
    }

    #[test]
    fn test_basic_operations() {
        let mut heap = new_heap(8);
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        assert!(heap.verify_structure());

        assert!(heap.push(1, 5));
        assert!(heap.push(2, 3));
        assert!(heap.push(3, 7));

        assert_eq!(heap.len(), 3);
        assert_eq!(heap.peek(), Some((2, 3)));
        assert_eq!(heap.root_count(), 3);

        assert_eq!(heap.pop(), Some((2, 3)));
        assert_eq!(heap.peek(), Some((1, 5)));
        assert!(heap.verify_structure());
        assert!(!heap.contains(2));
        assert!(heap.contains(3));
    }

    #[test]
    fn test_pop_consolidates() {
        let mut heap = new_heap(16);
        for key in 1..=9 {
            heap.push(key, key as i32);
        }
        assert_eq!(heap.root_count(), 9);

        assert_eq!(heap.pop(), Some((1, 1)));
        // 8 remaining nodes collapse into one binomial-shaped tree
        assert_eq!(heap.root_count(), 1);
        assert_eq!(heap.max_degree(), 3);
        assert!(heap.verify_structure());
    }

    #[test]
    fn test_decrease_key_with_cascading_cut() {
        let mut heap = new_heap(32);
        for key in 1..=17 {
            heap.push(key, 100 + key as i32);
        }
        heap.pop();
        assert_eq!(heap.root_count(), 1);

        // Cutting several descendants marks and then cuts their ancestors
        for key in (10..=17).rev() {
            heap.decrease_key(key, key as i32 - 20).unwrap();
            assert!(heap.verify_structure());
        }
        assert_eq!(heap.peek(), Some((10, -10)));

        let mut last = i32::MIN;
        while let Some((_, value)) = heap.pop() {
            assert!(value >= last);
            last = value;
            assert!(heap.verify_structure());
        }
    }

    #[test]
    fn test_decrease_key_errors() {
        let mut heap = new_heap(4);
        heap.push(1, 10);
        assert_eq!(heap.decrease_key(1, 11), Err(HeapError::PriorityNotDecreased));
        assert_eq!(heap.decrease_key(1, 10), Ok(()));
        assert_eq!(heap.decrease_key(2, 1), Err(HeapError::KeyNotFound(2)));
        assert_eq!(heap.decrease_key(5, 1), Err(HeapError::KeyOutOfRange(5)));

        let mut heap = FibonacciHeap::new(HeapConfig::new(2).push_on_missing(true)).unwrap();
        heap.decrease_key(2, 4).unwrap();
        assert_eq!(heap.peek(), Some((2, 4)));
    }

    #[test]
    fn test_capacity_boundary() {
        let mut heap = new_heap(2);
        assert!(heap.push(1, 1));
        assert!(heap.push(2, 2));
        assert!(!heap.push(1, 0));
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.peek(), Some((1, 1)));
    }

    #[test]
    fn test_duplicate_and_range() {
        let mut heap = new_heap(3);
        assert!(heap.push(3, 1));
        assert!(!heap.push(3, 0));
        assert!(!heap.push(0, 0));
        assert!(!heap.push(4, 0));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_clear_and_reuse() {
        let mut heap = new_heap(64);
        for round in 0..5 {
            for key in 1..=64 {
                heap.push(key, ((key * 37 + round) % 64) as i32);
            }
            for _ in 0..10 {
                heap.pop();
            }
            heap.clear();
            assert!(heap.is_empty());
            assert!(heap.verify_structure());
            assert!((1..=64).all(|key| !heap.contains(key)));
        }
    }

    #[test]
    fn test_equal_values() {
        let mut heap = new_heap(6);
        for key in 1..=6 {
            heap.push(key, 7);
        }
        let mut keys = Vec::new();
        while let Some((key, value)) = heap.pop() {
            assert_eq!(value, 7);
            keys.push(key);
            assert!(heap.verify_structure());
        }
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_max_degree_for() {
        assert_eq!(max_degree_for(0), 0);
        assert_eq!(max_degree_for(1), 0);
        assert_eq!(max_degree_for(2), 1);
        assert_eq!(max_degree_for(100), 9);
    }

    #[test]
    fn test_invalid_capacity() {
        assert!(matches!(
            FibonacciHeap::<u8>::new(HeapConfig::new(0)),
            Err(HeapError::InvalidCapacity)
        ));
    }
}
