//! Bounded LRU map
//!
//! Slab of nodes threaded into a doubly-linked recency list, indexed by an
//! AHash map. Head is the most recently used entry, tail the least.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;

use ahash::RandomState;

use crate::error::{Error, Result};

/// Node in the recency list
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Map holding at most `capacity` entries, evicting the least recently used
pub struct LruMap<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Option<Node<K, V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    capacity: usize,
}

impl<K, V> LruMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a map holding at most `capacity` entries
    ///
    /// Fails with [`Error::InvalidConfiguration`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        NonZeroUsize::new(capacity)
            .map(Self::with_capacity)
            .ok_or(Error::InvalidConfiguration { max_len: capacity })
    }

    /// Create a map holding at most `capacity` entries
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free_list: Vec::new(),
            capacity,
        }
    }

    /// Look up `key`, marking it most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Whether `key` is present, without touching recency
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or overwrite `key`, marking it most recently used
    ///
    /// Returns the entry evicted to stay within capacity, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                node.value = value;
            }
            self.move_to_front(idx);
            return None;
        }

        let evicted = if self.map.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let idx = self.alloc_node();
        self.nodes[idx] = Some(Node {
            key: key.clone(),
            value,
            prev: None,
            next: self.head,
        });

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }

        self.map.insert(key, idx);
        evicted
    }

    /// Remove `key`; absent keys are a no-op returning `None`
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.free_node(idx);
        self.nodes[idx].take().map(|node| node.value)
    }

    /// Snapshot of keys from least to most recently used
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            match &self.nodes[idx] {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.prev;
                }
                None => break,
            }
        }
        keys
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }

        self.unlink(idx);

        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn evict(&mut self) -> Option<(K, V)> {
        let tail_idx = self.tail?;
        // Unlink while the node is still in the slab so head/tail stay correct.
        self.unlink(tail_idx);
        let node = self.nodes[tail_idx].take()?;
        self.map.remove(&node.key);
        self.free_node(tail_idx);
        Some((node.key, node.value))
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            let idx = self.nodes.len();
            self.nodes.push(None);
            idx
        }
    }

    fn free_node(&mut self, idx: usize) {
        self.free_list.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_zero_capacity() {
        assert_eq!(
            LruMap::<u32, u32>::new(0).err(),
            Some(Error::InvalidConfiguration { max_len: 0 })
        );
    }

    #[test]
    fn test_lru_basic() {
        let mut map = LruMap::new(2).unwrap();

        map.put(1, "a");
        map.put(2, "b");

        assert_eq!(map.get(&1), Some(&"a"));
        assert_eq!(map.get(&2), Some(&"b"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.capacity(), 2);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut map = LruMap::new(3).unwrap();

        assert_eq!(map.put(1, "a"), None);
        assert_eq!(map.put(2, "b"), None);
        assert_eq!(map.put(3, "c"), None);
        assert_eq!(map.put(4, "d"), Some((1, "a")));

        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));
        assert!(map.contains_key(&3));
        assert!(map.contains_key(&4));
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let mut map = LruMap::new(2).unwrap();

        map.put(1, "a");
        map.put(2, "b");
        map.get(&1);
        assert_eq!(map.put(3, "c"), Some((2, "b")));

        assert_eq!(map.get(&1), Some(&"a"));
        assert_eq!(map.get(&2), None);
        assert_eq!(map.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_repeated_evictions_keep_links() {
        let mut map = LruMap::new(2).unwrap();

        for i in 0..10 {
            map.put(i, i * 10);
            assert!(map.len() <= 2);
        }

        assert_eq!(map.keys(), vec![8, 9]);
        assert_eq!(map.get(&8), Some(&80));
        assert_eq!(map.keys(), vec![9, 8]);
    }

    #[test]
    fn test_lru_remove() {
        let mut map = LruMap::new(3).unwrap();

        map.put(1, "a");
        map.put(2, "b");
        map.put(3, "c");

        assert_eq!(map.remove(&2), Some("b"));
        assert_eq!(map.remove(&2), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys(), vec![1, 3]);

        // Freed slot is reused
        map.put(4, "d");
        assert_eq!(map.keys(), vec![1, 3, 4]);
    }

    #[test]
    fn test_lru_remove_tail_then_evict() {
        let mut map = LruMap::new(2).unwrap();

        map.put(1, "a");
        map.put(2, "b");
        map.remove(&1);
        map.put(3, "c");
        assert_eq!(map.put(4, "d"), Some((2, "b")));
        assert_eq!(map.keys(), vec![3, 4]);
    }

    #[test]
    fn test_lru_clear_twice() {
        let mut map = LruMap::new(3).unwrap();

        map.put(1, "a");
        map.put(2, "b");
        map.clear();
        assert!(map.is_empty());
        map.clear();
        assert!(map.is_empty());
        assert!(map.keys().is_empty());

        map.put(5, "e");
        assert_eq!(map.keys(), vec![5]);
    }

    #[test]
    fn test_lru_overwrite() {
        let mut map = LruMap::new(2).unwrap();

        map.put(1, "a");
        map.put(2, "b");
        assert_eq!(map.put(1, "z"), None);

        assert_eq!(map.len(), 2);
        assert_eq!(map.keys(), vec![2, 1]);
        assert_eq!(map.get(&1), Some(&"z"));
    }
}
