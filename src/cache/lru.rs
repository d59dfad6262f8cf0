//! Eviction Policy Module
//!
//! Defines the eviction capability and its Least Recently Used implementation.

use std::collections::HashMap;
use std::hash::Hash;

use generational_arena::{Arena, Index};

// == Eviction Policy ==
/// Tracks which resident key should be evicted next.
///
/// The cache keeps the policy in lock-step with its entry map: every key the
/// map holds is tracked here and nothing else is.
pub trait EvictionPolicy<K>: Send {
    /// Marks `key` as most recently used, tracking it if it is new.
    fn record_access(&mut self, key: &K);

    /// Returns the next key to evict, or `None` when nothing is tracked.
    fn eviction_candidate(&self) -> Option<K>;

    /// Stops tracking `key`. No-op when absent.
    fn remove_key(&mut self, key: &K);

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: &K) -> bool;
}

#[derive(Debug)]
struct Node<K> {
    key: K,
    prev: Option<Index>,
    next: Option<Index>,
}

// == LRU Policy ==
/// Least Recently Used ordering backed by an arena-allocated linked list.
///
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// All operations are O(1); ties between keys touched in the same instant are
/// broken by call order, never by timestamps.
#[derive(Debug)]
pub struct LruPolicy<K> {
    nodes: Arena<Node<K>>,
    lookup: HashMap<K, Index>,
    head: Option<Index>,
    tail: Option<Index>,
}

impl<K> LruPolicy<K>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates a new empty LRU policy.
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            lookup: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.tail.and_then(|idx| self.nodes.get(idx)).map(|n| &n.key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.lookup.len());
        let mut current = self.head;
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            keys.push(node.key.clone());
            current = node.next;
        }
        keys
    }

    fn unlink(&mut self, idx: Index) {
        let (prev, next) = {
            let node = &self.nodes[idx];
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: Index) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[idx];
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            self.nodes[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

impl<K> Default for LruPolicy<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for LruPolicy<K>
where
    K: Eq + Hash + Clone + Send,
{
    fn record_access(&mut self, key: &K) {
        if let Some(&idx) = self.lookup.get(key) {
            if self.head != Some(idx) {
                self.unlink(idx);
                self.push_front(idx);
            }
            return;
        }

        let idx = self.nodes.insert(Node {
            key: key.clone(),
            prev: None,
            next: None,
        });
        self.lookup.insert(key.clone(), idx);
        self.push_front(idx);
    }

    fn eviction_candidate(&self) -> Option<K> {
        self.peek_oldest().cloned()
    }

    fn remove_key(&mut self, key: &K) {
        if let Some(idx) = self.lookup.remove(key) {
            self.unlink(idx);
            self.nodes.remove(idx);
        }
    }

    fn len(&self) -> usize {
        self.lookup.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.lookup.contains_key(key)
    }
}
