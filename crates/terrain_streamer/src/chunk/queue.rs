//! Keyed binary min-heap for chunk generation scheduling.
//!
//! The heap is laid out 1-based (slot 1 is the root, children of slot `i` are
//! `2i` and `2i + 1`). A side map from key to slot keeps arbitrary removal and
//! priority updates at O(log n).
//!
//! ```text
//!                 slot 1 (min)
//!               /             \
//!          slot 2              slot 3
//!         /      \            /      \
//!     slot 4   slot 5     slot 6   slot 7
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Result, StreamError};

#[derive(Clone, Debug)]
struct Node<K> {
    key: K,
    priority: i64,
}

/// Bounded min-priority queue keyed by `K`.
///
/// Lower priority values dequeue first. Among equal priorities the order is
/// unspecified. Each key can be queued at most once.
#[derive(Clone, Debug)]
pub struct PriorityQueue<K> {
    /// Heap storage; slot `s` lives at `nodes[s - 1]`.
    nodes: Vec<Node<K>>,
    /// Key → current slot.
    slots: HashMap<K, usize>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone> PriorityQueue<K> {
    /// Create an empty queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert `key` with `priority`.
    ///
    /// Fails with [`StreamError::NegativePriority`],
    /// [`StreamError::DuplicateQueueEntry`] or [`StreamError::QueueFull`].
    pub fn enqueue(&mut self, key: K, priority: i64) -> Result<()> {
        if priority < 0 {
            return Err(StreamError::NegativePriority(priority));
        }
        if self.slots.contains_key(&key) {
            return Err(StreamError::DuplicateQueueEntry);
        }
        if self.nodes.len() >= self.capacity {
            return Err(StreamError::QueueFull {
                capacity: self.capacity,
            });
        }

        self.nodes.push(Node {
            key: key.clone(),
            priority,
        });
        let slot = self.nodes.len();
        self.slots.insert(key, slot);
        self.sift_up(slot);
        Ok(())
    }

    /// Remove and return the minimum-priority item, or `None` when empty.
    pub fn dequeue(&mut self) -> Option<(K, i64)> {
        if self.nodes.is_empty() {
            return None;
        }
        let node = self.take_slot(1);
        Some((node.key, node.priority))
    }

    /// Remove an arbitrary item, returning its priority.
    ///
    /// Fails with [`StreamError::StaleQueueEntry`] if the key is not queued
    /// (never enqueued, already removed, or already dequeued).
    pub fn remove(&mut self, key: &K) -> Result<i64> {
        let slot = match self.slots.get(key) {
            Some(&slot) => slot,
            None => return Err(StreamError::StaleQueueEntry),
        };
        Ok(self.take_slot(slot).priority)
    }

    /// Change the priority of a queued item (remove followed by enqueue).
    pub fn update_priority(&mut self, key: &K, priority: i64) -> Result<()> {
        if priority < 0 {
            return Err(StreamError::NegativePriority(priority));
        }
        self.remove(key)?;
        self.enqueue(key.clone(), priority)
    }

    /// Minimum-priority item without removing it.
    pub fn peek(&self) -> Option<(&K, i64)> {
        self.nodes.first().map(|node| (&node.key, node.priority))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Current priority of a queued item.
    pub fn priority_of(&self, key: &K) -> Option<i64> {
        self.slots.get(key).map(|&slot| self.node(slot).priority)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.slots.clear();
    }

    /// Queued keys in heap order (not priority order).
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.nodes.iter().map(|node| &node.key)
    }

    /// Check every non-root slot against its parent and the key map
    /// against the slots.
    pub fn heap_property_holds(&self) -> bool {
        let ordered = (2..=self.nodes.len())
            .all(|slot| self.node(slot).priority >= self.node(slot / 2).priority);
        let indexed = self.slots.len() == self.nodes.len()
            && self
                .slots
                .iter()
                .all(|(key, &slot)| slot >= 1 && slot <= self.nodes.len() && self.node(slot).key == *key);
        ordered && indexed
    }

    #[inline]
    fn node(&self, slot: usize) -> &Node<K> {
        &self.nodes[slot - 1]
    }

    #[inline]
    fn priority(&self, slot: usize) -> i64 {
        self.nodes[slot - 1].priority
    }

    /// Detach the node at `slot`, refilling the hole with the last node.
    fn take_slot(&mut self, slot: usize) -> Node<K> {
        let node = self.nodes.swap_remove(slot - 1);
        self.slots.remove(&node.key);

        if slot <= self.nodes.len() {
            if let Some(s) = self.slots.get_mut(&self.nodes[slot - 1].key) {
                *s = slot;
            }
            // The moved node may belong above or below its new slot
            if slot > 1 && self.priority(slot) < self.priority(slot / 2) {
                self.sift_up(slot);
            } else {
                self.sift_down(slot);
            }
        }
        node
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 1 {
            let parent = slot / 2;
            if self.priority(parent) <= self.priority(slot) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.nodes.len();
        loop {
            let left = slot * 2;
            if left > len {
                break;
            }
            let right = left + 1;
            // Ties go to the left child
            let child = if right <= len && self.priority(right) < self.priority(left) {
                right
            } else {
                left
            };
            if self.priority(child) >= self.priority(slot) {
                break;
            }
            self.swap(slot, child);
            slot = child;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.nodes.swap(a - 1, b - 1);
        if let Some(s) = self.slots.get_mut(&self.nodes[a - 1].key) {
            *s = a;
        }
        if let Some(s) = self.slots.get_mut(&self.nodes[b - 1].key) {
            *s = b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn new_queue_is_empty() {
        let mut queue: PriorityQueue<u32> = PriorityQueue::new(8);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.peek().is_none());
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn dequeues_in_priority_order_for_every_insertion_order() {
        let orders = [
            [5, 1, 3],
            [5, 3, 1],
            [1, 5, 3],
            [1, 3, 5],
            [3, 1, 5],
            [3, 5, 1],
        ];
        for order in orders {
            let mut queue = PriorityQueue::new(3);
            for priority in order {
                queue.enqueue(format!("p{priority}"), priority).unwrap();
            }
            assert_eq!(queue.dequeue(), Some(("p1".to_string(), 1)));
            assert_eq!(queue.dequeue(), Some(("p3".to_string(), 3)));
            assert_eq!(queue.dequeue(), Some(("p5".to_string(), 5)));
            assert_eq!(queue.dequeue(), None);
        }
    }

    #[test]
    fn rejects_negative_priority() {
        let mut queue = PriorityQueue::new(4);
        assert!(matches!(queue.enqueue(1u8, -1), Err(StreamError::NegativePriority(-1))));
        assert!(queue.is_empty());
    }

    #[test]
    fn rejects_when_full() {
        let mut queue = PriorityQueue::new(2);
        queue.enqueue('a', 0).unwrap();
        queue.enqueue('b', 0).unwrap();
        assert!(matches!(
            queue.enqueue('c', 0),
            Err(StreamError::QueueFull { capacity: 2 })
        ));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn rejects_duplicate_key() {
        let mut queue = PriorityQueue::new(4);
        queue.enqueue(7, 10).unwrap();
        assert!(matches!(queue.enqueue(7, 2), Err(StreamError::DuplicateQueueEntry)));
        assert_eq!(queue.priority_of(&7), Some(10));
    }

    #[test]
    fn remove_arbitrary_item() {
        let mut queue = PriorityQueue::new(16);
        for (key, priority) in [(1, 4), (2, 8), (3, 1), (4, 9), (5, 6), (6, 2)] {
            queue.enqueue(key, priority).unwrap();
        }

        assert_eq!(queue.remove(&5).unwrap(), 6);
        assert!(!queue.contains(&5));
        assert!(queue.heap_property_holds());

        let drained: Vec<i64> = std::iter::from_fn(|| queue.dequeue().map(|(_, p)| p)).collect();
        assert_eq!(drained, vec![1, 2, 4, 8, 9]);
    }

    #[test]
    fn double_remove_is_stale() {
        let mut queue = PriorityQueue::new(4);
        queue.enqueue("a", 3).unwrap();
        queue.enqueue("b", 1).unwrap();
        queue.remove(&"a").unwrap();
        assert!(matches!(queue.remove(&"a"), Err(StreamError::StaleQueueEntry)));

        // Dequeued items are stale too
        queue.dequeue();
        assert!(matches!(queue.remove(&"b"), Err(StreamError::StaleQueueEntry)));
        assert!(matches!(
            queue.update_priority(&"b", 1),
            Err(StreamError::StaleQueueEntry)
        ));
    }

    #[test]
    fn remove_last_slot() {
        let mut queue = PriorityQueue::new(4);
        queue.enqueue(1, 1).unwrap();
        queue.enqueue(2, 2).unwrap();
        assert_eq!(queue.remove(&2).unwrap(), 2);
        assert_eq!(queue.len(), 1);
        assert!(queue.heap_property_holds());
    }

    #[test]
    fn removal_can_sift_up() {
        // Removing from the right subtree pulls a small leaf from the left
        let mut queue = PriorityQueue::new(16);
        for (key, priority) in [(1, 0), (2, 1), (3, 50), (4, 2), (5, 3), (6, 60), (7, 70), (8, 4)] {
            queue.enqueue(key, priority).unwrap();
        }
        queue.remove(&6).unwrap();
        assert!(queue.heap_property_holds());
        queue.remove(&7).unwrap();
        assert!(queue.heap_property_holds());
    }

    #[test]
    fn update_priority_reorders() {
        let mut queue = PriorityQueue::new(4);
        queue.enqueue('a', 1).unwrap();
        queue.enqueue('b', 2).unwrap();
        queue.enqueue('c', 3).unwrap();

        queue.update_priority(&'c', 0).unwrap();
        assert_eq!(queue.peek(), Some((&'c', 0)));

        queue.update_priority(&'c', 10).unwrap();
        assert_eq!(queue.peek(), Some((&'a', 1)));
        assert_eq!(queue.len(), 3);

        // A rejected update leaves the item queued
        assert!(queue.update_priority(&'a', -5).is_err());
        assert_eq!(queue.priority_of(&'a'), Some(1));
    }

    #[test]
    fn peek_does_not_remove() {
        let mut queue = PriorityQueue::new(2);
        queue.enqueue(9, 4).unwrap();
        assert_eq!(queue.peek(), Some((&9, 4)));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains(&9));
    }

    #[test]
    fn clear_empties_queue() {
        let mut queue = PriorityQueue::new(4);
        queue.enqueue(1, 1).unwrap();
        queue.enqueue(2, 2).unwrap();
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains(&1));
        queue.enqueue(1, 5).unwrap();
        assert_eq!(queue.keys().count(), 1);
    }

    #[test]
    fn random_interleaving_keeps_heap_property() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let mut queue = PriorityQueue::new(256);
        let mut model: HashMap<u32, i64> = HashMap::new();

        for step in 0..5_000 {
            match rng.gen_range(0..4) {
                0 | 1 => {
                    let key = rng.gen_range(0..400u32);
                    let priority = rng.gen_range(0..100i64);
                    let result = queue.enqueue(key, priority);
                    if model.contains_key(&key) {
                        assert!(matches!(result, Err(StreamError::DuplicateQueueEntry)));
                    } else if model.len() >= 256 {
                        assert!(matches!(result, Err(StreamError::QueueFull { .. })));
                    } else {
                        result.unwrap();
                        model.insert(key, priority);
                    }
                }
                2 => match queue.dequeue() {
                    Some((key, priority)) => {
                        let min = model.values().copied().min();
                        assert_eq!(Some(priority), min, "step {step}");
                        assert_eq!(model.remove(&key), Some(priority));
                    }
                    None => assert!(model.is_empty()),
                },
                _ => {
                    let key = rng.gen_range(0..400u32);
                    if rng.gen_bool(0.5) {
                        let result = queue.remove(&key);
                        match model.remove(&key) {
                            Some(priority) => assert_eq!(result.unwrap(), priority),
                            None => assert!(result.is_err()),
                        }
                    } else {
                        let priority = rng.gen_range(0..100i64);
                        let result = queue.update_priority(&key, priority);
                        match model.get_mut(&key) {
                            Some(p) => {
                                result.unwrap();
                                *p = priority;
                            }
                            None => assert!(result.is_err()),
                        }
                    }
                }
            }
            assert!(queue.heap_property_holds(), "heap broken at step {step}");
            assert_eq!(queue.len(), model.len());
        }
    }
}
