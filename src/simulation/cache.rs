//! Bounded memoization of predicate evaluations
//!
//! Keyed by a caller-supplied configuration identity (frame index, hash of
//! coordinates, ...). Owned by one driver; nothing is shared or global.

use std::collections::{HashMap, VecDeque};

use crate::tracker::Membership;

/// FIFO-evicting cache of classification results
#[derive(Debug, Clone)]
pub struct ClassificationCache {
    capacity: usize,
    entries: HashMap<u64, Membership>,
    order: VecDeque<u64>,
    hits: u64,
    misses: u64,
}

impl ClassificationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached membership for `key`, counting the hit or miss
    pub fn get(&mut self, key: u64) -> Option<&Membership> {
        match self.entries.get(&key) {
            Some(m) => {
                self.hits += 1;
                Some(m)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Remember `membership`, evicting the oldest entry when full
    pub fn insert(&mut self, key: u64, membership: Membership) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key, membership).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
