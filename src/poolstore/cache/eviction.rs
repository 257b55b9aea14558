use std::collections::VecDeque;

use crate::poolstore::common::ObjectId;

/// Consulted by the cache manager with the id of every insertion (demand
/// fills, prefetch fills, and write-throughs all count). Returns the ids the
/// cache must drop to make room.
pub trait EvictionPolicy: Send {
    fn insert(&mut self, oid: ObjectId) -> Vec<ObjectId>;
}

/// Evicts in least-recently-added order: once the recorded insertions reach
/// the cache capacity, each further insertion pushes out the oldest one.
pub struct LRAddedEvictionPolicy {
    queue: VecDeque<ObjectId>,
    max_in_cache: usize,
}

impl LRAddedEvictionPolicy {
    pub fn new(max_in_cache: usize) -> Self {
        LRAddedEvictionPolicy {
            queue: VecDeque::with_capacity(max_in_cache + 1),
            max_in_cache,
        }
    }
}

impl EvictionPolicy for LRAddedEvictionPolicy {
    fn insert(&mut self, oid: ObjectId) -> Vec<ObjectId> {
        self.queue.push_back(oid);
        if self.queue.len() > self.max_in_cache {
            // pop_front cannot return None here
            self.queue.pop_front().into_iter().collect()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The policy returns the single oldest item, and only once at capacity.
    #[test]
    fn test_lradded() {
        let mut policy = LRAddedEvictionPolicy::new(10);
        for i in 0..10 {
            assert!(policy.insert(i).is_empty(), "item evicted when cache not full");
        }
        for i in 10..20 {
            let evicted = policy.insert(i);
            assert_eq!(evicted.len(), 1);
            assert_eq!(evicted[0], i - 10, "item returned was not oldest in the cache");
        }
    }
}
