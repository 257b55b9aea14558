use crate::poolstore::common::{Error, ObjectId, Result};

/// Consulted after every successful cache get with the id and value just
/// returned. Returns the ids to read ahead of demand.
pub trait PrefetchPolicy<T>: Send {
    fn accessed(&mut self, oid: ObjectId, value: &T) -> Result<Vec<ObjectId>>;
}

/// Performs no prefetching. The default mode of a cache manager.
pub struct NoPrefetch;

impl<T> PrefetchPolicy<T> for NoPrefetch {
    fn accessed(&mut self, _oid: ObjectId, _value: &T) -> Result<Vec<ObjectId>> {
        Ok(Vec::new())
    }
}

/// Prefetches the next read_ahead ids after each access, wrapping around a
/// contiguous id range known to hold objects.
pub struct OrderedPrefetch {
    first: ObjectId,
    last: ObjectId,
    read_ahead: u64,
}

impl OrderedPrefetch {
    pub fn new(first: ObjectId, last: ObjectId, read_ahead: u64) -> Result<Self> {
        if first > last {
            return Err(Error::bounds(format!(
                "invalid prefetch range [{}, {}]",
                first, last
            )));
        }
        Ok(OrderedPrefetch {
            first,
            last,
            read_ahead,
        })
    }
}

impl<T> PrefetchPolicy<T> for OrderedPrefetch {
    fn accessed(&mut self, oid: ObjectId, _value: &T) -> Result<Vec<ObjectId>> {
        if oid < self.first || oid > self.last {
            return Err(Error::bounds(format!(
                "id {} is outside the range [{}, {}] set when ordered prefetching was enabled",
                oid, self.first, self.last
            )));
        }
        // val = (((oid + i) - first) % (last - first + 1)) + first
        let span = self.last - self.first + 1;
        Ok((1..=self.read_ahead)
            .map(|i| ((oid + i - self.first) % span) + self.first)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_wraps_around_range() {
        let mut policy = OrderedPrefetch::new(5, 9, 3).unwrap();
        let ids = PrefetchPolicy::<u32>::accessed(&mut policy, 8, &0).unwrap();
        assert_eq!(ids, vec![9, 5, 6]);
    }

    #[test]
    fn test_ordered_rejects_id_outside_range() {
        let mut policy = OrderedPrefetch::new(0, 9, 1).unwrap();
        assert!(PrefetchPolicy::<u32>::accessed(&mut policy, 42, &0).is_err());
    }

    #[test]
    fn test_none_prefetches_nothing() {
        let mut policy = NoPrefetch;
        assert!(PrefetchPolicy::<u32>::accessed(&mut policy, 3, &0)
            .unwrap()
            .is_empty());
    }
}
