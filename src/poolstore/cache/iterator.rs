use crate::poolstore::cache::cache_manager::CacheManager;
use crate::poolstore::common::{Error, ObjectId, Result};
use crate::poolstore::store::ObjectCodec;

/// Forward cursor over the objects stored under a contiguous id range.
/// Each step prefetches read_ahead ids past the cursor (wrapping within the
/// range) before returning the current value through the cache manager, so a
/// sequential scan keeps the next reads in flight.
pub struct CacheIterator<'a, T: Clone, C: ObjectCodec<T> + Clone> {
    cm: &'a mut CacheManager<T, C>,
    first: ObjectId,
    last: ObjectId,
    read_ahead: u64,
    current: ObjectId,
}

impl<'a, T: Clone, C: ObjectCodec<T> + Clone> CacheIterator<'a, T, C> {
    /// Requires first <= last, read_ahead <= last - first, and read_ahead
    /// smaller than the cache capacity (otherwise prefetched entries would
    /// evict each other before they are consumed).
    pub fn new(
        cm: &'a mut CacheManager<T, C>,
        read_ahead: u64,
        first: ObjectId,
        last: ObjectId,
    ) -> Result<Self> {
        if first > last {
            return Err(Error::bounds(format!("invalid id range [{}, {}]", first, last)));
        }
        if read_ahead > last - first {
            return Err(Error::bounds(format!(
                "read_ahead {} exceeds the id range [{}, {}]",
                read_ahead, first, last
            )));
        }
        if read_ahead >= cm.capacity() as u64 {
            return Err(Error::bounds(format!(
                "read_ahead {} must be smaller than the cache capacity {}",
                read_ahead,
                cm.capacity()
            )));
        }
        Ok(CacheIterator {
            cm,
            first,
            last,
            read_ahead,
            current: first,
        })
    }

    pub fn current_id(&self) -> ObjectId {
        self.current
    }

    /// Advance the cursor, returning None once the whole range was visited.
    pub async fn next(&mut self) -> Option<Result<T>> {
        if self.current > self.last {
            return None;
        }
        let span = self.last - self.first + 1;
        for i in 1..=self.read_ahead {
            let id = ((self.current + i - self.first) % span) + self.first;
            if let Err(e) = self.cm.prefetch(id) {
                return Some(Err(e));
            }
        }
        let result = self.cm.get(self.current).await;
        self.current += 1;
        Some(result)
    }
}
