use fnv::FnvHashMap;
use tracing::debug;

use crate::poolstore::cache::eviction::EvictionPolicy;
use crate::poolstore::cache::prefetch::{NoPrefetch, PrefetchPolicy};
use crate::poolstore::common::{Error, ObjectId, Result};
use crate::poolstore::store::{GetFuture, ObjectCodec, ObjectStore};

/// A bounded per-client cache over the typed store. Entries are either
/// materialized values or reads still in flight from a prefetch.
enum CacheEntry<T, C> {
    Value(T),
    Prefetched(GetFuture<T, C>),
}

/// Caches objects by id in front of an ObjectStore, delegating room-making to
/// an eviction policy and read-ahead to a prefetch policy.
pub struct CacheManager<T: Clone, C: ObjectCodec<T> + Clone> {
    store: ObjectStore<T, C>,
    cache: FnvHashMap<ObjectId, CacheEntry<T, C>>,
    max_size: usize,
    eviction_policy: Box<dyn EvictionPolicy>,
    prefetch_policy: Box<dyn PrefetchPolicy<T>>,
}

impl<T: Clone, C: ObjectCodec<T> + Clone> CacheManager<T, C> {
    /// cache_size must be at least one.
    pub fn new(
        store: ObjectStore<T, C>,
        eviction_policy: Box<dyn EvictionPolicy>,
        cache_size: usize,
    ) -> Result<Self> {
        if cache_size < 1 {
            return Err(Error::cache_capacity());
        }
        Ok(CacheManager {
            store,
            cache: FnvHashMap::default(),
            max_size: cache_size,
            eviction_policy,
            prefetch_policy: Box::new(NoPrefetch),
        })
    }

    /// Swap the prefetch policy. Pass OrderedPrefetch to read ahead over a
    /// contiguous id range, NoPrefetch to turn read-ahead off.
    pub fn set_prefetch(&mut self, policy: Box<dyn PrefetchPolicy<T>>) {
        self.prefetch_policy = policy;
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Number of entries currently held, materialized or in flight.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn contains(&self, oid: ObjectId) -> bool {
        self.cache.contains_key(&oid)
    }

    /// Return the object stored under oid, from the cache when possible.
    /// A hit on a prefetched entry awaits the in-flight read and materializes
    /// it; a miss fetches synchronously through the store.
    pub async fn get(&mut self, oid: ObjectId) -> Result<T> {
        if let Some(CacheEntry::Value(value)) = self.cache.get(&oid) {
            let value = value.clone();
            self.run_prefetch(oid, &value)?;
            return Ok(value);
        }

        let value = if self.cache.contains_key(&oid) {
            let future = match self.cache.remove(&oid) {
                Some(CacheEntry::Prefetched(future)) => future,
                _ => unreachable!(),
            };
            // A failed prefetch propagates its error; the entry stays gone so
            // a later get retries against the server.
            let value = future.get().await?;
            self.cache.insert(oid, CacheEntry::Value(value.clone()));
            value
        } else {
            let value = self.store.get(oid).await?;
            self.insert_entry(oid, CacheEntry::Value(value.clone()))?;
            value
        };

        self.run_prefetch(oid, &value)?;
        Ok(value)
    }

    /// Write the object through to the store. No cache entry is created, but
    /// the insertion is still recorded with the eviction policy, and an entry
    /// already present for oid is overwritten so later gets see this value.
    pub async fn put(&mut self, oid: ObjectId, value: T) -> Result<()> {
        self.store.put(oid, &value).await?;
        for evicted in self.eviction_policy.insert(oid) {
            self.cache.remove(&evicted);
        }
        if let Some(entry) = self.cache.get_mut(&oid) {
            *entry = CacheEntry::Value(value);
        }
        Ok(())
    }

    /// Drop the local entry, abandoning any in-flight prefetch, and remove
    /// the object from the store.
    pub async fn remove(&mut self, oid: ObjectId) -> Result<bool> {
        self.cache.remove(&oid);
        self.store.remove(oid).await
    }

    /// Start an asynchronous read for oid and hold it in the cache so a later
    /// get finds the data already on its way. Does nothing when an entry for
    /// oid already exists.
    pub fn prefetch(&mut self, oid: ObjectId) -> Result<()> {
        if !self.cache.contains_key(&oid) {
            debug!(oid, "prefetching");
            let future = self.store.get_async(oid);
            self.insert_entry(oid, CacheEntry::Prefetched(future))?;
        }
        Ok(())
    }

    /// Consult the eviction policy for the insertion, drop what it names,
    /// then insert. The cache can only stay over capacity if the policy
    /// refuses to make room, which is reported as a capacity error.
    fn insert_entry(&mut self, oid: ObjectId, entry: CacheEntry<T, C>) -> Result<()> {
        for evicted in self.eviction_policy.insert(oid) {
            debug!(oid = evicted, "evicting");
            self.cache.remove(&evicted);
        }
        if self.cache.len() >= self.max_size {
            return Err(Error::cache_capacity());
        }
        self.cache.insert(oid, entry);
        Ok(())
    }

    fn run_prefetch(&mut self, oid: ObjectId, value: &T) -> Result<()> {
        let ids = self.prefetch_policy.accessed(oid, value)?;
        for id in ids {
            self.prefetch(id)?;
        }
        Ok(())
    }
}
