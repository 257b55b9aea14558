mod cache_manager;
mod eviction;
mod iterator;
mod prefetch;

pub use self::cache_manager::CacheManager;
pub use self::eviction::{EvictionPolicy, LRAddedEvictionPolicy};
pub use self::iterator::CacheIterator;
pub use self::prefetch::{NoPrefetch, OrderedPrefetch, PrefetchPolicy};
