//! Cache storage implementations.
//!
//! The builder only sees [`CacheStore`]; values are serialized menu trees.

use std::{
    num::NonZeroUsize,
    path::PathBuf,
    sync::RwLock,
    time::{Duration, Instant},
};

use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tracing::debug;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_EVICT: &str = "menutree_cache_evict_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "menutree_cache_expired_total";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache key `{0}` cannot be stored")]
    InvalidKey(String),
    #[error("cache io error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Key-value store holding serialized menu trees.
pub trait CacheStore: Send + Sync {
    fn has(&self, key: &str) -> bool;

    /// `Ok(None)` when the key is absent or has expired.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
}

struct StoredValue {
    value: String,
    stored_at: Instant,
}

/// In-process menu cache.
///
/// Uses LRU eviction bounded by `capacity` and an optional time-to-live.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, StoredValue>>,
    ttl: Option<Duration>,
}

impl MemoryCacheStore {
    /// Create a new store with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_capacity(config.capacity_non_zero(), config.ttl)
    }

    pub fn with_capacity(capacity: NonZeroUsize, ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    fn is_fresh(&self, stored: &StoredValue) -> bool {
        self.ttl
            .is_none_or(|ttl| stored.stored_at.elapsed() <= ttl)
    }
}

impl CacheStore for MemoryCacheStore {
    fn has(&self, key: &str) -> bool {
        rw_read(&self.entries, SOURCE, "has")
            .peek(key)
            .is_some_and(|stored| self.is_fresh(stored))
    }

    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let fresh = entries.peek(key).map(|stored| self.is_fresh(stored));

        match fresh {
            Some(true) => Ok(entries.get(key).map(|stored| stored.value.clone())),
            Some(false) => {
                entries.pop(key);
                counter!(METRIC_CACHE_EXPIRED).increment(1);
                debug!(key, "Dropped expired menu cache entry");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let stored = StoredValue {
            value,
            stored_at: Instant::now(),
        };

        let displaced = rw_write(&self.entries, SOURCE, "set").push(key.to_string(), stored);
        if let Some((evicted, _)) = displaced
            && evicted != key
        {
            counter!(METRIC_CACHE_EVICT).increment(1);
            debug!(key = %evicted, "Evicted menu cache entry at capacity");
        }
        Ok(())
    }
}
