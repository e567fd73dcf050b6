//! Bounded map of locally cached entries.
//!
//! Expired entries are evicted lazily on `get()`; [`LocalCache::evict_expired`]
//! sweeps the rest. Once `max_entries` is reached, inserting a new key evicts the
//! least recently used one.

use crate::domain::entities::CacheEntry;
use crate::domain::entities::cache_entry::DEFAULT_MAX_ENTRIES;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tokio::time::Instant;

/// Key to [`CacheEntry`] map shared by all request handlers.
pub struct LocalCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl LocalCache {
    /// Creates a cache holding at most `max_entries` entries (at least one).
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns a clone of the entry if present and not expired.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            entries.pop(key);
            None
        } else {
            Some(entry.clone())
        }
    }

    /// Stores `entry`, replacing any entry for the same key.
    ///
    /// Returns the key evicted to make room, if the cache was full.
    pub fn insert(&self, entry: CacheEntry) -> Option<String> {
        let key = entry.key.clone();
        match self.entries.lock().push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }

    /// Removes `key`. Returns true if an entry was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Removes all expired entries and returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Number of entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
