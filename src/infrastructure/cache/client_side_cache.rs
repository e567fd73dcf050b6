//! Client-side cache in front of the remote store.

use super::local_cache::LocalCache;
use crate::domain::entities::{CacheEntry, CachePolicy};
use crate::domain::repositories::{RemoteStore, StoreEvent, StoreResult};
use dashmap::DashMap;
use metrics::counter;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Fetches currently running for one key.
struct InFlight {
    fetchers: usize,
    /// Bumped by every invalidation of the key while fetches are running.
    generation: u64,
}

/// Registration of one running fetch; unregisters on drop, including when the
/// fetch future is cancelled by the request deadline.
struct FetchTicket<'a> {
    in_flight: &'a DashMap<String, InFlight>,
    key: &'a str,
    generation: u64,
}

impl<'a> FetchTicket<'a> {
    fn register(in_flight: &'a DashMap<String, InFlight>, key: &'a str) -> Self {
        let mut entry = in_flight.entry(key.to_string()).or_insert(InFlight {
            fetchers: 0,
            generation: 0,
        });
        entry.fetchers += 1;
        let generation = entry.generation;
        drop(entry);

        Self {
            in_flight,
            key,
            generation,
        }
    }

    /// True if the key was invalidated after this fetch was registered.
    fn invalidated(&self) -> bool {
        self.in_flight
            .get(self.key)
            .is_none_or(|entry| entry.generation != self.generation)
    }
}

impl Drop for FetchTicket<'_> {
    fn drop(&mut self) {
        self.in_flight.remove_if_mut(self.key, |_, entry| {
            entry.fetchers -= 1;
            entry.fetchers == 0
        });
    }
}

/// Caches remote store reads in process memory.
///
/// Entries are dropped when their local TTL passes or when the store pushes an
/// invalidation for their key. The local TTL ceiling in [`CachePolicy`] is the only
/// staleness bound when invalidation delivery is lost. At most
/// [`CachePolicy::max_entries`] entries are held; the least recently used goes
/// first.
///
/// Misses are cached as negative entries with the shorter negative TTL. There is
/// no single-flight: concurrent misses for the same key each issue a fetch.
pub struct ClientSideCache {
    store: Arc<dyn RemoteStore>,
    local: LocalCache,
    policy: CachePolicy,
    in_flight: DashMap<String, InFlight>,
}

impl ClientSideCache {
    pub fn new(store: Arc<dyn RemoteStore>, policy: CachePolicy) -> Self {
        Self {
            store,
            local: LocalCache::new(policy.max_entries),
            policy,
            in_flight: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Returns the value for `key`, from the local cache when fresh.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` if the key exists upstream
    /// - `Ok(None)` if it does not (possibly answered from a cached miss)
    ///
    /// # Errors
    ///
    /// Propagates the store error when a remote fetch fails. Failures are not cached.
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        if let Some(entry) = self.local.get(key) {
            debug!("Local cache HIT: {}", key);
            counter!("redirector_local_cache_total", "result" => "hit").increment(1);
            return Ok(entry.value);
        }

        debug!("Local cache MISS: {}", key);
        counter!("redirector_local_cache_total", "result" => "miss").increment(1);

        let ticket = FetchTicket::register(&self.in_flight, key);
        let fetched = self.store.get(key).await?;
        counter!("redirector_remote_fetches_total").increment(1);

        let (value, remote_ttl) = match fetched {
            Some(stored) => (Some(stored.value), stored.ttl),
            None => (None, None),
        };

        let evicted = self.local.insert(CacheEntry::new(
            key,
            value.clone(),
            remote_ttl,
            &self.policy,
        ));
        if let Some(evicted) = evicted {
            debug!("Local cache full; evicted {}", evicted);
            counter!("redirector_local_cache_evictions_total").increment(1);
        }

        // An invalidation that arrived while the fetch was in flight may refer to
        // a newer value than the one just stored.
        if ticket.invalidated() {
            debug!("Invalidation raced with fetch of {}; not caching", key);
            self.local.remove(key);
        }

        Ok(value)
    }

    /// Evicts `key` immediately, regardless of its remaining TTL.
    pub fn invalidate(&self, key: &str) {
        if let Some(mut entry) = self.in_flight.get_mut(key) {
            entry.generation += 1;
        }
        if self.local.remove(key) {
            debug!("Local cache INVALIDATE: {}", key);
        }
    }

    /// Evicts every entry.
    pub fn invalidate_all(&self) {
        for mut entry in self.in_flight.iter_mut() {
            entry.generation += 1;
        }
        self.local.clear();
        debug!("Local cache cleared");
    }

    /// Applies a store event to the local cache.
    pub fn apply(&self, event: &StoreEvent) {
        counter!("redirector_invalidations_total").increment(1);
        match event {
            StoreEvent::Invalidate(keys) => {
                for key in keys {
                    self.invalidate(key);
                }
            }
            StoreEvent::InvalidateAll => self.invalidate_all(),
            StoreEvent::Disconnected => {
                warn!("Invalidation channel disconnected; clearing local cache");
                self.invalidate_all();
            }
        }
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn evict_expired(&self) -> usize {
        self.local.evict_expired()
    }

    pub fn len(&self) -> usize {
        self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty()
    }

    /// Spawns the task that applies invalidation events pushed by the store.
    ///
    /// The subscription is taken before this returns, so no event sent afterwards
    /// is missed. The task ends when the store closes its channel or the cache is
    /// dropped.
    pub fn spawn_invalidation_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.store.subscribe();
        let cache: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let received = events.recv().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };

                match received {
                    Ok(event) => cache.apply(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            skipped,
                            "Invalidation events lagged; clearing local cache"
                        );
                        cache.invalidate_all();
                    }
                    Err(RecvError::Closed) => {
                        warn!(
                            "Invalidation channel closed; local TTL ceiling ({:?}) is now the only staleness bound",
                            cache.policy.local_ttl
                        );
                        break;
                    }
                }
            }
        })
    }

    /// Spawns a task that evicts expired entries every `period`.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let evicted = cache.evict_expired();
                if evicted > 0 {
                    info!("Evicted {} expired local cache entries", evicted);
                }
            }
        })
    }
}
