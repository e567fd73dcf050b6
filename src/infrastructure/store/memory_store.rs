//! In-process remote store for tests and local development.

use crate::domain::repositories::{
    RemoteStore, SetOutcome, StoreError, StoreEvent, StoreResult, StoredValue,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

const EVENT_CAPACITY: usize = 1024;

struct StoredEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A [`RemoteStore`] kept entirely in process memory.
///
/// Behaves like a tracking Redis client: every write notifies subscribers with an
/// invalidation for the written key. It also exposes knobs that a networked
/// store cannot offer:
///
/// - [`InMemoryStore::fetch_count`] counts `get` round-trips
/// - [`InMemoryStore::fail_with`] makes every operation fail with a given error
/// - [`InMemoryStore::set_invalidation_delivery`] stops or resumes push delivery
pub struct InMemoryStore {
    entries: DashMap<String, StoredEntry>,
    events: broadcast::Sender<StoreEvent>,
    fetches: AtomicUsize,
    failure: RwLock<Option<StoreError>>,
    deliver_invalidations: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        debug!("Using InMemoryStore");
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: DashMap::new(),
            events,
            fetches: AtomicUsize::new(0),
            failure: RwLock::new(None),
            deliver_invalidations: AtomicBool::new(true),
        }
    }

    /// Writes a value unconditionally, like a plain `SET`.
    pub fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        self.notify(StoreEvent::Invalidate(vec![key.to_string()]));
    }

    /// Removes a key. Returns true if it existed.
    pub fn delete(&self, key: &str) -> bool {
        let existed = self.entries.remove(key).is_some();
        if existed {
            self.notify(StoreEvent::Invalidate(vec![key.to_string()]));
        }
        existed
    }

    /// Removes every key, like `FLUSHDB`.
    pub fn flush(&self) {
        self.entries.clear();
        self.notify(StoreEvent::InvalidateAll);
    }

    /// Number of `get` calls served so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Makes every subsequent operation fail with `error`; `None` restores service.
    pub fn fail_with(&self, error: Option<StoreError>) {
        *self.failure.write() = error;
    }

    /// Enables or disables delivery of invalidation events.
    ///
    /// While disabled, writes are silent, the same as a client whose push
    /// connection dropped without notice.
    pub fn set_invalidation_delivery(&self, enabled: bool) {
        self.deliver_invalidations.store(enabled, Ordering::SeqCst);
    }

    /// Emits [`StoreEvent::Disconnected`] to all subscribers.
    pub fn simulate_disconnect(&self) {
        let _ = self.events.send(StoreEvent::Disconnected);
    }

    fn notify(&self, event: StoreEvent) {
        if self.deliver_invalidations.load(Ordering::SeqCst) {
            let _ = self.events.send(event);
        }
    }

    fn check_available(&self) -> StoreResult<()> {
        match self.failure.read().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let now = Instant::now();
        // Expired keys are removed lazily, as Redis does on access.
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            return Ok(None);
        }

        Ok(self.entries.get(key).map(|entry| StoredValue {
            value: entry.value.clone(),
            ttl: entry.expires_at.map(|at| at.saturating_duration_since(now)),
        }))
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<SetOutcome> {
        self.check_available()?;

        let now = Instant::now();
        let inserted = match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(StoredEntry {
                        value: value.to_string(),
                        expires_at: Some(now + ttl),
                    });
                    true
                } else {
                    false
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(StoredEntry {
                    value: value.to_string(),
                    expires_at: Some(now + ttl),
                });
                true
            }
        };

        if inserted {
            self.notify(StoreEvent::Invalidate(vec![key.to_string()]));
            Ok(SetOutcome::Inserted)
        } else {
            Ok(SetOutcome::AlreadyExists)
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
