//! Locally cached copy of a remote store value.

use std::time::Duration;
use tokio::time::Instant;

/// Default local TTL ceiling (1 hour).
///
/// Needed in case the connection drops and invalidation events are missed.
pub const DEFAULT_LOCAL_TTL: Duration = Duration::from_secs(3600);

/// Default trust window for cached misses (30 seconds).
pub const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(30);

/// Default number of entries held locally before the least recently used is evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Trust windows applied to freshly fetched values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum time any entry is trusted without a new fetch.
    pub local_ttl: Duration,
    /// Time a "key absent" result is trusted. Never exceeds `local_ttl`.
    pub negative_ttl: Duration,
    /// Upper bound on locally held entries, positive and negative together.
    pub max_entries: usize,
}

impl CachePolicy {
    /// Creates a policy, clamping `negative_ttl` to the local ceiling.
    pub fn new(local_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            local_ttl,
            negative_ttl: negative_ttl.min(local_ttl),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Sets the entry limit. Zero is raised to one.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    /// Returns how long a fetched value may be served from the local cache.
    ///
    /// Positive values are bounded by both the local ceiling and the remaining
    /// remote TTL; absent or empty values use the negative TTL.
    pub fn ttl_for(&self, value: Option<&str>, remote_ttl: Option<Duration>) -> Duration {
        match value {
            Some(v) if !v.is_empty() => remote_ttl
                .map(|remote| remote.min(self.local_ttl))
                .unwrap_or(self.local_ttl),
            _ => self.negative_ttl,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_TTL, DEFAULT_NEGATIVE_TTL)
    }
}

/// A value fetched from the remote store and held in the client-side cache.
///
/// `value: None` is a cached miss: the key did not exist upstream at fetch time.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Option<String>,
    /// Remaining server-side TTL reported with the value, if the key expires.
    pub remote_ttl: Option<Duration>,
    /// Effective local trust window derived from [`CachePolicy::ttl_for`].
    pub local_ttl: Duration,
    pub fetched_at: Instant,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        key: impl Into<String>,
        value: Option<String>,
        remote_ttl: Option<Duration>,
        policy: &CachePolicy,
    ) -> Self {
        let local_ttl = policy.ttl_for(value.as_deref(), remote_ttl);
        Self {
            key: key.into(),
            value,
            remote_ttl,
            local_ttl,
            fetched_at: Instant::now(),
        }
    }

    /// Instant after which the entry must be refetched.
    pub fn expires_at(&self) -> Instant {
        self.fetched_at + self.local_ttl
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    /// Returns true if this entry records a miss.
    pub fn is_negative(&self) -> bool {
        self.value.as_deref().is_none_or(str::is_empty)
    }
}
