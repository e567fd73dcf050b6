//! Contract for the remote key-value store of record.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

/// Errors reported by a remote store client.
///
/// A missing key is never an error; see [`RemoteStore::get`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("remote store connection error: {0}")]
    Connection(String),
    #[error("remote store protocol error: {0}")]
    Protocol(String),
    #[error("remote store returned an unreadable value: {0}")]
    InvalidValue(String),
}

/// Result type for remote store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A value read from the store together with its remaining server-side TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    /// `None` when the key has no expiry.
    pub ttl: Option<Duration>,
}

/// Outcome of a set-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    AlreadyExists,
}

/// Notifications pushed by the store to clients holding cached copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The listed keys changed upstream.
    Invalidate(Vec<String>),
    /// Every tracked key is stale (e.g. the server was flushed).
    InvalidateAll,
    /// The push channel was lost; invalidations may have been missed.
    Disconnected,
}

/// Remote key-value store with server-pushed invalidation.
///
/// Implementations must be thread-safe. A single instance is constructed at
/// startup and shared through `Arc<dyn RemoteStore>`.
///
/// # Implementations
///
/// - [`crate::infrastructure::store::RedisStore`] - Redis with RESP3 client tracking
/// - [`crate::infrastructure::store::InMemoryStore`] - In-process store for tests and development
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads a key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` if the key exists
    /// - `Ok(None)` if the key is absent (the store's "nil" reply)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on network, protocol or decoding failures.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredValue>>;

    /// Writes `value` under `key` with `ttl` only if the key does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write could not be performed.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
    -> StoreResult<SetOutcome>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Subscribes to invalidation events for keys this client has read.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
