//! Contract between the redirect handler and the caching layer.

use super::remote_store::StoreError;
use async_trait::async_trait;
use tokio::time::Instant;

/// Genuine lookup failures. A missing key is reported as [`LookupOutcome::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup error: {0}")]
    Store(#[from] StoreError),
    #[error("lookup deadline exceeded")]
    DeadlineExceeded,
}

/// Successful lookup outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(String),
    /// The key is absent upstream or maps to an empty value.
    NotFound,
}

/// Result of a single lookup: found, not found, or failed.
pub type LookupResult = Result<LookupOutcome, LookupError>;

/// Resolves canonical request URLs to redirect targets.
///
/// # Implementations
///
/// - [`crate::application::services::LookupService`] - Client-side cache over a remote store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupCache: Send + Sync {
    /// Looks up `key`, giving up once `deadline` passes.
    ///
    /// # Returns
    ///
    /// - `Ok(LookupOutcome::Found(target))` on a hit
    /// - `Ok(LookupOutcome::NotFound)` when the key does not exist upstream
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the store cannot be reached, replies with a
    /// protocol error, or does not answer before `deadline`.
    async fn lookup(&self, key: &str, deadline: Instant) -> LookupResult;
}
