//! Startup population of the remote store.

use crate::domain::entities::SeedEntry;
use crate::domain::repositories::{RemoteStore, SetOutcome, StoreError};
use crate::utils::request_key::canonical_key;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Failures that abort startup seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {reason}")]
    File { path: String, reason: String },
    #[error("invalid seed key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
    #[error("invalid redirect target for '{key}': {reason}")]
    InvalidTarget { key: String, reason: String },
    #[error("failed to seed '{key}': {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Counts of what a seeding run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub existing: usize,
}

/// Inserts the startup redirect mappings with set-if-absent semantics.
///
/// Running it again never overwrites a value written by an earlier run or by an
/// operator; the remote store stays the source of truth.
pub struct SeedService {
    store: Arc<dyn RemoteStore>,
    ttl: Duration,
}

impl SeedService {
    /// Creates a seeder that writes entries with the given remote TTL.
    pub fn new(store: Arc<dyn RemoteStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Seeds all entries.
    ///
    /// Every entry is validated before the first write, so a bad seed set leaves the
    /// store untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::InvalidKey`] or [`SeedError::InvalidTarget`] if an entry
    /// is not an absolute http(s) URL, [`SeedError::InvalidKey`] if a key is not in
    /// the canonical form requests are looked up by (lowercase host, decoded path,
    /// no query), and [`SeedError::Store`] on the first failed write. Callers treat
    /// any error as fatal.
    pub async fn seed(&self, entries: &[SeedEntry]) -> Result<SeedReport, SeedError> {
        for entry in entries {
            validate_entry(entry)?;
        }

        let mut report = SeedReport::default();

        for entry in entries {
            let outcome = self
                .store
                .set_if_absent(&entry.key, &entry.target, self.ttl)
                .await
                .map_err(|source| SeedError::Store {
                    key: entry.key.clone(),
                    source,
                })?;

            match outcome {
                SetOutcome::Inserted => {
                    info!("Seeded {} -> {}", entry.key, entry.target);
                    report.inserted += 1;
                }
                SetOutcome::AlreadyExists => {
                    debug!("Seed key {} already present, keeping it", entry.key);
                    report.existing += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Loads the seed set from a JSON file, or the built-in defaults when `path` is `None`.
///
/// The file holds an array of `{"key": ..., "target": ...}` objects.
///
/// # Errors
///
/// Returns [`SeedError::File`] if the file cannot be read or parsed.
pub fn load_seed_entries(path: Option<&Path>) -> Result<Vec<SeedEntry>, SeedError> {
    let Some(path) = path else {
        return Ok(SeedEntry::defaults());
    };

    let file_error = |reason: String| SeedError::File {
        path: path.display().to_string(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))
}

fn validate_entry(entry: &SeedEntry) -> Result<(), SeedError> {
    let invalid_key = |reason: String| SeedError::InvalidKey {
        key: entry.key.clone(),
        reason,
    };

    validate_http_url(&entry.key).map_err(invalid_key)?;

    // A key that differs from its canonical form can never be produced by a request.
    let canonical = canonical_key(&entry.key).map_err(|e| invalid_key(e.to_string()))?;
    if canonical != entry.key {
        return Err(invalid_key(format!(
            "unreachable key, requests are looked up as '{}'",
            canonical
        )));
    }

    validate_http_url(&entry.target).map_err(|reason| SeedError::InvalidTarget {
        key: entry.key.clone(),
        reason,
    })
}

fn validate_http_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("missing host".to_string());
    }

    Ok(())
}
