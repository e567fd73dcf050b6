//! Key/target pairs inserted into the remote store at startup.

use serde::Deserialize;

/// A single startup mapping from a canonical request URL to its redirect target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedEntry {
    pub key: String,
    pub target: String,
}

impl SeedEntry {
    pub fn new(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
        }
    }

    /// The mappings installed when no seed file is configured.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("http://localhost:8080/", "https://www.google.com/"),
            Self::new("http://localhost:8080/yahoo", "https://www.yahoo.com/"),
        ]
    }
}
