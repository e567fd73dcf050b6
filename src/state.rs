//! Shared state injected into the redirect handler.

use crate::domain::repositories::LookupCache;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<dyn LookupCache>,
    /// Time allowed for a single lookup, measured from request arrival.
    pub lookup_timeout: Duration,
    /// Whether `X-Forwarded-Proto` decides the scheme of the lookup key.
    pub trust_forwarded_proto: bool,
}

impl AppState {
    pub fn new(
        lookup: Arc<dyn LookupCache>,
        lookup_timeout: Duration,
        trust_forwarded_proto: bool,
    ) -> Self {
        Self {
            lookup,
            lookup_timeout,
            trust_forwarded_proto,
        }
    }
}
