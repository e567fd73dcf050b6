//! Client-side caching layer for fast redirect lookups.
//!
//! - [`LocalCache`] - Concurrent map of [`crate::domain::entities::CacheEntry`] values
//! - [`ClientSideCache`] - Read-through cache over a remote store with push invalidation

mod client_side_cache;
mod local_cache;

pub use client_side_cache::ClientSideCache;
pub use local_cache::LocalCache;
