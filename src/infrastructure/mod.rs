//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete remote store clients and the in-process client-side cache.
//!
//! # Modules
//!
//! - [`store`] - Remote store clients (Redis and in-memory implementations)
//! - [`cache`] - Client-side cache with local TTL and push invalidation

pub mod cache;
pub mod store;
