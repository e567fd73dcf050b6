//! Remote key-value store clients.
//!
//! Provides two [`crate::domain::repositories::RemoteStore`] implementations:
//! - [`RedisStore`] - Production Redis client with RESP3 client tracking
//! - [`InMemoryStore`] - In-process store for tests and local development

mod memory_store;
mod redis_store;

pub use memory_store::InMemoryStore;
pub use redis_store::RedisStore;
