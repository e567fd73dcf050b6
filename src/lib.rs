//! # Cached Redirector
//!
//! An HTTP redirector that maps full request URLs to target URLs stored in Redis,
//! with an in-process client-side cache kept coherent by Redis invalidation pushes.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Cache entries, redirect targets, store and lookup traits
//! - **Application Layer** ([`application`]) - Deadline-bounded lookups and startup seeding
//! - **Infrastructure Layer** ([`infrastructure`]) - Redis and in-memory stores, client-side cache
//! - **API Layer** ([`api`]) - Redirect handler and tracing middleware
//!
//! ## Request Path
//!
//! 1. The handler derives `scheme://host/path` from the request
//! 2. The client-side cache answers from memory or fetches from Redis
//! 3. The handler responds 302, 404, or 500
//!
//! Redis pushes an invalidation whenever a tracked key changes, and the cache
//! drops its copy. If the push channel is lost, the local TTL ceiling bounds
//! staleness.
//!
//! ## Quick Start
//!
//! ```bash
//! export REDIS_URL="redis://localhost:6379"
//! cargo run
//! curl -i -H 'Host: localhost:8080' http://127.0.0.1:8080/yahoo
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{LookupService, SeedService};
    pub use crate::domain::entities::{CachePolicy, SeedEntry};
    pub use crate::domain::repositories::{LookupCache, LookupOutcome, RemoteStore};
    pub use crate::error::AppError;
    pub use crate::infrastructure::cache::ClientSideCache;
    pub use crate::infrastructure::store::InMemoryStore;
    pub use crate::routes::app_router;
    pub use crate::state::AppState;
}
