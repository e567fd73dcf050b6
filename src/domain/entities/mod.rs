//! Core domain entities representing the lookup data model.
//!
//! Entities are plain data structures; the caching and redirect behaviour lives in
//! the application and infrastructure layers.
//!
//! # Entity Types
//!
//! - [`CacheEntry`] - A locally cached copy of a remote store value
//! - [`RedirectTarget`] - The canonical URL of an inbound request, used as lookup key
//! - [`SeedEntry`] - A key/target pair inserted into the store at startup

pub mod cache_entry;
pub mod redirect_target;
pub mod seed_entry;

pub use cache_entry::{CacheEntry, CachePolicy};
pub use redirect_target::{RedirectTarget, Scheme};
pub use seed_entry::SeedEntry;
