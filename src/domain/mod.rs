//! Domain layer containing the lookup data model and capability traits.
//!
//! # Architecture
//!
//! - [`entities`] - Cache entries, redirect targets and seed pairs
//! - [`repositories`] - Remote store and lookup cache trait definitions
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Traits define contracts implemented by the infrastructure and application layers
//!
//! # Lookup Flow
//!
//! 1. HTTP handler derives a [`entities::RedirectTarget`] key from the request
//! 2. [`repositories::LookupCache`] resolves the key
//! 3. The client-side cache answers locally or fetches through [`repositories::RemoteStore`]
//! 4. Invalidation events from the store evict local [`entities::CacheEntry`] values

pub mod entities;
pub mod repositories;
