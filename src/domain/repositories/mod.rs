//! Capability traits for the domain layer.
//!
//! These traits abstract the remote key-value store and the lookup facade so the
//! HTTP layer and the caching layer can each be tested against fakes.
//!
//! # Architecture
//!
//! - Traits define the contract for store and lookup operations
//! - Implementations live in `crate::infrastructure` and `crate::application`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Traits
//!
//! - [`RemoteStore`] - GET / SET-if-absent / invalidation push channel
//! - [`LookupCache`] - Key to redirect target resolution with miss/error distinction

pub mod lookup_cache;
pub mod remote_store;

pub use lookup_cache::{LookupCache, LookupError, LookupOutcome, LookupResult};
pub use remote_store::{
    RemoteStore, SetOutcome, StoreError, StoreEvent, StoreResult, StoredValue,
};

#[cfg(test)]
pub use lookup_cache::MockLookupCache;
#[cfg(test)]
pub use remote_store::MockRemoteStore;
