//! Business logic services for the application layer.

pub mod lookup_service;
pub mod seed_service;

pub use lookup_service::LookupService;
pub use seed_service::{SeedError, SeedReport, SeedService, load_seed_entries};
