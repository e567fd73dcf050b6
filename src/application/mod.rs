//! Application layer services implementing the lookup and seeding logic.
//!
//! Services consume the domain traits and infrastructure components and expose a
//! small API to the HTTP handler and the server startup sequence.
//!
//! # Available Services
//!
//! - [`services::lookup_service::LookupService`] - Lookup facade with miss/error translation
//! - [`services::seed_service::SeedService`] - Idempotent startup seeding

pub mod services;
