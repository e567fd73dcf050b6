//! Utility functions for request handling.
//!
//! - [`request_key`] - Canonical lookup key derivation from HTTP requests

pub mod request_key;
