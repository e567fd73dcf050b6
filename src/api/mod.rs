//! HTTP layer of the redirector.
//!
//! # Modules
//!
//! - [`handlers`] - the redirect handler
//! - [`middleware`] - request tracing

pub mod handlers;
pub mod middleware;
