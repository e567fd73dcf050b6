//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `ANY /*` - redirect lookup for the full request URL (fallback)
//!
//! There are no other routes: every path is a potential redirect key, so a
//! reserved path such as `/health` would shadow a stored mapping.
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging

use crate::api::handlers::redirect_handler;
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;

/// Constructs the application router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .fallback(redirect_handler)
        .with_state(state)
        .layer(tracing::layer())
}
