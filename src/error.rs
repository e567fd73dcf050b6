//! Handler errors and their HTTP representation.
//!
//! The response body is always the generic status text; the details carried by
//! each variant are for logs only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no redirect target for {key}")]
    NotFound { key: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = status.canonical_reason().unwrap_or("Error");

        (status, body).into_response()
    }
}
