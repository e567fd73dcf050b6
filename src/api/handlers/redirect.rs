//! Handler for redirect lookups.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tokio::time::Instant;
use tracing::{error, info};

use crate::domain::repositories::LookupOutcome;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::request_key::derive_redirect_target;

/// Redirects any request to the target stored for its full URL.
///
/// # Endpoint
///
/// Every method and path (installed as the router fallback).
///
/// # Request Flow
///
/// 1. Derive the key `scheme://host/path` from the request
/// 2. Look the key up with a deadline of `now + lookup_timeout`
/// 3. Map the outcome to a response
///
/// # Responses
///
/// - **302 Found** with `Location` when the key has a target
/// - **404 Not Found** when the key does not exist upstream
/// - **500 Internal Server Error** when the key cannot be derived, the lookup
///   fails or times out, or the stored target is not a valid header value
///
/// There are no retries: one lookup per request.
pub async fn redirect_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let target = derive_redirect_target(&uri, &headers, state.trust_forwarded_proto)
        .map_err(|e| {
            error!(%method, uri = %uri, error = %e, "Failed to derive lookup key");
            AppError::internal(e.to_string())
        })?;
    let key = target.key();

    let deadline = Instant::now() + state.lookup_timeout;

    match state.lookup.lookup(&key, deadline).await {
        Ok(LookupOutcome::Found(destination)) => {
            let location = HeaderValue::from_str(&destination).map_err(|_| {
                error!(%key, target = %destination, "Stored target is not a valid Location header");
                AppError::internal("invalid redirect target")
            })?;

            info!(%method, %key, target = %destination, "Redirecting");
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
        Ok(LookupOutcome::NotFound) => {
            info!(%method, %key, "URL not found");
            Err(AppError::not_found(key))
        }
        Err(e) => {
            error!(%method, %key, error = %e, "Lookup failed");
            Err(AppError::internal(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{LookupError, MockLookupCache, StoreError};
    use axum::{Router, body::Body, http::Request};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(lookup: MockLookupCache) -> Router {
        let state = AppState::new(Arc::new(lookup), Duration::from_millis(500), false);
        Router::new().fallback(redirect_handler).with_state(state)
    }

    fn request(method: Method, host: &str, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, host)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_found_redirects_with_302() {
        let mut lookup = MockLookupCache::new();
        lookup
            .expect_lookup()
            .withf(|key, _| key == "http://localhost:8080/")
            .times(1)
            .returning(|_, _| Ok(LookupOutcome::Found("https://www.google.com/".to_string())));

        let response = app(lookup)
            .oneshot(request(Method::GET, "localhost:8080", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://www.google.com/"
        );
    }

    #[tokio::test]
    async fn test_any_method_is_redirected() {
        let mut lookup = MockLookupCache::new();
        lookup
            .expect_lookup()
            .times(1)
            .returning(|_, _| Ok(LookupOutcome::Found("https://www.yahoo.com/".to_string())));

        let response = app(lookup)
            .oneshot(request(Method::POST, "localhost:8080", "/yahoo"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_not_found_returns_404() {
        let mut lookup = MockLookupCache::new();
        lookup
            .expect_lookup()
            .withf(|key, _| key == "http://localhost:8080/unknown-path")
            .times(1)
            .returning(|_, _| Ok(LookupOutcome::NotFound));

        let response = app(lookup)
            .oneshot(request(Method::GET, "localhost:8080", "/unknown-path"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "Not Found");
    }

    #[tokio::test]
    async fn test_lookup_error_returns_500() {
        let mut lookup = MockLookupCache::new();
        lookup.expect_lookup().times(1).returning(|_, _| {
            Err(LookupError::Store(StoreError::Connection(
                "connection refused".to_string(),
            )))
        });

        let response = app(lookup)
            .oneshot(request(Method::GET, "localhost:8080", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn test_missing_host_returns_500_without_lookup() {
        let lookup = MockLookupCache::new();

        let request = Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = app(lookup).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_stored_target_returns_500() {
        let mut lookup = MockLookupCache::new();
        lookup
            .expect_lookup()
            .times(1)
            .returning(|_, _| Ok(LookupOutcome::Found("https://bad\ntarget/".to_string())));

        let response = app(lookup)
            .oneshot(request(Method::GET, "localhost:8080", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_deadline_is_bounded_by_timeout() {
        let mut lookup = MockLookupCache::new();
        lookup
            .expect_lookup()
            .withf(|_, deadline| *deadline <= Instant::now() + Duration::from_millis(500))
            .times(1)
            .returning(|_, _| Err(LookupError::DeadlineExceeded));

        let response = app(lookup)
            .oneshot(request(Method::GET, "localhost:8080", "/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
