//! HTTP API layer for lms-rs.
//!
//! This crate provides the REST API of the course platform:
//!
//! - **Endpoints**: CRUD for the catalog, enrollments and lesson feedback, plus auth
//! - **Access control**: Per-resource [`access::Policy`] checked before handlers run
//! - **Extractors**: Authenticated caller, JSON payloads and list query parameters
//! - **Middleware**: Bearer token authentication
//!
//! Built on Axum 0.8. The same router is served under `/api/v1` and `/api/v2`.

pub mod access;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, middleware::from_fn_with_state};

pub use endpoints::router;
pub use middleware::AppState;

/// API version prefixes sharing one handler set.
pub const API_PREFIXES: [&str; 2] = ["/api/v1", "/api/v2"];

/// Build the versioned API with authentication applied.
pub fn app(state: AppState) -> Router {
    let api = router(state.max_upload_bytes).layer(from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    API_PREFIXES
        .iter()
        .fold(Router::new(), |app, prefix| app.nest(prefix, api.clone()))
        .with_state(state)
}
