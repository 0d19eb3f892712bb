//! API endpoints.

mod auth;
mod categories;
mod comments;
mod courses;
mod enrollments;
mod lessons;
mod ratings;
mod sections;

use axum::Router;
use lms_db::repositories::ListOptions;
use serde::Deserialize;

use crate::middleware::AppState;

/// Create the API router.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(categories::router())
        .merge(courses::router())
        .merge(sections::router())
        .merge(lessons::router(max_upload_bytes))
        .merge(enrollments::router())
        .merge(comments::router())
        .merge(ratings::router())
}

/// Search, ordering and paging parameters accepted by every list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring.
    pub search: Option<String>,
    /// Comma-separated field names, `-` prefix for descending.
    pub ordering: Option<String>,
    /// Maximum number of records to return.
    pub limit: Option<u64>,
    /// Number of records to skip.
    pub offset: Option<u64>,
}

impl From<ListParams> for ListOptions {
    fn from(params: ListParams) -> Self {
        Self {
            search: params.search,
            ordering: params
                .ordering
                .as_deref()
                .map(Self::parse_ordering)
                .unwrap_or_default(),
            limit: params.limit,
            offset: params.offset,
        }
    }
}
