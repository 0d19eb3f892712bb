//! API response helpers.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// `201 Created` with the new record.
pub fn created<T: Serialize>(body: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(body))
}

/// Empty success response.
#[must_use]
pub const fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Serialize a list of records.
pub fn list<M, T>(models: Vec<M>) -> Json<Vec<T>>
where
    T: From<M> + Serialize,
{
    Json(models.into_iter().map(T::from).collect())
}
