//! Request extractors.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use lms_common::{AppError, AppResult};
use lms_db::entities::user;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by auth middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided.".to_string())
            })
    }
}

/// JSON request body whose errors use the API error format.
///
/// A missing or mistyped field becomes a validation error on that field.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        parse_json(&bytes).map(Self)
    }
}

/// Deserialize a JSON payload, mapping errors like [`JsonBody`] does.
///
/// Malformed JSON is a bad request. A well-formed document whose values do not
/// fit the target type is a validation error on the offending field.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> AppResult<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let path = e.path().to_string();
        let inner = e.into_inner();
        match inner.classify() {
            Category::Data => field_error(&path, &inner),
            Category::Io | Category::Syntax | Category::Eof => {
                AppError::BadRequest(format!("JSON parse error - {inner}"))
            }
        }
    })?;
    deserializer
        .end()
        .map_err(|e| AppError::BadRequest(format!("JSON parse error - {e}")))?;
    Ok(value)
}

fn field_error(path: &str, error: &serde_json::Error) -> AppError {
    let message = error.to_string();
    // Drop the " at line N column M" suffix
    let message = message
        .rsplit_once(" at line ")
        .map_or(message.as_str(), |(head, _)| head);

    let root = path == ".";
    if let Some(name) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        let field = if root {
            name.to_string()
        } else {
            format!("{path}.{name}")
        };
        return AppError::invalid_field(field, "This field is required.");
    }

    let field = if root { "non_field_errors" } else { path };
    AppError::invalid_field(field, format!("Invalid value: {message}."))
}

/// Query string extractor whose errors use the API error format.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| Self(params))
            .map_err(|e| AppError::BadRequest(e.body_text()))
    }
}
