//! Authentication endpoints.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
};
use lms_common::AppResult;
use lms_core::{RegisterInput, TokenPair};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, JsonBody, parse_json},
    middleware::AppState,
    response::{created, no_content},
};

/// Registered user response. The password is never echoed.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
}

/// Create a new, non-staff account.
async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.user_service.register(input).await?;

    Ok(created(RegisterResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Exchange credentials for an access/refresh token pair.
async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;

    Ok(Json(state.token_service.issue_pair(&user.id).await?))
}

/// Refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh response.
#[derive(Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Get a new access token for a live refresh token.
async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let access = state.token_service.refresh(&req.refresh).await?;
    Ok(Json(RefreshResponse { access }))
}

/// Logout request. Without a body every session of the caller ends.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh: Option<String>,
}

/// Revoke refresh tokens of the caller.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<StatusCode> {
    let req: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        parse_json(&body)?
    };

    state
        .token_service
        .revoke(&user.id, req.refresh.as_deref())
        .await?;

    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/login/", post(login))
        .route("/token/refresh/", post(refresh_token))
        .route("/logout/", post(logout))
}
