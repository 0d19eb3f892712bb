//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use lms_common::AppResult;
use lms_core::{CommentWithUser, CreateCommentInput, UpdateCommentInput};
use lms_db::repositories::CommentFilter;
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{AuthUser, JsonBody, QueryParams},
    middleware::AppState,
    response::{created, list, no_content},
};

/// Comment response. `user` is the author's username.
#[derive(Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub lesson: String,
    pub user: Option<String>,
    pub comment: String,
    pub created_at: String,
}

impl From<CommentWithUser> for CommentResponse {
    fn from((c, user): CommentWithUser) -> Self {
        Self {
            id: c.id,
            lesson: c.lesson_id,
            user: user.map(|u| u.username),
            comment: c.comment,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Comment list filters.
#[derive(Debug, Default, Deserialize)]
pub struct CommentFilterParams {
    pub lesson: Option<String>,
}

async fn list_comments(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CommentFilterParams>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let filter = CommentFilter {
        lesson_id: filter.lesson,
    };
    let comments = state.comment_service.list(&filter, &params.into()).await?;
    Ok(list(comments))
}

async fn create_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateCommentInput>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    let comment = state.comment_service.create(&user, input).await?;
    Ok(created(comment.into()))
}

async fn show_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CommentResponse>> {
    let comment = state.comment_service.get(&id).await?;
    Ok(Json(comment.into()))
}

async fn replace_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateCommentInput>,
) -> AppResult<Json<CommentResponse>> {
    let comment = state.comment_service.update(&id, input.into()).await?;
    Ok(Json(comment.into()))
}

async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateCommentInput>,
) -> AppResult<Json<CommentResponse>> {
    let comment = state.comment_service.update(&id, input).await?;
    Ok(Json(comment.into()))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.comment_service.delete(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments/", get(list_comments).post(create_comment))
        .route(
            "/comments/{id}/",
            get(show_comment)
                .put(replace_comment)
                .patch(update_comment)
                .delete(delete_comment),
        )
        .route_layer(from_fn_with_state(
            Policy::AuthenticatedOrReadOnly,
            enforce_policy,
        ))
}
