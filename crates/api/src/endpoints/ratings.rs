//! Rating endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use lms_common::AppResult;
use lms_core::{CreateRatingInput, RatingWithUser, UpdateRatingInput};
use lms_db::{entities::rating::RatingValue, repositories::RatingFilter};
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{AuthUser, JsonBody, QueryParams},
    middleware::AppState,
    response::{created, list, no_content},
};

/// Rating response. `user` is the rater's username.
#[derive(Serialize)]
pub struct RatingResponse {
    pub id: String,
    pub lesson: String,
    pub user: Option<String>,
    pub rating: RatingValue,
    pub created_at: String,
}

impl From<RatingWithUser> for RatingResponse {
    fn from((r, user): RatingWithUser) -> Self {
        Self {
            id: r.id,
            lesson: r.lesson_id,
            user: user.map(|u| u.username),
            rating: r.rating,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Rating list filters.
#[derive(Debug, Default, Deserialize)]
pub struct RatingFilterParams {
    pub lesson: Option<String>,
    pub rating: Option<RatingValue>,
}

async fn list_ratings(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<RatingFilterParams>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<RatingResponse>>> {
    let filter = RatingFilter {
        lesson_id: filter.lesson,
        rating: filter.rating,
    };
    let ratings = state.rating_service.list(&filter, &params.into()).await?;
    Ok(list(ratings))
}

async fn create_rating(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateRatingInput>,
) -> AppResult<(StatusCode, Json<RatingResponse>)> {
    let rating = state.rating_service.create(&user, input).await?;
    Ok(created(rating.into()))
}

async fn show_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<RatingResponse>> {
    let rating = state.rating_service.get(&id).await?;
    Ok(Json(rating.into()))
}

async fn replace_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateRatingInput>,
) -> AppResult<Json<RatingResponse>> {
    let rating = state.rating_service.update(&id, input.into()).await?;
    Ok(Json(rating.into()))
}

async fn update_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateRatingInput>,
) -> AppResult<Json<RatingResponse>> {
    let rating = state.rating_service.update(&id, input).await?;
    Ok(Json(rating.into()))
}

async fn delete_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.rating_service.delete(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ratings/", get(list_ratings).post(create_rating))
        .route(
            "/ratings/{id}/",
            get(show_rating)
                .put(replace_rating)
                .patch(update_rating)
                .delete(delete_rating),
        )
        .route_layer(from_fn_with_state(
            Policy::AuthenticatedOrReadOnly,
            enforce_policy,
        ))
}
