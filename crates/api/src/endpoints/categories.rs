//! Category endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use lms_common::AppResult;
use lms_core::{CreateCategoryInput, UpdateCategoryInput};
use lms_db::entities::category;
use serde::Serialize;

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{JsonBody, QueryParams},
    middleware::AppState,
    response::{created, list, no_content},
};

/// Category response.
#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

async fn list_categories(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<CategoryResponse>>> {
    let categories = state.category_service.list(&params.into()).await?;
    Ok(list(categories))
}

async fn create_category(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateCategoryInput>,
) -> AppResult<(StatusCode, Json<CategoryResponse>)> {
    let category = state.category_service.create(input).await?;
    Ok(created(category.into()))
}

async fn show_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state.category_service.get(&id).await?;
    Ok(Json(category.into()))
}

async fn replace_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateCategoryInput>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state.category_service.update(&id, input.into()).await?;
    Ok(Json(category.into()))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateCategoryInput>,
) -> AppResult<Json<CategoryResponse>> {
    let category = state.category_service.update(&id, input).await?;
    Ok(Json(category.into()))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.category_service.delete(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(list_categories).post(create_category))
        .route(
            "/categories/{id}/",
            get(show_category)
                .put(replace_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route_layer(from_fn_with_state(Policy::StaffOrReadOnly, enforce_policy))
}
