//! Section endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use lms_common::AppResult;
use lms_core::{CreateSectionInput, UpdateSectionInput};
use lms_db::{entities::section, repositories::SectionFilter};
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{JsonBody, QueryParams},
    middleware::AppState,
    response::{created, list, no_content},
};

/// Section response.
#[derive(Serialize)]
pub struct SectionResponse {
    pub id: String,
    pub course: String,
    pub title: String,
    pub order: i32,
}

impl From<section::Model> for SectionResponse {
    fn from(s: section::Model) -> Self {
        Self {
            id: s.id,
            course: s.course_id,
            title: s.title,
            order: s.display_order,
        }
    }
}

/// Section list filters.
#[derive(Debug, Default, Deserialize)]
pub struct SectionFilterParams {
    pub course: Option<String>,
}

async fn list_sections(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<SectionFilterParams>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<SectionResponse>>> {
    let filter = SectionFilter {
        course_id: filter.course,
    };
    let sections = state.section_service.list(&filter, &params.into()).await?;
    Ok(list(sections))
}

async fn create_section(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateSectionInput>,
) -> AppResult<(StatusCode, Json<SectionResponse>)> {
    let section = state.section_service.create(input).await?;
    Ok(created(section.into()))
}

async fn show_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<SectionResponse>> {
    let section = state.section_service.get(&id).await?;
    Ok(Json(section.into()))
}

async fn replace_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateSectionInput>,
) -> AppResult<Json<SectionResponse>> {
    let section = state.section_service.update(&id, input.into()).await?;
    Ok(Json(section.into()))
}

async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateSectionInput>,
) -> AppResult<Json<SectionResponse>> {
    let section = state.section_service.update(&id, input).await?;
    Ok(Json(section.into()))
}

async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.section_service.delete(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sections/", get(list_sections).post(create_section))
        .route(
            "/sections/{id}/",
            get(show_section)
                .put(replace_section)
                .patch(update_section)
                .delete(delete_section),
        )
        .route_layer(from_fn_with_state(Policy::StaffOrReadOnly, enforce_policy))
}
