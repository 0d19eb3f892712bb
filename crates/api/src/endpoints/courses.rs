//! Course endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use lms_common::AppResult;
use lms_core::{CreateCourseInput, UpdateCourseInput};
use lms_db::{entities::course, repositories::CourseFilter};
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{AuthUser, JsonBody, QueryParams},
    middleware::AppState,
    response::{created, list, no_content},
};

/// Course response.
#[derive(Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub instructor: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<course::Model> for CourseResponse {
    fn from(c: course::Model) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category: c.category_id,
            instructor: c.instructor_id,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Course list filters.
#[derive(Debug, Default, Deserialize)]
pub struct CourseFilterParams {
    pub category: Option<String>,
    pub instructor: Option<String>,
}

async fn list_courses(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<CourseFilterParams>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<CourseResponse>>> {
    let filter = CourseFilter {
        category_id: filter.category,
        instructor_id: filter.instructor,
    };
    let courses = state.course_service.list(&filter, &params.into()).await?;
    Ok(list(courses))
}

async fn create_course(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateCourseInput>,
) -> AppResult<(StatusCode, Json<CourseResponse>)> {
    let course = state.course_service.create(&user, input).await?;
    Ok(created(course.into()))
}

async fn show_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CourseResponse>> {
    let course = state.course_service.get(&id).await?;
    Ok(Json(course.into()))
}

async fn replace_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateCourseInput>,
) -> AppResult<Json<CourseResponse>> {
    let course = state.course_service.update(&id, input.into()).await?;
    Ok(Json(course.into()))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateCourseInput>,
) -> AppResult<Json<CourseResponse>> {
    let course = state.course_service.update(&id, input).await?;
    Ok(Json(course.into()))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.course_service.delete(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses/", get(list_courses).post(create_course))
        .route(
            "/courses/{id}/",
            get(show_course)
                .put(replace_course)
                .patch(update_course)
                .delete(delete_course),
        )
        .route_layer(from_fn_with_state(Policy::StaffOrReadOnly, enforce_policy))
}
