//! Enrollment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use lms_common::AppResult;
use lms_core::{CreateEnrollmentInput, EnrollmentWithUser, UpdateEnrollmentInput};
use lms_db::repositories::EnrollmentFilter;
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{AuthUser, JsonBody, QueryParams},
    middleware::AppState,
    response::{created, list, no_content},
};

/// Enrollment response. `user` is the enrolled user's username.
#[derive(Serialize)]
pub struct EnrollmentResponse {
    pub id: String,
    pub user: Option<String>,
    pub course: String,
    pub enrolled_at: String,
}

impl From<EnrollmentWithUser> for EnrollmentResponse {
    fn from((e, user): EnrollmentWithUser) -> Self {
        Self {
            id: e.id,
            user: user.map(|u| u.username),
            course: e.course_id,
            enrolled_at: e.enrolled_at.to_rfc3339(),
        }
    }
}

/// Enrollment list filters.
#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentFilterParams {
    pub course: Option<String>,
}

async fn list_enrollments(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<EnrollmentFilterParams>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<EnrollmentResponse>>> {
    let filter = EnrollmentFilter {
        course_id: filter.course,
    };
    let enrollments = state
        .enrollment_service
        .list(&filter, &params.into())
        .await?;
    Ok(list(enrollments))
}

async fn create_enrollment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateEnrollmentInput>,
) -> AppResult<(StatusCode, Json<EnrollmentResponse>)> {
    let enrollment = state.enrollment_service.create(&user, input).await?;
    Ok(created(enrollment.into()))
}

async fn show_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<EnrollmentResponse>> {
    let enrollment = state.enrollment_service.get(&id).await?;
    Ok(Json(enrollment.into()))
}

async fn replace_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateEnrollmentInput>,
) -> AppResult<Json<EnrollmentResponse>> {
    let enrollment = state.enrollment_service.update(&id, input.into()).await?;
    Ok(Json(enrollment.into()))
}

async fn update_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateEnrollmentInput>,
) -> AppResult<Json<EnrollmentResponse>> {
    let enrollment = state.enrollment_service.update(&id, input).await?;
    Ok(Json(enrollment.into()))
}

async fn delete_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.enrollment_service.delete(&id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enrollments/", get(list_enrollments).post(create_enrollment))
        .route(
            "/enrollments/{id}/",
            get(show_enrollment)
                .put(replace_enrollment)
                .patch(update_enrollment)
                .delete(delete_enrollment),
        )
        .route_layer(from_fn_with_state(Policy::Authenticated, enforce_policy))
}
