//! Lesson endpoints.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use lms_common::{AppError, AppResult};
use lms_core::{CreateLessonInput, LessonService, UpdateLessonInput};
use lms_db::{entities::lesson, repositories::LessonFilter};
use serde::{Deserialize, Serialize};

use super::ListParams;
use crate::{
    access::{Policy, enforce_policy},
    extractors::{JsonBody, QueryParams},
    middleware::AppState,
    response::{created, no_content},
};

/// Multipart field carrying the video file.
const VIDEO_FIELD: &str = "video";

/// Lesson response.
#[derive(Serialize)]
pub struct LessonResponse {
    pub id: String,
    pub section: String,
    pub title: String,
    pub content: String,
    pub order: i32,
    /// Public URL of the video.
    pub video: Option<String>,
}

impl LessonResponse {
    fn new(l: lesson::Model, service: &LessonService) -> Self {
        Self {
            video: l.video.as_deref().map(|key| service.video_url(key)),
            id: l.id,
            section: l.section_id,
            title: l.title,
            content: l.content,
            order: l.display_order,
        }
    }
}

/// Lesson list filters.
#[derive(Debug, Default, Deserialize)]
pub struct LessonFilterParams {
    pub section: Option<String>,
}

async fn list_lessons(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<LessonFilterParams>,
    QueryParams(params): QueryParams<ListParams>,
) -> AppResult<Json<Vec<LessonResponse>>> {
    let filter = LessonFilter {
        section_id: filter.section,
    };
    let lessons = state.lesson_service.list(&filter, &params.into()).await?;
    Ok(Json(
        lessons
            .into_iter()
            .map(|l| LessonResponse::new(l, &state.lesson_service))
            .collect(),
    ))
}

async fn create_lesson(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateLessonInput>,
) -> AppResult<(StatusCode, Json<LessonResponse>)> {
    let lesson = state.lesson_service.create(input).await?;
    Ok(created(LessonResponse::new(lesson, &state.lesson_service)))
}

async fn show_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<LessonResponse>> {
    let lesson = state.lesson_service.get(&id).await?;
    Ok(Json(LessonResponse::new(lesson, &state.lesson_service)))
}

async fn replace_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CreateLessonInput>,
) -> AppResult<Json<LessonResponse>> {
    let lesson = state.lesson_service.update(&id, input.into()).await?;
    Ok(Json(LessonResponse::new(lesson, &state.lesson_service)))
}

async fn update_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateLessonInput>,
) -> AppResult<Json<LessonResponse>> {
    let lesson = state.lesson_service.update(&id, input).await?;
    Ok(Json(LessonResponse::new(lesson, &state.lesson_service)))
}

async fn delete_lesson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.lesson_service.delete(&id).await?;
    Ok(no_content())
}

/// Upload the lesson video as the `video` field of a multipart form.
async fn upload_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<LessonResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or(VIDEO_FIELD).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if data.is_empty() {
            return Err(AppError::invalid_field(
                VIDEO_FIELD,
                "The submitted file is empty.",
            ));
        }

        let lesson = state
            .lesson_service
            .attach_video(&id, &file_name, &data)
            .await?;
        return Ok(Json(LessonResponse::new(lesson, &state.lesson_service)));
    }

    Err(AppError::invalid_field(VIDEO_FIELD, "No file was submitted."))
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/lessons/", get(list_lessons).post(create_lesson))
        .route(
            "/lessons/{id}/",
            get(show_lesson)
                .put(replace_lesson)
                .patch(update_lesson)
                .delete(delete_lesson),
        )
        .route(
            "/lessons/{id}/video/",
            post(upload_video).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route_layer(from_fn_with_state(Policy::StaffOrReadOnly, enforce_policy))
}
