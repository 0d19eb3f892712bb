//! API middleware and shared state.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use lms_common::{AppError, AppResult, Config, StorageBackend};
use lms_core::{
    CategoryService, CommentService, CourseNotifier, CourseService, EnrollmentService,
    LessonService, Mailer, RatingService, SectionService, TokenService, UserService,
};
use lms_db::{
    entities::user,
    repositories::{
        CategoryRepository, CommentRepository, CourseRepository, EnrollmentRepository,
        LessonRepository, RatingRepository, RefreshTokenRepository, SectionRepository,
        UserRepository,
    },
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub token_service: TokenService,
    pub category_service: CategoryService,
    pub course_service: CourseService,
    pub section_service: SectionService,
    pub lesson_service: LessonService,
    pub enrollment_service: EnrollmentService,
    pub comment_service: CommentService,
    pub rating_service: RatingService,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire every service to one database connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let enrollment_repo = EnrollmentRepository::new(Arc::clone(&db));
        let notifier = CourseNotifier::new(enrollment_repo.clone(), mailer);

        Self {
            user_service: UserService::new(UserRepository::new(Arc::clone(&db))),
            token_service: TokenService::new(
                RefreshTokenRepository::new(Arc::clone(&db)),
                &config.auth,
            ),
            category_service: CategoryService::new(CategoryRepository::new(Arc::clone(&db))),
            course_service: CourseService::new(CourseRepository::new(Arc::clone(&db)), notifier),
            section_service: SectionService::new(SectionRepository::new(Arc::clone(&db))),
            lesson_service: LessonService::new(LessonRepository::new(Arc::clone(&db)), storage),
            enrollment_service: EnrollmentService::new(enrollment_repo),
            comment_service: CommentService::new(CommentRepository::new(Arc::clone(&db))),
            rating_service: RatingService::new(RatingRepository::new(db)),
            max_upload_bytes: config.media.max_upload_bytes,
        }
    }
}

/// Authentication middleware.
///
/// A request without a bearer token continues anonymously. A bearer token that
/// does not verify, or whose user is gone, ends the request with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => return e.into_response(),
    }

    next.run(req).await
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<Option<user::Model>> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;
    let Some(token) = header.strip_prefix("Bearer ") else {
        return Ok(None);
    };

    let claims = state.token_service.verify_access(token.trim())?;
    let user = state
        .user_service
        .find(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Some(user))
}
