//! Enrollment service.

use lms_common::{AppResult, IdGenerator};
use lms_db::{
    entities::{enrollment, user},
    repositories::{EnrollmentFilter, EnrollmentRepository, ListOptions},
};
use serde::Deserialize;

/// An enrollment together with its user.
pub type EnrollmentWithUser = (enrollment::Model, Option<user::Model>);

/// Input for creating or replacing an enrollment.
///
/// The enrolled user is always the caller; a `user` in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateEnrollmentInput {
    /// Course ID.
    pub course: String,
}

/// Input for partially updating an enrollment.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEnrollmentInput {
    pub course: Option<String>,
}

impl From<CreateEnrollmentInput> for UpdateEnrollmentInput {
    fn from(input: CreateEnrollmentInput) -> Self {
        Self {
            course: Some(input.course),
        }
    }
}

/// Enrollment service for business logic.
#[derive(Clone)]
pub struct EnrollmentService {
    enrollment_repo: EnrollmentRepository,
    id_gen: IdGenerator,
}

impl EnrollmentService {
    /// Create a new enrollment service.
    #[must_use]
    pub const fn new(enrollment_repo: EnrollmentRepository) -> Self {
        Self {
            enrollment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List enrollments.
    pub async fn list(
        &self,
        filter: &EnrollmentFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<EnrollmentWithUser>> {
        self.enrollment_repo.list(filter, options).await
    }

    /// Get an enrollment by ID.
    pub async fn get(&self, id: &str) -> AppResult<EnrollmentWithUser> {
        self.enrollment_repo.get_by_id(id).await
    }

    /// Enroll the caller in a course.
    pub async fn create(
        &self,
        caller: &user::Model,
        input: CreateEnrollmentInput,
    ) -> AppResult<EnrollmentWithUser> {
        let enrollment = self
            .enrollment_repo
            .create(self.id_gen.generate(), caller.id.clone(), input.course)
            .await?;

        tracing::info!(
            enrollment_id = %enrollment.id,
            user_id = %caller.id,
            course_id = %enrollment.course_id,
            "Created enrollment"
        );
        Ok((enrollment, Some(caller.clone())))
    }

    /// Move an enrollment to another course.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateEnrollmentInput,
    ) -> AppResult<EnrollmentWithUser> {
        self.enrollment_repo.update(id, input.course).await?;
        self.enrollment_repo.get_by_id(id).await
    }

    /// Delete an enrollment.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.enrollment_repo.delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lms_common::AppError;
    use lms_db::entities::course;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user() -> user::Model {
        user::Model {
            id: "student".to_string(),
            username: "student".to_string(),
            email: Some("student@example.com".to_string()),
            password_hash: "hash".to_string(),
            is_staff: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_course() -> course::Model {
        course::Model {
            id: "course1".to_string(),
            title: "Rust".to_string(),
            description: "Systems".to_string(),
            category_id: "cat1".to_string(),
            instructor_id: "mentor".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_payload_user_is_ignored() {
        let input: CreateEnrollmentInput = serde_json::from_value(serde_json::json!({
            "course": "course1",
            "user": "someone-else",
        }))
        .unwrap();
        assert_eq!(input.course, "course1");
    }

    #[tokio::test]
    async fn test_create_enrolls_caller() {
        let caller = create_test_user();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_course()]])
            .append_query_results([[caller.clone()]])
            .append_query_results([[enrollment::Model {
                id: "enr1".to_string(),
                user_id: "student".to_string(),
                course_id: "course1".to_string(),
                enrolled_at: Utc::now().into(),
            }]])
            .into_connection();

        let service = EnrollmentService::new(EnrollmentRepository::new(Arc::new(db)));
        let (enrollment, user) = service
            .create(
                &caller,
                CreateEnrollmentInput {
                    course: "course1".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(enrollment.user_id, "student");
        assert_eq!(user.unwrap().username, "student");
    }

    #[tokio::test]
    async fn test_create_for_missing_course() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<course::Model>::new()])
            .into_connection();

        let service = EnrollmentService::new(EnrollmentRepository::new(Arc::new(db)));
        let result = service
            .create(
                &create_test_user(),
                CreateEnrollmentInput {
                    course: "missing".to_string(),
                },
            )
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("course").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
