//! Enrollment repository.

use std::sync::Arc;

use chrono::Utc;
use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};

use super::{ListOptions, apply_ordering, apply_paging, db_err, ensure_exists, icontains};
use crate::entities::{Course, Enrollment, User, enrollment, user};

/// Equality filters accepted by the enrollment list.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    /// Only enrollments in this course.
    pub course_id: Option<String>,
}

/// Repository for enrollment operations.
#[derive(Clone)]
pub struct EnrollmentRepository {
    db: Arc<DatabaseConnection>,
}

impl EnrollmentRepository {
    /// Create a new enrollment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find enrollment by ID together with its user.
    pub async fn find_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<(enrollment::Model, Option<user::Model>)>> {
        Enrollment::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find enrollment by ID, returning an error if not found.
    pub async fn get_by_id(
        &self,
        id: &str,
    ) -> AppResult<(enrollment::Model, Option<user::Model>)> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Enrollment not found: {id}")))
    }

    /// List enrollments with their users. Search matches the username.
    pub async fn list(
        &self,
        filter: &EnrollmentFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<(enrollment::Model, Option<user::Model>)>> {
        let mut query = Enrollment::find().find_also_related(User);

        if let Some(course_id) = &filter.course_id {
            query = query.filter(enrollment::Column::CourseId.eq(course_id.as_str()));
        }
        if let Some(pattern) = options.search_pattern() {
            query = query.filter(icontains(User, user::Column::Username, &pattern));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "user" => Some(enrollment::Column::UserId),
                "course" => Some(enrollment::Column::CourseId),
                "enrolled_at" => Some(enrollment::Column::EnrolledAt),
                _ => None,
            },
            enrollment::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Enroll a user in a course.
    pub async fn create(
        &self,
        id: String,
        user_id: String,
        course_id: String,
    ) -> AppResult<enrollment::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_exists::<Course, _>(&txn, &course_id, "course").await?;
        ensure_exists::<User, _>(&txn, &user_id, "user").await?;

        let model = enrollment::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            course_id: Set(course_id),
            enrolled_at: Set(Utc::now().into()),
        };

        let enrollment = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(enrollment)
    }

    /// Move an enrollment to another course. The user never changes.
    pub async fn update(
        &self,
        id: &str,
        course_id: Option<String>,
    ) -> AppResult<enrollment::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let enrollment = Enrollment::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Enrollment not found: {id}")))?;

        let mut active: enrollment::ActiveModel = enrollment.into();

        if let Some(course_id) = course_id {
            ensure_exists::<Course, _>(&txn, &course_id, "course").await?;
            active.course_id = Set(course_id);
        }

        let enrollment = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(enrollment)
    }

    /// Delete an enrollment.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Enrollment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Enrollment not found: {id}")));
        }
        Ok(())
    }

    /// Distinct, non-empty email addresses of users enrolled in a course.
    pub async fn find_enrolled_emails(&self, course_id: &str) -> AppResult<Vec<String>> {
        User::find()
            .inner_join(Enrollment)
            .filter(enrollment::Column::CourseId.eq(course_id))
            .filter(user::Column::Email.is_not_null())
            .filter(user::Column::Email.ne(""))
            .select_only()
            .column(user::Column::Email)
            .distinct()
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::course;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_enrollment(id: &str, user_id: &str) -> enrollment::Model {
        enrollment::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            course_id: "course1".to_string(),
            enrolled_at: Utc::now().into(),
        }
    }

    fn create_test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
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
            description: String::new(),
            category_id: "cat1".to_string(),
            instructor_id: "mentor".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_enrollment() {
        let enrollment = create_test_enrollment("e1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_course()]])
                .append_query_results([[create_test_user("user1", "alice")]])
                .append_query_results([[enrollment.clone()]])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        let result = repo
            .create("e1".to_string(), "user1".to_string(), "course1".to_string())
            .await
            .unwrap();

        assert_eq!(result.user_id, "user1");
        assert_eq!(result.course_id, "course1");
    }

    #[tokio::test]
    async fn test_get_by_id_includes_user() {
        let enrollment = create_test_enrollment("e1", "user1");
        let user = create_test_user("user1", "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[(enrollment.clone(), user.clone())]])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        let (found, found_user) = repo.get_by_id("e1").await.unwrap();

        assert_eq!(found, enrollment);
        assert_eq!(found_user.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<enrollment::Model>::new()])
                .into_connection(),
        );

        let repo = EnrollmentRepository::new(db);
        let result = repo.update("missing", Some("course1".to_string())).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
