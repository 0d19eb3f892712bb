//! Course repository.

use std::sync::Arc;

use chrono::Utc;
use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::{ListOptions, apply_ordering, apply_paging, db_err, ensure_exists, icontains};
use crate::entities::{Category, Course, User, course};

/// Equality filters accepted by the course list.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Only courses in this category.
    pub category_id: Option<String>,
    /// Only courses taught by this user.
    pub instructor_id: Option<String>,
}

/// Field changes applied by a course update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category, checked for existence.
    pub category_id: Option<String>,
    /// New instructor, checked for existence.
    pub instructor_id: Option<String>,
}

/// Repository for course operations.
#[derive(Clone)]
pub struct CourseRepository {
    db: Arc<DatabaseConnection>,
}

impl CourseRepository {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find course by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<course::Model>> {
        Course::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find course by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<course::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course not found: {id}")))
    }

    /// List courses.
    pub async fn list(
        &self,
        filter: &CourseFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<course::Model>> {
        let mut query = Course::find();

        if let Some(category_id) = &filter.category_id {
            query = query.filter(course::Column::CategoryId.eq(category_id.as_str()));
        }
        if let Some(instructor_id) = &filter.instructor_id {
            query = query.filter(course::Column::InstructorId.eq(instructor_id.as_str()));
        }
        if let Some(pattern) = options.search_pattern() {
            query = query.filter(icontains(Course, course::Column::Title, &pattern));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "title" => Some(course::Column::Title),
                "created_at" => Some(course::Column::CreatedAt),
                _ => None,
            },
            course::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new course after checking its category and instructor exist.
    pub async fn create(
        &self,
        id: String,
        title: String,
        description: String,
        category_id: String,
        instructor_id: String,
    ) -> AppResult<course::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_exists::<Category, _>(&txn, &category_id, "category").await?;
        ensure_exists::<User, _>(&txn, &instructor_id, "instructor").await?;

        let now = Utc::now();
        let model = course::ActiveModel {
            id: Set(id),
            title: Set(title),
            description: Set(description),
            category_id: Set(category_id),
            instructor_id: Set(instructor_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let course = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(course)
    }

    /// Apply changes to a course. `updated_at` is refreshed on every write.
    pub async fn update(&self, id: &str, changes: CourseChanges) -> AppResult<course::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let course = Course::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Course not found: {id}")))?;

        if let Some(category_id) = &changes.category_id {
            ensure_exists::<Category, _>(&txn, category_id, "category").await?;
        }
        if let Some(instructor_id) = &changes.instructor_id {
            ensure_exists::<User, _>(&txn, instructor_id, "instructor").await?;
        }

        let mut active: course::ActiveModel = course.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(instructor_id) = changes.instructor_id {
            active.instructor_id = Set(instructor_id);
        }
        active.updated_at = Set(Utc::now().into());

        let course = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(course)
    }

    /// Delete a course (and its sections and enrollments due to CASCADE).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Course::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Course not found: {id}")));
        }
        Ok(())
    }
}
