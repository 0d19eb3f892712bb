//! Section repository.

use std::sync::Arc;

use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::{ListOptions, apply_ordering, apply_paging, db_err, ensure_exists, icontains};
use crate::entities::{Course, Section, section};

/// Equality filters accepted by the section list.
#[derive(Debug, Clone, Default)]
pub struct SectionFilter {
    /// Only sections of this course.
    pub course_id: Option<String>,
}

/// Field changes applied by a section update.
#[derive(Debug, Clone, Default)]
pub struct SectionChanges {
    /// New parent course, checked for existence.
    pub course_id: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New display position.
    pub display_order: Option<i32>,
}

/// Repository for section operations.
#[derive(Clone)]
pub struct SectionRepository {
    db: Arc<DatabaseConnection>,
}

impl SectionRepository {
    /// Create a new section repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find section by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<section::Model>> {
        Section::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find section by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<section::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Section not found: {id}")))
    }

    /// List sections.
    pub async fn list(
        &self,
        filter: &SectionFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<section::Model>> {
        let mut query = Section::find();

        if let Some(course_id) = &filter.course_id {
            query = query.filter(section::Column::CourseId.eq(course_id.as_str()));
        }
        if let Some(pattern) = options.search_pattern() {
            query = query.filter(icontains(Section, section::Column::Title, &pattern));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "title" => Some(section::Column::Title),
                "course" => Some(section::Column::CourseId),
                "order" => Some(section::Column::DisplayOrder),
                _ => None,
            },
            section::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new section after checking its course exists.
    pub async fn create(
        &self,
        id: String,
        course_id: String,
        title: String,
        display_order: i32,
    ) -> AppResult<section::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_exists::<Course, _>(&txn, &course_id, "course").await?;

        let model = section::ActiveModel {
            id: Set(id),
            course_id: Set(course_id),
            title: Set(title),
            display_order: Set(display_order),
        };

        let section = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(section)
    }

    /// Apply changes to a section.
    pub async fn update(&self, id: &str, changes: SectionChanges) -> AppResult<section::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let section = Section::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Section not found: {id}")))?;

        if let Some(course_id) = &changes.course_id {
            ensure_exists::<Course, _>(&txn, course_id, "course").await?;
        }

        let mut active: section::ActiveModel = section.into();

        if let Some(course_id) = changes.course_id {
            active.course_id = Set(course_id);
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(display_order) = changes.display_order {
            active.display_order = Set(display_order);
        }

        let section = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(section)
    }

    /// Delete a section (and its lessons due to CASCADE).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Section::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Section not found: {id}")));
        }
        Ok(())
    }
}
