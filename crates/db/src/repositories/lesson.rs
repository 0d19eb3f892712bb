//! Lesson repository.

use std::sync::Arc;

use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::{ListOptions, apply_ordering, apply_paging, db_err, ensure_exists, icontains};
use crate::entities::{Lesson, Section, lesson};

/// Equality filters accepted by the lesson list.
#[derive(Debug, Clone, Default)]
pub struct LessonFilter {
    /// Only lessons of this section.
    pub section_id: Option<String>,
}

/// Field changes applied by a lesson update.
#[derive(Debug, Clone, Default)]
pub struct LessonChanges {
    /// New parent section, checked for existence.
    pub section_id: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New body.
    pub content: Option<String>,
    /// New display position.
    pub display_order: Option<i32>,
    /// New video storage key; `Some(None)` detaches the video.
    pub video: Option<Option<String>>,
}

/// Repository for lesson operations.
#[derive(Clone)]
pub struct LessonRepository {
    db: Arc<DatabaseConnection>,
}

impl LessonRepository {
    /// Create a new lesson repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find lesson by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<lesson::Model>> {
        Lesson::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find lesson by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<lesson::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson not found: {id}")))
    }

    /// List lessons.
    pub async fn list(
        &self,
        filter: &LessonFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<lesson::Model>> {
        let mut query = Lesson::find();

        if let Some(section_id) = &filter.section_id {
            query = query.filter(lesson::Column::SectionId.eq(section_id.as_str()));
        }
        if let Some(pattern) = options.search_pattern() {
            query = query.filter(icontains(Lesson, lesson::Column::Title, &pattern));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "title" => Some(lesson::Column::Title),
                "section" => Some(lesson::Column::SectionId),
                "order" => Some(lesson::Column::DisplayOrder),
                _ => None,
            },
            lesson::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new lesson after checking its section exists.
    pub async fn create(
        &self,
        id: String,
        section_id: String,
        title: String,
        content: String,
        display_order: i32,
    ) -> AppResult<lesson::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_exists::<Section, _>(&txn, &section_id, "section").await?;

        let model = lesson::ActiveModel {
            id: Set(id),
            section_id: Set(section_id),
            title: Set(title),
            content: Set(content),
            display_order: Set(display_order),
            video: Set(None),
        };

        let lesson = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(lesson)
    }

    /// Apply changes to a lesson.
    pub async fn update(&self, id: &str, changes: LessonChanges) -> AppResult<lesson::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let lesson = Lesson::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Lesson not found: {id}")))?;

        if let Some(section_id) = &changes.section_id {
            ensure_exists::<Section, _>(&txn, section_id, "section").await?;
        }

        let mut active: lesson::ActiveModel = lesson.into();

        if let Some(section_id) = changes.section_id {
            active.section_id = Set(section_id);
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        if let Some(display_order) = changes.display_order {
            active.display_order = Set(display_order);
        }
        if let Some(video) = changes.video {
            active.video = Set(video);
        }

        let lesson = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(lesson)
    }

    /// Delete a lesson (and its comments and ratings due to CASCADE).
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Lesson::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Lesson not found: {id}")));
        }
        Ok(())
    }
}
