//! Comment repository.

use std::sync::Arc;

use chrono::Utc;
use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait,
};

use super::{ListOptions, apply_ordering, apply_paging, db_err, ensure_exists, icontains};
use crate::entities::{Comment, Lesson, User, comment, lesson, user};

/// Equality filters accepted by the comment list.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// Only comments on this lesson.
    pub lesson_id: Option<String>,
}

/// Repository for comment operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find comment by ID together with its author.
    pub async fn find_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<(comment::Model, Option<user::Model>)>> {
        Comment::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<(comment::Model, Option<user::Model>)> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment not found: {id}")))
    }

    /// List comments with their authors. Search matches the lesson title.
    pub async fn list(
        &self,
        filter: &CommentFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<(comment::Model, Option<user::Model>)>> {
        let mut query = Comment::find().find_also_related(User);

        if let Some(lesson_id) = &filter.lesson_id {
            query = query.filter(comment::Column::LessonId.eq(lesson_id.as_str()));
        }
        if let Some(pattern) = options.search_pattern() {
            query = query
                .join(JoinType::InnerJoin, comment::Relation::Lesson.def())
                .filter(icontains(Lesson, lesson::Column::Title, &pattern));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "lesson" => Some(comment::Column::LessonId),
                "user" => Some(comment::Column::UserId),
                "created_at" => Some(comment::Column::CreatedAt),
                _ => None,
            },
            comment::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a comment by `user_id` on a lesson.
    pub async fn create(
        &self,
        id: String,
        lesson_id: String,
        user_id: String,
        text: String,
    ) -> AppResult<comment::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_exists::<Lesson, _>(&txn, &lesson_id, "lesson").await?;
        ensure_exists::<User, _>(&txn, &user_id, "user").await?;

        let model = comment::ActiveModel {
            id: Set(id),
            lesson_id: Set(lesson_id),
            user_id: Set(user_id),
            comment: Set(text),
            created_at: Set(Utc::now().into()),
        };

        let comment = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(comment)
    }

    /// Edit a comment. The author never changes.
    pub async fn update(
        &self,
        id: &str,
        lesson_id: Option<String>,
        text: Option<String>,
    ) -> AppResult<comment::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let comment = Comment::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Comment not found: {id}")))?;

        let mut active: comment::ActiveModel = comment.into();

        if let Some(lesson_id) = lesson_id {
            ensure_exists::<Lesson, _>(&txn, &lesson_id, "lesson").await?;
            active.lesson_id = Set(lesson_id);
        }
        if let Some(text) = text {
            active.comment = Set(text);
        }

        let comment = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(comment)
    }

    /// Delete a comment.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Comment not found: {id}")));
        }
        Ok(())
    }
}
