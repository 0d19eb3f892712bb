//! Rating repository.

use std::sync::Arc;

use chrono::Utc;
use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use super::{ListOptions, apply_ordering, apply_paging, db_err, ensure_exists};
use crate::entities::{Lesson, Rating, RatingValue, User, rating, user};

/// Equality filters accepted by the rating list.
#[derive(Debug, Clone, Default)]
pub struct RatingFilter {
    /// Only ratings of this lesson.
    pub lesson_id: Option<String>,
    /// Only likes or only dislikes.
    pub rating: Option<RatingValue>,
}

/// Repository for rating operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find rating by ID together with its user.
    pub async fn find_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<(rating::Model, Option<user::Model>)>> {
        Rating::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find rating by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<(rating::Model, Option<user::Model>)> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Rating not found: {id}")))
    }

    /// List ratings with their users.
    pub async fn list(
        &self,
        filter: &RatingFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<(rating::Model, Option<user::Model>)>> {
        let mut query = Rating::find().find_also_related(User);

        if let Some(lesson_id) = &filter.lesson_id {
            query = query.filter(rating::Column::LessonId.eq(lesson_id.as_str()));
        }
        if let Some(value) = filter.rating {
            query = query.filter(rating::Column::Rating.eq(value));
        }

        let query = apply_ordering(
            query,
            &options.ordering,
            |field| match field {
                "lesson" => Some(rating::Column::LessonId),
                "user" => Some(rating::Column::UserId),
                "created_at" => Some(rating::Column::CreatedAt),
                _ => None,
            },
            rating::Column::Id,
        );

        apply_paging(query, options)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Record a rating by `user_id` on a lesson.
    pub async fn create(
        &self,
        id: String,
        lesson_id: String,
        user_id: String,
        value: RatingValue,
    ) -> AppResult<rating::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        ensure_exists::<Lesson, _>(&txn, &lesson_id, "lesson").await?;
        ensure_exists::<User, _>(&txn, &user_id, "user").await?;

        let model = rating::ActiveModel {
            id: Set(id),
            lesson_id: Set(lesson_id),
            user_id: Set(user_id),
            rating: Set(value),
            created_at: Set(Utc::now().into()),
        };

        let rating = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(rating)
    }

    /// Change a rating. The user never changes.
    pub async fn update(
        &self,
        id: &str,
        lesson_id: Option<String>,
        value: Option<RatingValue>,
    ) -> AppResult<rating::Model> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let rating = Rating::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound(format!("Rating not found: {id}")))?;

        let mut active: rating::ActiveModel = rating.into();

        if let Some(lesson_id) = lesson_id {
            ensure_exists::<Lesson, _>(&txn, &lesson_id, "lesson").await?;
            active.lesson_id = Set(lesson_id);
        }
        if let Some(value) = value {
            active.rating = Set(value);
        }

        let rating = active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(rating)
    }

    /// Delete a rating.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Rating::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Rating not found: {id}")));
        }
        Ok(())
    }
}
