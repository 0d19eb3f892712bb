//! Rating service.

use lms_common::{AppResult, IdGenerator};
use lms_db::{
    entities::{
        rating::{self, RatingValue},
        user,
    },
    repositories::{ListOptions, RatingFilter, RatingRepository},
};
use serde::Deserialize;

/// A rating together with its user.
pub type RatingWithUser = (rating::Model, Option<user::Model>);

/// Input for creating or replacing a rating. The rater is always the caller.
#[derive(Debug, Deserialize)]
pub struct CreateRatingInput {
    /// Lesson ID.
    pub lesson: String,

    pub rating: RatingValue,
}

/// Input for partially updating a rating.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRatingInput {
    pub lesson: Option<String>,

    pub rating: Option<RatingValue>,
}

impl From<CreateRatingInput> for UpdateRatingInput {
    fn from(input: CreateRatingInput) -> Self {
        Self {
            lesson: Some(input.lesson),
            rating: Some(input.rating),
        }
    }
}

/// Rating service for business logic.
#[derive(Clone)]
pub struct RatingService {
    rating_repo: RatingRepository,
    id_gen: IdGenerator,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(rating_repo: RatingRepository) -> Self {
        Self {
            rating_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List ratings.
    pub async fn list(
        &self,
        filter: &RatingFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<RatingWithUser>> {
        self.rating_repo.list(filter, options).await
    }

    /// Get a rating by ID.
    pub async fn get(&self, id: &str) -> AppResult<RatingWithUser> {
        self.rating_repo.get_by_id(id).await
    }

    /// Rate a lesson as the caller.
    pub async fn create(
        &self,
        caller: &user::Model,
        input: CreateRatingInput,
    ) -> AppResult<RatingWithUser> {
        let rating = self
            .rating_repo
            .create(
                self.id_gen.generate(),
                input.lesson,
                caller.id.clone(),
                input.rating,
            )
            .await?;

        tracing::info!(
            rating_id = %rating.id,
            lesson_id = %rating.lesson_id,
            rating = rating.rating.as_str(),
            "Created rating"
        );
        Ok((rating, Some(caller.clone())))
    }

    /// Change a rating.
    pub async fn update(&self, id: &str, input: UpdateRatingInput) -> AppResult<RatingWithUser> {
        self.rating_repo
            .update(id, input.lesson, input.rating)
            .await?;
        self.rating_repo.get_by_id(id).await
    }

    /// Delete a rating.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.rating_repo.delete(id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lms_common::AppError;
    use lms_db::entities::lesson;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[test]
    fn test_rating_value_from_payload() {
        let input: CreateRatingInput =
            serde_json::from_value(serde_json::json!({"lesson": "l1", "rating": "disliked"}))
                .unwrap();
        assert_eq!(input.rating, RatingValue::Disliked);

        let bad = serde_json::from_value::<CreateRatingInput>(
            serde_json::json!({"lesson": "l1", "rating": "meh"}),
        );
        assert!(bad.is_err());
    }

    #[tokio::test]
    async fn test_rate_missing_lesson() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<lesson::Model>::new()])
            .into_connection();
        let service = RatingService::new(RatingRepository::new(Arc::new(db)));

        let caller = user::Model {
            id: "student".to_string(),
            username: "student".to_string(),
            email: None,
            password_hash: "hash".to_string(),
            is_staff: false,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let result = service
            .create(
                &caller,
                CreateRatingInput {
                    lesson: "nope".to_string(),
                    rating: RatingValue::Liked,
                },
            )
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert_eq!(
                fields.get("lesson").unwrap(),
                ["Invalid pk \"nope\" - object does not exist.".to_string()]
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
