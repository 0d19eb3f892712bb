//! Comment service.

use lms_common::{AppResult, IdGenerator};
use lms_db::{
    entities::{comment, user},
    repositories::{CommentFilter, CommentRepository, ListOptions},
};
use serde::Deserialize;
use validator::Validate;

use super::validation::not_blank;

/// A comment together with its author.
pub type CommentWithUser = (comment::Model, Option<user::Model>);

/// Input for creating or replacing a comment. The author is always the caller.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    /// Lesson ID.
    pub lesson: String,

    #[validate(custom(function = "not_blank"))]
    pub comment: String,
}

/// Input for partially updating a comment.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCommentInput {
    pub lesson: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub comment: Option<String>,
}

impl From<CreateCommentInput> for UpdateCommentInput {
    fn from(input: CreateCommentInput) -> Self {
        Self {
            lesson: Some(input.lesson),
            comment: Some(input.comment),
        }
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository) -> Self {
        Self {
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List comments.
    pub async fn list(
        &self,
        filter: &CommentFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<CommentWithUser>> {
        self.comment_repo.list(filter, options).await
    }

    /// Get a comment by ID.
    pub async fn get(&self, id: &str) -> AppResult<CommentWithUser> {
        self.comment_repo.get_by_id(id).await
    }

    /// Post a comment as the caller.
    pub async fn create(
        &self,
        caller: &user::Model,
        input: CreateCommentInput,
    ) -> AppResult<CommentWithUser> {
        input.validate()?;

        let comment = self
            .comment_repo
            .create(
                self.id_gen.generate(),
                input.lesson,
                caller.id.clone(),
                input.comment,
            )
            .await?;

        tracing::info!(comment_id = %comment.id, lesson_id = %comment.lesson_id, "Created comment");
        Ok((comment, Some(caller.clone())))
    }

    /// Edit a comment.
    pub async fn update(&self, id: &str, input: UpdateCommentInput) -> AppResult<CommentWithUser> {
        input.validate()?;

        self.comment_repo
            .update(id, input.lesson, input.comment)
            .await?;
        self.comment_repo.get_by_id(id).await
    }

    /// Delete a comment.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.comment_repo.delete(id).await
    }
}
