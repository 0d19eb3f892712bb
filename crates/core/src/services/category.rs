//! Category service.

use lms_common::{AppResult, IdGenerator};
use lms_db::{
    entities::category,
    repositories::{CategoryRepository, ListOptions},
};
use serde::Deserialize;
use validator::Validate;

use super::validation::not_blank;

/// Input for creating or replacing a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub name: String,
}

/// Input for partially updating a category.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Ensure this field has no more than 100 characters.")
    )]
    pub name: Option<String>,
}

impl From<CreateCategoryInput> for UpdateCategoryInput {
    fn from(input: CreateCategoryInput) -> Self {
        Self {
            name: Some(input.name),
        }
    }
}

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    id_gen: IdGenerator,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self {
            category_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List categories.
    pub async fn list(&self, options: &ListOptions) -> AppResult<Vec<category::Model>> {
        self.category_repo.list(options).await
    }

    /// Get a category by ID.
    pub async fn get(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    /// Create a category.
    pub async fn create(&self, input: CreateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        let category = self
            .category_repo
            .create(self.id_gen.generate(), input.name)
            .await?;

        tracing::info!(category_id = %category.id, "Created category");
        Ok(category)
    }

    /// Update a category.
    pub async fn update(&self, id: &str, input: UpdateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;

        match input.name {
            Some(name) => {
                let category = self.category_repo.update(id, name).await?;
                tracing::info!(category_id = %id, "Updated category");
                Ok(category)
            }
            None => self.category_repo.get_by_id(id).await,
        }
    }

    /// Delete a category and everything below it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.category_repo.delete(id).await?;
        tracing::info!(category_id = %id, "Deleted category");
        Ok(())
    }
}
