//! Section service.

use lms_common::{AppResult, IdGenerator};
use lms_db::{
    entities::section,
    repositories::{ListOptions, SectionChanges, SectionFilter, SectionRepository},
};
use serde::Deserialize;
use validator::Validate;

use super::validation::not_blank;

/// Input for creating or replacing a section.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSectionInput {
    /// Course ID.
    pub course: String,

    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: String,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    #[serde(default)]
    pub order: i32,
}

/// Input for partially updating a section.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSectionInput {
    pub course: Option<String>,

    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: Option<String>,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub order: Option<i32>,
}

impl From<CreateSectionInput> for UpdateSectionInput {
    fn from(input: CreateSectionInput) -> Self {
        Self {
            course: Some(input.course),
            title: Some(input.title),
            order: Some(input.order),
        }
    }
}

/// Section service for business logic.
#[derive(Clone)]
pub struct SectionService {
    section_repo: SectionRepository,
    id_gen: IdGenerator,
}

impl SectionService {
    /// Create a new section service.
    #[must_use]
    pub const fn new(section_repo: SectionRepository) -> Self {
        Self {
            section_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List sections.
    pub async fn list(
        &self,
        filter: &SectionFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<section::Model>> {
        self.section_repo.list(filter, options).await
    }

    /// Get a section by ID.
    pub async fn get(&self, id: &str) -> AppResult<section::Model> {
        self.section_repo.get_by_id(id).await
    }

    /// Create a section.
    pub async fn create(&self, input: CreateSectionInput) -> AppResult<section::Model> {
        input.validate()?;

        let section = self
            .section_repo
            .create(self.id_gen.generate(), input.course, input.title, input.order)
            .await?;

        tracing::info!(section_id = %section.id, course_id = %section.course_id, "Created section");
        Ok(section)
    }

    /// Update a section.
    pub async fn update(&self, id: &str, input: UpdateSectionInput) -> AppResult<section::Model> {
        input.validate()?;

        self.section_repo
            .update(
                id,
                SectionChanges {
                    course_id: input.course,
                    title: input.title,
                    display_order: input.order,
                },
            )
            .await
    }

    /// Delete a section and its lessons.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.section_repo.delete(id).await
    }
}
