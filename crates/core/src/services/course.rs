//! Course service.

use lms_common::{AppResult, IdGenerator};
use lms_db::{
    entities::{course, user},
    repositories::{CourseChanges, CourseFilter, CourseRepository, ListOptions},
};
use serde::Deserialize;
use validator::Validate;

use super::{notification::CourseNotifier, validation::not_blank};

/// Input for creating or replacing a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub description: String,

    /// Category ID.
    pub category: String,

    /// Instructor user ID. Defaults to the caller on create.
    #[serde(default)]
    pub instructor: Option<String>,
}

/// Input for partially updating a course.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCourseInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,

    pub category: Option<String>,

    pub instructor: Option<String>,
}

impl From<CreateCourseInput> for UpdateCourseInput {
    fn from(input: CreateCourseInput) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            category: Some(input.category),
            instructor: input.instructor,
        }
    }
}

/// Course service for business logic.
#[derive(Clone)]
pub struct CourseService {
    course_repo: CourseRepository,
    notifier: CourseNotifier,
    id_gen: IdGenerator,
}

impl CourseService {
    /// Create a new course service.
    #[must_use]
    pub const fn new(course_repo: CourseRepository, notifier: CourseNotifier) -> Self {
        Self {
            course_repo,
            notifier,
            id_gen: IdGenerator::new(),
        }
    }

    /// List courses.
    pub async fn list(
        &self,
        filter: &CourseFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<course::Model>> {
        self.course_repo.list(filter, options).await
    }

    /// Get a course by ID.
    pub async fn get(&self, id: &str) -> AppResult<course::Model> {
        self.course_repo.get_by_id(id).await
    }

    /// Create a course. Without an explicit instructor the caller teaches it.
    pub async fn create(
        &self,
        caller: &user::Model,
        input: CreateCourseInput,
    ) -> AppResult<course::Model> {
        input.validate()?;

        let instructor_id = input.instructor.unwrap_or_else(|| caller.id.clone());
        let course = self
            .course_repo
            .create(
                self.id_gen.generate(),
                input.title,
                input.description,
                input.category,
                instructor_id,
            )
            .await?;

        tracing::info!(course_id = %course.id, "Created course");
        Ok(course)
    }

    /// Update a course and notify its enrolled users.
    ///
    /// Notification problems are logged and never fail the update.
    pub async fn update(&self, id: &str, input: UpdateCourseInput) -> AppResult<course::Model> {
        input.validate()?;

        let course = self
            .course_repo
            .update(
                id,
                CourseChanges {
                    title: input.title,
                    description: input.description,
                    category_id: input.category,
                    instructor_id: input.instructor,
                },
            )
            .await?;

        tracing::info!(course_id = %course.id, "Updated course");

        if let Err(e) = self.notifier.course_updated(&course).await {
            tracing::warn!(course_id = %course.id, error = %e, "Failed to queue course notifications");
        }

        Ok(course)
    }

    /// Delete a course and everything below it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.course_repo.delete(id).await?;
        tracing::info!(course_id = %id, "Deleted course");
        Ok(())
    }
}
