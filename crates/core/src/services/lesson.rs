//! Lesson service.

use std::sync::Arc;

use lms_common::{
    AppResult, IdGenerator,
    storage::{StorageBackend, generate_storage_key},
};
use lms_db::{
    entities::lesson,
    repositories::{LessonChanges, LessonFilter, LessonRepository, ListOptions},
};
use serde::Deserialize;
use validator::Validate;

use super::validation::not_blank;

const VIDEO_PREFIX: &str = "videos";

/// Input for creating or replacing a lesson.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonInput {
    /// Section ID.
    pub section: String,

    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub content: String,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    #[serde(default)]
    pub order: i32,
}

/// Input for partially updating a lesson.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLessonInput {
    pub section: Option<String>,

    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this field has no more than 200 characters.")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub content: Option<String>,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub order: Option<i32>,
}

impl From<CreateLessonInput> for UpdateLessonInput {
    fn from(input: CreateLessonInput) -> Self {
        Self {
            section: Some(input.section),
            title: Some(input.title),
            content: Some(input.content),
            order: Some(input.order),
        }
    }
}

/// Lesson service for business logic.
#[derive(Clone)]
pub struct LessonService {
    lesson_repo: LessonRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl LessonService {
    /// Create a new lesson service.
    #[must_use]
    pub fn new(lesson_repo: LessonRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            lesson_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// List lessons.
    pub async fn list(
        &self,
        filter: &LessonFilter,
        options: &ListOptions,
    ) -> AppResult<Vec<lesson::Model>> {
        self.lesson_repo.list(filter, options).await
    }

    /// Get a lesson by ID.
    pub async fn get(&self, id: &str) -> AppResult<lesson::Model> {
        self.lesson_repo.get_by_id(id).await
    }

    /// Create a lesson without a video.
    pub async fn create(&self, input: CreateLessonInput) -> AppResult<lesson::Model> {
        input.validate()?;

        let lesson = self
            .lesson_repo
            .create(
                self.id_gen.generate(),
                input.section,
                input.title,
                input.content,
                input.order,
            )
            .await?;

        tracing::info!(lesson_id = %lesson.id, section_id = %lesson.section_id, "Created lesson");
        Ok(lesson)
    }

    /// Update a lesson. The video is only changed through [`Self::attach_video`].
    pub async fn update(&self, id: &str, input: UpdateLessonInput) -> AppResult<lesson::Model> {
        input.validate()?;

        self.lesson_repo
            .update(
                id,
                LessonChanges {
                    section_id: input.section,
                    title: input.title,
                    content: input.content,
                    display_order: input.order,
                    video: None,
                },
            )
            .await
    }

    /// Store an uploaded video and point the lesson at it.
    ///
    /// A previous video stored under a different key is removed afterwards.
    pub async fn attach_video(
        &self,
        id: &str,
        file_name: &str,
        data: &[u8],
    ) -> AppResult<lesson::Model> {
        let current = self.lesson_repo.get_by_id(id).await?;

        let key = generate_storage_key(VIDEO_PREFIX, id, file_name);
        let uploaded = self.storage.upload(&key, data).await?;

        let lesson = self
            .lesson_repo
            .update(
                id,
                LessonChanges {
                    video: Some(Some(uploaded.key.clone())),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(old) = current.video.filter(|old| *old != uploaded.key) {
            if let Err(e) = self.storage.delete(&old).await {
                tracing::warn!(lesson_id = %id, key = %old, error = %e, "Failed to remove replaced video");
            }
        }

        tracing::info!(lesson_id = %id, key = %uploaded.key, size = uploaded.size, "Attached lesson video");
        Ok(lesson)
    }

    /// Public URL of a stored video.
    #[must_use]
    pub fn video_url(&self, key: &str) -> String {
        self.storage.public_url(key)
    }

    /// Delete a lesson and its video file.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let lesson = self.lesson_repo.get_by_id(id).await?;
        self.lesson_repo.delete(id).await?;

        if let Some(key) = lesson.video {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(lesson_id = %id, key = %key, error = %e, "Failed to remove lesson video");
            }
        }

        tracing::info!(lesson_id = %id, "Deleted lesson");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lms_common::{AppError, storage::UploadedFile};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Mutex;

    /// Keeps uploads in memory and records deletions.
    #[derive(Default)]
    struct MemoryStorage {
        uploaded: Mutex<Vec<String>>,
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(&self, key: &str, data: &[u8]) -> AppResult<UploadedFile> {
            self.uploaded.lock().unwrap().push(key.to_string());
            Ok(UploadedFile {
                key: key.to_string(),
                url: self.public_url(key),
                size: data.len() as u64,
            })
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/media/{key}")
        }
    }

    fn create_test_lesson(video: Option<&str>) -> lesson::Model {
        lesson::Model {
            id: "lesson1".to_string(),
            section_id: "section1".to_string(),
            title: "Ownership".to_string(),
            content: "Moves and borrows".to_string(),
            display_order: 0,
            video: video.map(str::to_string),
        }
    }

    fn service(db: MockDatabase, storage: Arc<MemoryStorage>) -> LessonService {
        LessonService::new(LessonRepository::new(Arc::new(db.into_connection())), storage)
    }

    #[tokio::test]
    async fn test_attach_video_replaces_previous_file() {
        let storage = Arc::new(MemoryStorage::default());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_lesson(Some("videos/lesson1_old.mp4"))]])
            .append_query_results([[create_test_lesson(Some("videos/lesson1_old.mp4"))]])
            .append_query_results([[create_test_lesson(Some("videos/lesson1_intro.mp4"))]]);

        let lesson = service(db, storage.clone())
            .attach_video("lesson1", "intro.mp4", b"frames")
            .await
            .unwrap();

        assert_eq!(lesson.video.as_deref(), Some("videos/lesson1_intro.mp4"));
        assert_eq!(
            *storage.uploaded.lock().unwrap(),
            ["videos/lesson1_intro.mp4".to_string()]
        );
        assert_eq!(
            *storage.deleted.lock().unwrap(),
            ["videos/lesson1_old.mp4".to_string()]
        );
    }

    #[tokio::test]
    async fn test_attach_video_to_missing_lesson() {
        let storage = Arc::new(MemoryStorage::default());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<lesson::Model>::new()]);

        let result = service(db, storage.clone())
            .attach_video("missing", "intro.mp4", b"frames")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(storage.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_video() {
        let storage = Arc::new(MemoryStorage::default());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_lesson(Some("videos/lesson1_intro.mp4"))]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }]);

        service(db, storage.clone()).delete("lesson1").await.unwrap();

        assert_eq!(
            *storage.deleted.lock().unwrap(),
            ["videos/lesson1_intro.mp4".to_string()]
        );
    }

    #[tokio::test]
    async fn test_create_validates_content() {
        let storage = Arc::new(MemoryStorage::default());
        let result = service(MockDatabase::new(DatabaseBackend::Postgres), storage)
            .create(CreateLessonInput {
                section: "section1".to_string(),
                title: "Ownership".to_string(),
                content: String::new(),
                order: 0,
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert!(fields.get("content").is_some()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_video_url() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            Arc::new(MemoryStorage::default()),
        );
        assert_eq!(service.video_url("videos/a.mp4"), "/media/videos/a.mp4");
    }
}
