//! Course update notifications.

use std::sync::Arc;

use lms_common::AppResult;
use lms_db::{entities::course, repositories::EnrollmentRepository};
use tokio::task::JoinHandle;

use super::mail::{MailMessage, Mailer};

const SUBJECT: &str = "Platform updates";

/// Emails every enrolled user when a course changes.
#[derive(Clone)]
pub struct CourseNotifier {
    enrollment_repo: EnrollmentRepository,
    mailer: Arc<dyn Mailer>,
}

impl CourseNotifier {
    /// Create a new notifier.
    #[must_use]
    pub fn new(enrollment_repo: EnrollmentRepository, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            enrollment_repo,
            mailer,
        }
    }

    /// Queue one message per enrolled user with an email address.
    ///
    /// Recipients are resolved before returning; delivery runs on a background
    /// task whose handle is returned.
    pub async fn course_updated(&self, course: &course::Model) -> AppResult<JoinHandle<usize>> {
        let recipients = self.enrollment_repo.find_enrolled_emails(&course.id).await?;
        let messages = build_messages(&course.title, recipients);

        tracing::info!(
            course_id = %course.id,
            recipients = messages.len(),
            "Queued course update notifications"
        );

        let mailer = self.mailer.clone();
        Ok(tokio::spawn(async move {
            deliver(mailer.as_ref(), &messages).await
        }))
    }
}

fn build_messages(title: &str, recipients: Vec<String>) -> Vec<MailMessage> {
    let body = format!("Update information:\n\nCourse \"{title}\" has been updated.");
    recipients
        .into_iter()
        .map(|to| MailMessage {
            to,
            subject: SUBJECT.to_string(),
            body: body.clone(),
        })
        .collect()
}

/// Send messages one after another. A failed message is logged and skipped.
pub async fn deliver(mailer: &dyn Mailer, messages: &[MailMessage]) -> usize {
    let mut sent = 0;
    for message in messages {
        match mailer.send(message).await {
            Ok(()) => sent += 1,
            Err(e) => tracing::warn!(to = %message.to, error = %e, "Failed to send notification"),
        }
    }
    sent
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use lms_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Mutex;

    /// Records messages; fails for addresses starting with `bounce`.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: &MailMessage) -> AppResult<()> {
            if message.to.starts_with("bounce") {
                return Err(AppError::ExternalService("mailbox full".to_string()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn create_test_course() -> course::Model {
        course::Model {
            id: "course1".to_string(),
            title: "Rust 101".to_string(),
            description: String::new(),
            category_id: "cat1".to_string(),
            instructor_id: "mentor".to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_build_messages() {
        let messages = build_messages("Rust 101", vec!["a@example.com".to_string()]);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "Platform updates");
        assert!(messages[0].body.contains("Course \"Rust 101\" has been updated."));
    }

    #[tokio::test]
    async fn test_deliver_skips_failures() {
        let mailer = RecordingMailer::default();
        let messages = build_messages(
            "Rust 101",
            vec![
                "a@example.com".to_string(),
                "bounce@example.com".to_string(),
                "b@example.com".to_string(),
            ],
        );

        let sent = deliver(&mailer, &messages).await;

        assert_eq!(sent, 2);
        let recorded = mailer.sent.lock().unwrap();
        assert_eq!(recorded[0].to, "a@example.com");
        assert_eq!(recorded[1].to, "b@example.com");
    }

    #[tokio::test]
    async fn test_course_updated_mails_enrolled_users() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "email" => sea_orm::Value::from("a@example.com"),
                    },
                    maplit::btreemap! {
                        "email" => sea_orm::Value::from("b@example.com"),
                    },
                ]])
                .into_connection(),
        );
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = CourseNotifier::new(EnrollmentRepository::new(db), mailer.clone());

        let handle = notifier.course_updated(&create_test_course()).await.unwrap();

        assert_eq!(handle.await.unwrap(), 2);
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
    }
}
