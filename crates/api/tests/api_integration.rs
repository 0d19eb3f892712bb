//! API integration tests.
//!
//! Every test drives the full router against a fresh in-memory `SQLite`
//! database migrated with the production migrations.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use lms_api::{AppState, app};
use lms_common::{
    IdGenerator, LocalStorage,
    config::{
        AdminConfig, AuthConfig, Config, DatabaseConfig, MailConfig, MediaConfig, ServerConfig,
    },
};
use lms_core::LogMailer;
use lms_db::test_utils::TestDatabase;
use serde_json::{Value, json};
use tower::ServiceExt;

const STAFF_PASSWORD: &str = "staff-password";

struct TestApp {
    router: Router,
    state: AppState,
    media_root: PathBuf,
}

fn create_test_config(media_root: PathBuf) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: "integration-secret".to_string(),
            issuer: "lms".to_string(),
            access_token_ttl_secs: 300,
            refresh_token_ttl_secs: 3600,
        },
        mail: MailConfig::default(),
        media: MediaConfig {
            root: media_root,
            base_url: "/media".to_string(),
            max_upload_bytes: 1024 * 1024,
        },
        admin: None,
    }
}

impl TestApp {
    async fn new() -> Self {
        let db = Arc::new(TestDatabase::new().await.unwrap().into_connection());
        let media_root =
            std::env::temp_dir().join(format!("lms-api-test-{}", IdGenerator::new().generate()));
        let config = create_test_config(media_root.clone());

        let storage = Arc::new(LocalStorage::new(
            config.media.root.clone(),
            config.media.base_url.clone(),
        ));
        let state = AppState::new(db, &config, Arc::new(LogMailer), storage);

        Self {
            router: app(state.clone()),
            state,
            media_root,
        }
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send(builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    async fn login(&self, username: &str, password: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/login/",
                None,
                json!({"username": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body
    }

    async fn staff_token(&self) -> String {
        self.state
            .user_service
            .ensure_admin(&AdminConfig {
                username: "staff".to_string(),
                password: STAFF_PASSWORD.to_string(),
                email: None,
            })
            .await
            .unwrap();
        self.login("staff", STAFF_PASSWORD).await["access"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn student_token(&self, username: &str) -> String {
        let (status, _) = self
            .post(
                "/api/v1/register/",
                None,
                json!({"username": username, "password": "student-password"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        self.login(username, "student-password").await["access"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Category → course → section → lesson, returning their IDs.
    async fn seed_catalog(&self, token: &str) -> (String, String, String, String) {
        let (_, category) = self
            .post("/api/v1/categories/", Some(token), json!({"name": "Programming"}))
            .await;
        let category_id = category["id"].as_str().unwrap().to_string();

        let (_, course) = self
            .post(
                "/api/v1/courses/",
                Some(token),
                json!({"title": "Rust", "description": "Systems", "category": category_id}),
            )
            .await;
        let course_id = course["id"].as_str().unwrap().to_string();

        let (_, section) = self
            .post(
                "/api/v1/sections/",
                Some(token),
                json!({"course": course_id, "title": "Basics", "order": 1}),
            )
            .await;
        let section_id = section["id"].as_str().unwrap().to_string();

        let (_, lesson) = self
            .post(
                "/api/v1/lessons/",
                Some(token),
                json!({"section": section_id, "title": "Ownership", "content": "Moves"}),
            )
            .await;
        let lesson_id = lesson["id"].as_str().unwrap().to_string();

        (category_id, course_id, section_id, lesson_id)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.media_root).ok();
    }
}

#[tokio::test]
async fn test_course_permissions() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let student = app.student_token("alice").await;

    let (status, body) = app.get("/api/v1/courses/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, category) = app
        .post("/api/v1/categories/", Some(&staff), json!({"name": "Data"}))
        .await;
    let payload = json!({
        "title": "SQL",
        "description": "Queries",
        "category": category["id"],
    });

    let (status, body) = app.post("/api/v1/courses/", None, payload.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = app
        .post("/api/v1/courses/", Some(&student), payload.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post("/api/v1/courses/", Some(&staff), payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "SQL");
    assert!(body["instructor"].is_string());
}

#[tokio::test]
async fn test_both_api_versions_share_handlers() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;

    let (status, category) = app
        .post("/api/v2/categories/", Some(&staff), json!({"name": "Design"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/v1/categories/{}/", category["id"].as_str().unwrap());
    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Design");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new().await;
    let payload = json!({
        "username": "bob",
        "password": "long-password",
        "email": "bob@example.com",
    });

    let (status, body) = app.post("/api/v1/register/", None, payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["email"], "bob@example.com");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let (status, body) = app.post("/api/v1/register/", None, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["fields"]["username"][0],
        "A user with that username already exists."
    );
}

#[tokio::test]
async fn test_comment_user_comes_from_caller() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (.., lesson_id) = app.seed_catalog(&staff).await;
    let student = app.student_token("carol").await;

    let (status, body) = app
        .post(
            "/api/v1/comments/",
            Some(&student),
            json!({"lesson": lesson_id, "comment": "Clear!", "user": "staff"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "carol");

    let (status, body) = app.get("/api/v1/comments/", Some(&student)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = app
        .post(
            "/api/v1/comments/",
            None,
            json!({"lesson": lesson_id, "comment": "Anonymous"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rating_and_enrollment_bind_caller() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (_, course_id, _, lesson_id) = app.seed_catalog(&staff).await;
    let student = app.student_token("dave").await;

    let (status, body) = app
        .post(
            "/api/v1/ratings/",
            Some(&student),
            json!({"lesson": lesson_id, "rating": "liked"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "dave");
    assert_eq!(body["rating"], "liked");

    let (_, body) = app.get("/api/v1/ratings/?rating=disliked", None).await;
    assert_eq!(body, json!([]));

    let (status, _) = app.get("/api/v1/enrollments/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/api/v1/enrollments/",
            Some(&student),
            json!({"course": course_id, "user": "staff"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"], "dave");

    let (_, body) = app.get("/api/v1/enrollments/?search=DAV", Some(&student)).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleting_category_cascades() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (category_id, course_id, section_id, lesson_id) = app.seed_catalog(&staff).await;

    let (status, body) = app
        .request(
            Method::DELETE,
            &format!("/api/v1/categories/{category_id}/"),
            Some(&staff),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    for uri in [
        format!("/api/v1/courses/{course_id}/"),
        format!("/api/v1/sections/{section_id}/"),
        format!("/api/v1/lessons/{lesson_id}/"),
    ] {
        let (status, _) = app.get(&uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_token_lifecycle() {
    let app = TestApp::new().await;
    app.student_token("erin").await;

    let tokens = app.login("erin", "student-password").await;
    let access = tokens["access"].as_str().unwrap();
    let refresh = tokens["refresh"].as_str().unwrap();

    let (status, body) = app
        .post("/api/v1/token/refresh/", None, json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let renewed = body["access"].as_str().unwrap();
    let (status, _) = app.get("/api/v1/enrollments/", Some(renewed)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/v1/logout/", Some(access), json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post("/api/v1/token/refresh/", None, json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The session from student_token is still live
    let (status, _) = app
        .request(Method::POST, "/api/v1/logout/", Some(access), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .request(Method::POST, "/api/v1/logout/", Some(access), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(
        body["error"]["message"],
        "Bad request: No active session to log out"
    );
}

#[tokio::test]
async fn test_bad_credentials() {
    let app = TestApp::new().await;
    app.student_token("frank").await;

    let (status, _) = app
        .post(
            "/api/v1/login/",
            None,
            json!({"username": "frank", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/v1/courses/", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lesson_filter_and_course_ordering() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (category_id, course_id, section_id, lesson_id) = app.seed_catalog(&staff).await;

    let (_, other_section) = app
        .post(
            "/api/v1/sections/",
            Some(&staff),
            json!({"course": course_id, "title": "Advanced"}),
        )
        .await;
    assert_eq!(other_section["order"], 0);
    app.post(
        "/api/v1/lessons/",
        Some(&staff),
        json!({"section": other_section["id"], "title": "Lifetimes", "content": "'a"}),
    )
    .await;

    let (status, body) = app
        .get(&format!("/api/v1/lessons/?section={section_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let lessons = body.as_array().unwrap();
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0]["id"], lesson_id.as_str());

    for title in ["Zig", "Go"] {
        app.post(
            "/api/v1/courses/",
            Some(&staff),
            json!({"title": title, "description": "Lang", "category": category_id}),
        )
        .await;
    }

    let (_, body) = app.get("/api/v1/courses/?ordering=title", None).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Go", "Rust", "Zig"]);

    let (_, body) = app
        .get("/api/v1/courses/?ordering=-title,bogus&limit=1", None)
        .await;
    assert_eq!(body[0]["title"], "Zig");
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_errors() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;

    let (status, body) = app
        .post("/api/v1/courses/", Some(&staff), json!({"title": "No category"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["error"]["fields"]["description"][0],
        "This field is required."
    );

    let (status, body) = app
        .post(
            "/api/v1/courses/",
            Some(&staff),
            json!({"title": "Orphan", "description": "x", "category": "missing"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["fields"]["category"][0],
        "Invalid pk \"missing\" - object does not exist."
    );

    let (status, _) = app.get("/api/v1/sections/does-not-exist/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mistyped_values_are_field_errors() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (_, course_id, _, lesson_id) = app.seed_catalog(&staff).await;
    let student = app.student_token("grace").await;

    let (status, body) = app
        .post(
            "/api/v1/ratings/",
            Some(&student),
            json!({"lesson": lesson_id, "rating": "great"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let message = body["error"]["fields"]["rating"][0].as_str().unwrap();
    assert!(message.contains("unknown variant `great`"));

    let (_, body) = app.get("/api/v1/ratings/", None).await;
    assert_eq!(body, json!([]));

    let (status, body) = app
        .post(
            "/api/v1/sections/",
            Some(&staff),
            json!({"course": course_id, "title": "Extra", "order": "abc"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["order"][0].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/categories/")
        .header(header::AUTHORIZATION, format!("Bearer {staff}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name": "#))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (_, course_id, ..) = app.seed_catalog(&staff).await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/api/v1/courses/{course_id}/"),
            Some(&staff),
            Some(json!({"title": "Rust 2024"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Rust 2024");
    assert_eq!(body["description"], "Systems");
}

#[tokio::test]
async fn test_upload_lesson_video() {
    let app = TestApp::new().await;
    let staff = app.staff_token().await;
    let (.., lesson_id) = app.seed_catalog(&staff).await;

    let boundary = "lms-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"video\"; filename=\"intro clip.mp4\"\r\n\
         Content-Type: video/mp4\r\n\r\n\
         not really a video\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/lessons/{lesson_id}/video/"))
        .header(header::AUTHORIZATION, format!("Bearer {staff}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let expected = format!("/media/videos/{lesson_id}_intro_clip.mp4");
    assert_eq!(body["video"], expected.as_str());
    assert!(
        app.media_root
            .join(format!("videos/{lesson_id}_intro_clip.mp4"))
            .exists()
    );
}
