//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use lms_common::{AppError, AppResult, IdGenerator, config::AdminConfig};
use lms_db::{entities::user, repositories::UserRepository};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Message returned for any failed login.
const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        length(
            min = 1,
            max = 150,
            message = "Ensure this field has between 1 and 150 characters."
        ),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Ensure this field has between 8 and 128 characters."
    ))]
    pub password: String,

    #[validate(email(message = "Enter a valid email address."))]
    #[serde(default)]
    pub email: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new, non-staff user.
    pub async fn register(&self, mut input: RegisterInput) -> AppResult<user::Model> {
        input.email = input.email.filter(|email| !email.trim().is_empty());
        input.validate()?;

        if self.user_repo.username_exists(&input.username).await? {
            return Err(AppError::invalid_field(
                "username",
                "A user with that username already exists.",
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let user = self
            .user_repo
            .create(
                self.id_gen.generate(),
                input.username,
                input.email,
                password_hash,
                false,
            )
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// Check a username/password pair.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(username = %username, "Rejected login with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Find a user by ID.
    pub async fn find(&self, id: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_id(id).await
    }

    /// Make sure the configured staff account exists.
    ///
    /// An existing user with that name is promoted; its password is left as is.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> AppResult<user::Model> {
        if let Some(existing) = self.user_repo.find_by_username(&admin.username).await? {
            if existing.is_staff {
                return Ok(existing);
            }
            tracing::info!(username = %admin.username, "Promoting existing user to staff");
            return self.user_repo.promote_to_staff(&existing.id).await;
        }

        let password_hash = hash_password(&admin.password)?;
        let user = self
            .user_repo
            .create(
                self.id_gen.generate(),
                admin.username.clone(),
                admin.email.clone(),
                password_hash,
                true,
            )
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Created staff account");
        Ok(user)
    }
}

/// Letters, digits and `@.+-_` only.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(username: &str, password: &str, is_staff: bool) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: username.to_string(),
            email: None,
            password_hash: hash_password(password).unwrap(),
            is_staff,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn count_row(count: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(count)) }
    }

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert_ne!(hash, password);
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice.smith+test@x_y-z").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service
            .register(RegisterInput {
                username: "alice".to_string(),
                password: "long-enough".to_string(),
                email: None,
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => assert_eq!(
                fields.get("username").unwrap(),
                ["A user with that username already exists.".to_string()]
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_validates_before_touching_database() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));
        let result = service
            .register(RegisterInput {
                username: "bad name".to_string(),
                password: "short".to_string(),
                email: Some("not-an-email".to_string()),
            })
            .await;

        match result {
            Err(AppError::Validation(fields)) => {
                assert!(fields.get("username").is_some());
                assert!(fields.get("password").is_some());
                assert!(fields.get("email").is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate() {
        let user = create_test_user("alice", "correct horse", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_query_results([[user]])
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));

        let ok = service.authenticate("alice", "correct horse").await.unwrap();
        assert_eq!(ok.username, "alice");

        let wrong = service.authenticate("alice", "battery staple").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        let unknown = service.authenticate("nobody", "whatever").await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_keeps_existing_staff() {
        let admin = create_test_user("root", "password123", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin.clone()]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service
            .ensure_admin(&AdminConfig {
                username: "root".to_string(),
                password: "ignored-password".to_string(),
                email: None,
            })
            .await
            .unwrap();

        assert_eq!(result, admin);
    }
}
