//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use chrono::Utc;
use lms_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use super::db_err;

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Whether a username is already taken.
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Username.eq(username))
            .count(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// Create a new user.
    pub async fn create(
        &self,
        id: String,
        username: String,
        email: Option<String>,
        password_hash: String,
        is_staff: bool,
    ) -> AppResult<user::Model> {
        let model = user::ActiveModel {
            id: Set(id),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            is_staff: Set(is_staff),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Grant staff rights to an existing user.
    pub async fn promote_to_staff(&self, id: &str) -> AppResult<user::Model> {
        let user = self.get_by_id(id).await?;

        let mut active: user::ActiveModel = user.into();
        active.is_staff = Set(true);
        active.updated_at = Set(Some(Utc::now().into()));

        active.update(self.db.as_ref()).await.map_err(db_err)
    }
}
