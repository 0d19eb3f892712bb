//! Refresh token repository.
//!
//! Only refresh tokens are persisted; access tokens are stateless.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lms_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};

use super::db_err;
use crate::entities::{RefreshToken, refresh_token};

/// Repository for refresh token bookkeeping.
#[derive(Clone)]
pub struct RefreshTokenRepository {
    db: Arc<DatabaseConnection>,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a newly issued refresh token.
    pub async fn create(
        &self,
        id: String,
        user_id: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<refresh_token::Model> {
        let model = refresh_token::ActiveModel {
            id: Set(id),
            user_id: Set(user_id),
            expires_at: Set(expires_at.into()),
            created_at: Set(Utc::now().into()),
            revoked_at: Set(None),
        };

        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Find a token that is neither revoked nor expired.
    pub async fn find_active(&self, id: &str) -> AppResult<Option<refresh_token::Model>> {
        let now = Utc::now();
        RefreshToken::find_by_id(id)
            .filter(refresh_token::Column::RevokedAt.is_null())
            .filter(refresh_token::Column::ExpiresAt.gt(now))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Revoke one active token of a user. Returns whether a token was revoked.
    pub async fn revoke(&self, id: &str, user_id: &str) -> AppResult<bool> {
        let now = Utc::now();
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::RevokedAt, Expr::value(now))
            .filter(refresh_token::Column::Id.eq(id))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::RevokedAt.is_null())
            .filter(refresh_token::Column::ExpiresAt.gt(now))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Revoke every active token of a user. Returns the number revoked.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let now = Utc::now();
        let result = RefreshToken::update_many()
            .col_expr(refresh_token::Column::RevokedAt, Expr::value(now))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::RevokedAt.is_null())
            .filter(refresh_token::Column::ExpiresAt.gt(now))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete tokens that expired before `cutoff`.
    pub async fn delete_expired(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = RefreshToken::delete_many()
            .filter(refresh_token::Column::ExpiresAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }
}
