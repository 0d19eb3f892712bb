//! Access and refresh token service.
//!
//! Both tokens are HS256 JWTs. Access tokens are stateless and short-lived;
//! every refresh token is also recorded so logout can revoke it.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use lms_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use lms_db::repositories::RefreshTokenRepository;
use serde::{Deserialize, Serialize};

/// Which of the two credentials a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims carried by both token types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issue time, seconds since the epoch.
    pub iat: i64,
    /// Token ID; the primary key of the stored refresh token.
    pub jti: String,
    pub token_type: TokenType,
    pub iss: String,
}

/// Freshly issued credentials.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Token service.
#[derive(Clone)]
pub struct TokenService {
    refresh_repo: RefreshTokenRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    id_gen: IdGenerator,
}

impl TokenService {
    /// Create a new token service.
    #[must_use]
    pub fn new(refresh_repo: RefreshTokenRepository, config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            refresh_repo,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            access_ttl: Duration::seconds(config.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_secs),
            id_gen: IdGenerator::new(),
        }
    }

    /// Issue an access token and a recorded refresh token for a user.
    pub async fn issue_pair(&self, user_id: &str) -> AppResult<TokenPair> {
        let access = self.issue(user_id, TokenType::Access)?.0;
        let (refresh, claims) = self.issue(user_id, TokenType::Refresh)?;

        let expires_at = Utc::now() + self.refresh_ttl;
        self.refresh_repo
            .create(claims.jti, user_id.to_string(), expires_at)
            .await?;

        tracing::info!(user_id = %user_id, "Issued token pair");
        Ok(TokenPair { access, refresh })
    }

    /// Exchange a live refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.decode(refresh_token, TokenType::Refresh)?;

        if self.refresh_repo.find_active(&claims.jti).await?.is_none() {
            return Err(AppError::Unauthorized(
                "Token is invalid or expired".to_string(),
            ));
        }

        Ok(self.issue(&claims.sub, TokenType::Access)?.0)
    }

    /// Validate an access token and return its claims.
    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.decode(token, TokenType::Access)
    }

    /// Revoke refresh tokens of `user_id`.
    ///
    /// With a token, only that token is revoked and it must be an active token
    /// of the same user. Without one, every active token of the user is revoked.
    /// Revoking nothing is an error.
    pub async fn revoke(&self, user_id: &str, refresh_token: Option<&str>) -> AppResult<u64> {
        let revoked = match refresh_token {
            Some(token) => {
                let claims = self
                    .decode(token, TokenType::Refresh)
                    .map_err(|_| AppError::BadRequest("Token is invalid or expired".to_string()))?;
                if claims.sub == user_id
                    && self.refresh_repo.revoke(&claims.jti, user_id).await?
                {
                    1
                } else {
                    0
                }
            }
            None => self.refresh_repo.revoke_all_for_user(user_id).await?,
        };

        if revoked == 0 {
            return Err(AppError::BadRequest(
                "No active session to log out".to_string(),
            ));
        }

        tracing::info!(user_id = %user_id, revoked, "Revoked refresh tokens");
        Ok(revoked)
    }

    /// Drop refresh tokens that expired more than a day ago.
    pub async fn prune_expired(&self) -> AppResult<u64> {
        let removed = self
            .refresh_repo
            .delete_expired(Utc::now() - Duration::days(1))
            .await?;
        if removed > 0 {
            tracing::info!(removed, "Pruned expired refresh tokens");
        }
        Ok(removed)
    }

    fn issue(&self, user_id: &str, token_type: TokenType) -> AppResult<(String, Claims)> {
        let now = Utc::now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: self.id_gen.generate_token(),
            token_type,
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))?;
        Ok((token, claims))
    }

    fn decode(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        if claims.token_type != expected {
            return Err(AppError::Unauthorized("Token has wrong type".to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lms_db::entities::refresh_token;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn auth_config(access_ttl: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: "lms".to_string(),
            access_token_ttl_secs: access_ttl,
            refresh_token_ttl_secs: 3600,
        }
    }

    fn stored_token(jti: &str) -> refresh_token::Model {
        refresh_token::Model {
            id: jti.to_string(),
            user_id: "user1".to_string(),
            expires_at: (Utc::now() + Duration::hours(1)).into(),
            created_at: Utc::now().into(),
            revoked_at: None,
        }
    }

    fn service(db: MockDatabase, access_ttl: i64) -> TokenService {
        TokenService::new(
            RefreshTokenRepository::new(Arc::new(db.into_connection())),
            &auth_config(access_ttl),
        )
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), 300);

        let (token, issued) = service.issue("user1", TokenType::Access).unwrap();
        let claims = service.verify_access(&token).unwrap();

        assert_eq!(claims, issued);
        assert_eq!(claims.sub, "user1");
        assert_eq!(claims.iss, "lms");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), 300);

        let (token, _) = service.issue("user1", TokenType::Refresh).unwrap();
        let result = service.verify_access(&token);

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_access_token_is_rejected() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), -10);

        let (token, _) = service.issue("user1", TokenType::Access).unwrap();
        match service.verify_access(&token) {
            Err(AppError::Unauthorized(message)) => assert_eq!(message, "Token has expired"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let ours = service(MockDatabase::new(DatabaseBackend::Postgres), 300);
        let theirs = TokenService::new(
            RefreshTokenRepository::new(Arc::new(
                MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            )),
            &AuthConfig {
                jwt_secret: "another-secret".to_string(),
                ..auth_config(300)
            },
        );

        let (token, _) = theirs.issue("user1", TokenType::Access).unwrap();
        assert!(ours.verify_access(&token).is_err());
        assert!(ours.verify_access("not-a-jwt").is_err());
    }

    #[tokio::test]
    async fn test_issue_pair_records_refresh_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored_token("jti")]]);
        let service = service(db, 300);

        let pair = service.issue_pair("user1").await.unwrap();

        assert_eq!(service.verify_access(&pair.access).unwrap().sub, "user1");
        assert!(service.verify_access(&pair.refresh).is_err());
    }

    #[tokio::test]
    async fn test_refresh_requires_stored_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored_token("jti")]])
            .append_query_results([Vec::<refresh_token::Model>::new()]);
        let service = service(db, 300);

        let (refresh, _) = service.issue("user1", TokenType::Refresh).unwrap();

        let access = service.refresh(&refresh).await.unwrap();
        assert_eq!(service.verify_access(&access).unwrap().sub, "user1");

        let revoked = service.refresh(&refresh).await;
        assert!(matches!(revoked, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_revoke_without_active_tokens_is_bad_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);
        let service = service(db, 300);

        let result = service.revoke("user1", None).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_revoke_other_users_token_is_bad_request() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres), 300);

        let (refresh, _) = service.issue("someone-else", TokenType::Refresh).unwrap();
        let result = service.revoke("user1", Some(&refresh)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
