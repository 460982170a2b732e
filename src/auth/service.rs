//! Password-based login and JWT issuance for tenant users.
//!
//! argon2 password hashing plus jsonwebtoken HS256 issuance, subjects are
//! UUIDs scoped to a tenant rather than bare integer user ids. There is no
//! separate API-key/signing-key issuance path - this system's programmatic
//! access is the JWT bearer token itself.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::Row;
use utoipa::ToSchema;

use crate::core_types::{TenantId, UserId};
use crate::error::{CoreError, CoreResult};

/// JWT claims. `sub` is the stringified user id; tenant membership is
/// re-resolved per-request by [`crate::tenant`] rather than trusted from a
/// claim, so a stale token can't pin a user to a tenant they've since left.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub tenant_id: TenantId,
    #[schema(example = "owner@example.com")]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
}

pub struct UserAuthService {
    db: PgPool,
    jwt_secret: String,
}

impl UserAuthService {
    pub fn new(db: PgPool, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    pub async fn register(&self, req: RegisterRequest) -> CoreResult<UserId> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| CoreError::internal(format!("password hashing failed: {e}")))?
            .to_string();

        let existing = sqlx::query("SELECT id FROM users WHERE tenant_id = $1 AND email = $2")
            .bind(req.tenant_id)
            .bind(&req.email)
            .fetch_optional(&self.db)
            .await?;
        if existing.is_some() {
            return Err(CoreError::conflict(format!(
                "a user with email {} already exists for this tenant",
                req.email
            )));
        }

        let row = sqlx::query(
            "INSERT INTO users (tenant_id, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(req.tenant_id)
        .bind(&req.email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        Ok(row.try_get("id")?)
    }

    pub async fn login(&self, req: LoginRequest) -> CoreResult<AuthResponse> {
        let row = sqlx::query("SELECT id, email, password_hash FROM users WHERE email = $1")
            .bind(&req.email)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| CoreError::access_denied("invalid email or password"))?;

        let password_hash: String = row.try_get("password_hash")?;
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| CoreError::internal(format!("stored hash is malformed: {e}")))?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| CoreError::access_denied("invalid email or password"))?;

        let user_id: UserId = row.try_get("id")?;
        let email: String = row.try_get("email")?;
        let token = self.issue_token(user_id)?;

        Ok(AuthResponse {
            token,
            user_id,
            email,
        })
    }

    pub fn issue_token(&self, user_id: UserId) -> CoreResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(24)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| CoreError::internal(format!("failed to sign token: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> CoreResult<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| CoreError::access_denied("invalid or expired token"))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> UserAuthService {
        UserAuthService::new(
            // No live pool needed for token-only tests.
            PgPool::connect_lazy("postgres://localhost/unused").unwrap(),
            "test-secret-at-least-16-bytes".to_string(),
        )
    }

    #[test]
    fn issued_token_verifies_back_to_same_subject() {
        let svc = service();
        let user_id = uuid::Uuid::new_v4();
        let token = svc.issue_token(user_id).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = service();
        let user_id = uuid::Uuid::new_v4();
        let mut token = svc.issue_token(user_id).unwrap();
        token.push('x');
        assert!(svc.verify_token(&token).is_err());
    }
}
