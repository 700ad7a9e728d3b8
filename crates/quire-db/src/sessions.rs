//! Login sessions backed by opaque bearer tokens.
//!
//! Only the SHA-256 of a token is stored; the token itself is returned to the
//! client once at login.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use quire_core::defaults::SESSION_TOKEN_PREFIX;
use quire_core::{Error, Result, SessionRepository, User};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Generate a new token: prefix plus 32 random bytes in hex.
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("{}{}", SESSION_TOKEN_PREFIX, hex::encode(bytes))
    }

    /// Hash a token using SHA256.
    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<String> {
        let token = Self::generate_token();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO user_session (token_hash, user_id, created_at_utc, expires_at_utc)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(Self::hash_token(&token))
        .bind(user_id)
        .bind(now)
        .bind(now + ttl)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "auth",
            component = "sessions",
            op = "create",
            user_id = %user_id,
            ttl_secs = ttl.num_seconds(),
            "Session created"
        );
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<User>> {
        if !token.starts_with(SESSION_TOKEN_PREFIX) {
            return Ok(None);
        }

        sqlx::query_as::<_, User>(
            "SELECT u.id, u.email, u.display_name, u.password_hash, u.is_admin, u.is_active,
                    u.created_at_utc, u.updated_at_utc, u.last_login_at_utc
             FROM user_session s
             JOIN app_user u ON u.id = s.user_id
             WHERE s.token_hash = $1 AND s.expires_at_utc > $2 AND u.is_active",
        )
        .bind(Self::hash_token(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_session WHERE token_hash = $1")
            .bind(Self::hash_token(token))
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_session WHERE expires_at_utc <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = PgSessionRepository::generate_token();
        assert!(token.starts_with(SESSION_TOKEN_PREFIX));
        assert_eq!(token.len(), SESSION_TOKEN_PREFIX.len() + 64);
        assert_ne!(token, PgSessionRepository::generate_token());
    }

    #[test]
    fn test_hash_is_stable_hex() {
        let a = PgSessionRepository::hash_token("qs_abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, PgSessionRepository::hash_token("qs_abc"));
        assert_ne!(a, PgSessionRepository::hash_token("qs_abd"));
    }
}
