//! User account repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use quire_core::{
    hash_password, new_v7, validate_password, CreateUserRequest, Error, Result, User,
    UserRepository,
};

const USER_COLUMNS: &str = "id, email, display_name, password_hash, is_admin, is_active, \
     created_at_utc, updated_at_utc, last_login_at_utc";

const DUPLICATE_EMAIL: &str = "A user with this email already exists";

/// Emails are matched case-insensitively and stored lower-cased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// PostgreSQL implementation of UserRepository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create an administrator, or promote and reset an existing account with
    /// the same email.
    ///
    /// Returns the user and whether it was newly created.
    pub async fn upsert_admin(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<(User, bool)> {
        let req = CreateUserRequest {
            email: email.to_string(),
            display_name: display_name.to_string(),
            password: password.to_string(),
            is_admin: true,
            is_active: true,
        };
        req.validate()?;

        let Some(existing) = self.get_by_email(email).await? else {
            let user = self.create(req).await?;
            return Ok((user, true));
        };

        let password_hash = hash_password(password)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE app_user
             SET display_name = $2, password_hash = $3, is_admin = TRUE, is_active = TRUE, updated_at_utc = $4
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(existing.id)
        .bind(display_name.trim())
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "users",
            op = "upsert_admin",
            user_id = %user.id,
            "Existing user promoted to administrator"
        );
        Ok((user, false))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, req: CreateUserRequest) -> Result<User> {
        req.validate()?;
        let password_hash = hash_password(&req.password)?;
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO app_user (id, email, display_name, password_hash, is_admin, is_active, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(new_v7())
        .bind(normalize_email(&req.email))
        .bind(req.display_name.trim())
        .bind(&password_hash)
        .bind(req.is_admin)
        .bind(req.is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::from_unique_violation(e, DUPLICATE_EMAIL))?;

        info!(
            subsystem = "database",
            component = "users",
            op = "create",
            user_id = %user.id,
            is_admin = user.is_admin,
            "User created"
        );
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM app_user WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM app_user WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM app_user ORDER BY created_at_utc DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE app_user SET is_active = $2, updated_at_utc = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::UserNotFound(id))?;

        if !active {
            // Deactivation ends every open session.
            sqlx::query("DELETE FROM user_session WHERE user_id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
        }

        info!(
            subsystem = "database",
            component = "users",
            op = "set_active",
            user_id = %id,
            active,
            "User activation changed"
        );
        Ok(user)
    }

    async fn set_password(&self, id: Uuid, password: &str) -> Result<()> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let result = sqlx::query(
            "UPDATE app_user SET password_hash = $2, updated_at_utc = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(id));
        }
        Ok(())
    }

    async fn first_admin(&self) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM app_user
             WHERE is_admin AND is_active
             ORDER BY created_at_utc, id
             LIMIT 1",
            USER_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE app_user SET last_login_at_utc = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Test.COM "), "admin@test.com");
    }
}
