//! # quire-db
//!
//! PostgreSQL database layer for quire.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, tags, users and sessions
//! - Full-text note search with PostgreSQL tsvector
//!
//! ## Example
//!
//! ```rust,ignore
//! use quire_db::{Database, NoteSearch, NoteSearchParams, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect_with_config("postgres://localhost/quire", PoolConfig::from_env()).await?;
//!
//!     let params = NoteSearchParams::from_raw(Some("postgres"), ["database"], false, None);
//!     for note in db.search.search(&params).await? {
//!         println!("{} ({:?})", note.title, note.score);
//!     }
//!     Ok(())
//! }
//! ```
pub mod notes;
pub mod pool;
pub mod search;
pub mod sessions;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use quire_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use notes::PgNoteRepository;
pub use pool::{create_pool_with_config, PoolConfig};
pub use search::{NoteQueryBuilder, PgNoteSearch};
pub use sessions::PgSessionRepository;
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for CRUD operations.
    pub notes: PgNoteRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// User accounts.
    pub users: PgUserRepository,
    /// Login sessions.
    pub sessions: PgSessionRepository,
    /// Full-text and sorted note search.
    pub search: PgNoteSearch,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            search: PgNoteSearch::new(pool.clone()),
            pool,
        }
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
