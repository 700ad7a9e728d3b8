//! Database connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use quire_core::{Error, Result};

/// Default maximum number of connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Environment variable overriding the maximum pool size.
pub const MAX_CONNECTIONS_ENV: &str = "DB_MAX_CONNECTIONS";

/// How long a request waits for a free connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Pool sizing.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with `DB_MAX_CONNECTIONS` applied when set to a positive number.
    pub fn from_env() -> Self {
        Self::from_max_connections_var(std::env::var(MAX_CONNECTIONS_ENV).ok().as_deref())
    }

    fn from_max_connections_var(value: Option<&str>) -> Self {
        match value.and_then(|v| v.trim().parse::<u32>().ok()) {
            Some(n) if n > 0 => Self::new().max_connections(n),
            _ => Self::new(),
        }
    }

    /// Set the maximum number of connections.
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }
}

/// Open a PostgreSQL connection pool.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "pool",
        op = "established",
        max_connections = config.max_connections,
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connections_from_env_value() {
        assert_eq!(PoolConfig::from_max_connections_var(Some("4")).max_connections, 4);
        assert_eq!(PoolConfig::from_max_connections_var(Some(" 12 ")).max_connections, 12);
        assert_eq!(
            PoolConfig::from_max_connections_var(Some("0")).max_connections,
            DEFAULT_MAX_CONNECTIONS
        );
        assert_eq!(
            PoolConfig::from_max_connections_var(Some("many")).max_connections,
            DEFAULT_MAX_CONNECTIONS
        );
        assert_eq!(
            PoolConfig::from_max_connections_var(None).max_connections,
            DEFAULT_MAX_CONNECTIONS
        );
    }
}
