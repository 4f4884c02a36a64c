use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager and the repositories built on it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database pool has not been initialized")]
    NotInitialized,

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

// Postgres SQLSTATE codes surfaced to clients as conflicts
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            sqlx::Error::Database(ref db_err) => {
                let constraint = db_err.constraint().unwrap_or("constraint").to_string();
                let code = db_err.code().map(|c| c.into_owned());
                match code.as_deref() {
                    Some(UNIQUE_VIOLATION) => {
                        DatabaseError::Conflict(format!("A record with the same value already exists ({})", constraint))
                    }
                    Some(FOREIGN_KEY_VIOLATION) => {
                        DatabaseError::Conflict(format!("Operation conflicts with related records ({})", constraint))
                    }
                    Some(CHECK_VIOLATION) => {
                        DatabaseError::Conflict(format!("Value rejected by {}", constraint))
                    }
                    _ => DatabaseError::Sqlx(err),
                }
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Process-wide connection pool for the portal database
pub struct DatabaseManager;

static POOL: OnceLock<PgPool> = OnceLock::new();

impl DatabaseManager {
    /// Create the pool. Connections are opened lazily, so the server can
    /// start (and report 503 from /health) while the database is down.
    pub fn init(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if let Some(pool) = POOL.get() {
            return Ok(pool.clone());
        }
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&config.url)?;

        let pool = POOL.get_or_init(|| pool).clone();
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Get the shared pool
    pub fn pool() -> Result<PgPool, DatabaseError> {
        POOL.get().cloned().ok_or(DatabaseError::NotInitialized)
    }

    /// Apply embedded migrations from `migrations/`
    pub async fn migrate() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("clients"), "\"clients\"");
        assert_eq!(quote_identifier("bad\"name"), "\"bad\"\"name\"");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(DatabaseError::from(sqlx::Error::RowNotFound), DatabaseError::NotFound(_)));
    }

    #[test]
    fn pool_timeout_maps_to_connection_error() {
        assert!(matches!(DatabaseError::from(sqlx::Error::PoolTimedOut), DatabaseError::ConnectionError(_)));
    }

    #[test]
    fn empty_url_is_a_config_error() {
        let config = DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            connection_timeout: 1,
            run_migrations: false,
        };
        // Only meaningful before any pool exists in this test process
        if DatabaseManager::pool().is_err() {
            assert!(matches!(DatabaseManager::init(&config), Err(DatabaseError::ConfigMissing(_))));
        }
    }
}
