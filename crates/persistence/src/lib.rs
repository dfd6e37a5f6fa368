//! Persistence layer for the quiz leaderboard
//!
//! Provides SQLite storage (relational backend) and, with the `mongo`
//! feature, a MongoDB document backend. Both implement `quiz_core::QuizStore`.

pub mod repository;
pub mod schema;
pub mod store;

#[cfg(feature = "mongo")]
pub mod mongo;

pub use sqlx::sqlite::SqlitePool;
pub use store::SqliteStore;

#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

use quiz_core::QuizError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Migration error: {0}")]
    Migration(String),

    /// Unique constraint hit; carries the conflicting key
    #[error("Unique constraint violated for {0}")]
    Conflict(String),

    /// Foreign key points at a missing row; carries the dangling key
    #[error("Referenced row does not exist: {0}")]
    MissingReference(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for QuizError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(email) => QuizError::DuplicateUser(email),
            DbError::MissingReference(user_id) => QuizError::UserNotFound(user_id),
            other => QuizError::Storage(other.to_string()),
        }
    }
}

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) a database file
    pub async fn new(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        Self::from_url(&format!("sqlite:{}", path.display())).await
    }

    /// Open a database from a `sqlite:` connection string
    pub async fn from_url(url: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::Connection(e.to_string()))?
            .create_if_missing(true)
            // WAL mode: allows concurrent reads during writes
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        debug!(url, "SQLite database ready");

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connection(e.to_string()))?
            .foreign_keys(true);

        // A single connection that never expires: the data lives in it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations (execute each statement individually)
    async fn run_migrations(&self) -> DbResult<()> {
        for statement in schema::CREATE_TABLES.split(';') {
            // Strip comment-only lines, then check if any SQL remains
            let sql: String = statement
                .lines()
                .filter(|line| !line.trim().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n");
            let sql = sql.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Migration(format!("{e}: {sql}")))?;
        }

        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Clone the pool for use in spawned tasks
    pub fn pool_clone(&self) -> SqlitePool {
        self.pool.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_maps_to_quiz_taxonomy() {
        assert!(matches!(
            QuizError::from(DbError::Conflict("a@x.com".into())),
            QuizError::DuplicateUser(email) if email == "a@x.com"
        ));
        assert!(matches!(
            QuizError::from(DbError::MissingReference("u1".into())),
            QuizError::UserNotFound(id) if id == "u1"
        ));
        assert!(matches!(
            QuizError::from(DbError::Query("boom".into())),
            QuizError::Storage(_)
        ));
    }

    #[tokio::test]
    async fn test_in_memory_creates_schema() {
        let db = Database::in_memory().await.unwrap();
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'results') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(names, vec!["results", "users"]);
    }

    #[tokio::test]
    async fn test_migrations_are_rerunnable() {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
    }
}
