//! Users repository: one row per email

use crate::{DbError, DbResult};
use chrono::{DateTime, Utc};
use quiz_core::User;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A persisted user row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    /// Unix seconds
    pub created_at: i64,
}

impl TryFrom<UserRecord> for User {
    type Error = DbError;

    fn try_from(record: UserRecord) -> DbResult<Self> {
        let created_at = DateTime::<Utc>::from_timestamp(record.created_at, 0).ok_or_else(|| {
            DbError::Query(format!("invalid created_at {} for user {}", record.created_at, record.id))
        })?;

        Ok(User {
            id: record.id,
            email: record.email,
            name: record.name,
            picture: record.picture,
            created_at,
        })
    }
}

/// Repository for quiz users
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a user by its natural key
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, name, picture, created_at FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Insert a new user (plain INSERT, fails with `Conflict` if the email exists)
    pub async fn insert(&self, record: &UserRecord) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO users (id, email, name, picture, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(&record.id)
        .bind(&record.email)
        .bind(&record.name)
        .bind(&record.picture)
        .bind(record.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DbError::Conflict(record.email.clone())
            }
            other => DbError::Sqlx(other),
        })?;

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
