//! Results repository: quiz submissions and the user join

use crate::{DbError, DbResult};
use quiz_core::JoinedResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A submission to be persisted; `id` is assigned by SQLite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub user_id: String,
    pub points: i64,
    pub time_taken: f64,
    /// Unix seconds
    pub created_at: i64,
}

/// A result row joined with its user's display name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JoinedResultRow {
    pub user_id: String,
    pub name: String,
    pub points: i64,
    pub time_taken: f64,
}

impl From<JoinedResultRow> for JoinedResult {
    fn from(row: JoinedResultRow) -> Self {
        JoinedResult {
            user_id: row.user_id,
            name: row.name,
            points: row.points,
            time_taken: row.time_taken,
        }
    }
}

/// Repository for quiz results
pub struct ResultRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ResultRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a submission. Returns the new row id.
    pub async fn insert(&self, record: &ResultRecord) -> DbResult<i64> {
        let result = sqlx::query(
            r#"INSERT INTO results (user_id, points, time_taken, created_at)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(&record.user_id)
        .bind(record.points)
        .bind(record.time_taken)
        .bind(record.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                DbError::MissingReference(record.user_id.clone())
            }
            other => DbError::Sqlx(other),
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Inner join of results to users, oldest submission first
    pub async fn joined_in_insertion_order(&self) -> DbResult<Vec<JoinedResultRow>> {
        let rows = sqlx::query_as::<_, JoinedResultRow>(
            r#"SELECT r.user_id AS user_id, u.name AS name,
                      r.points AS points, r.time_taken AS time_taken
               FROM results r
               INNER JOIN users u ON u.id = r.user_id
               ORDER BY r.id ASC"#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Whether any submission exists for the user
    pub async fn exists_for_user(&self, user_id: &str) -> DbResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM results WHERE user_id = ?1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM results")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
