//! Relational backend: `QuizStore` over the SQLite repositories

use async_trait::async_trait;
use quiz_core::{CoreResult, JoinedResult, NewResult, NewUser, QuizStore, User};
use uuid::Uuid;

use crate::repository::{ResultRecord, ResultRepository, UserRecord, UserRepository};
use crate::{Database, SqlitePool};

/// SQLite-backed store. Each call checks a connection out of the pool and
/// returns it when the query completes.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool_clone(),
        }
    }
}

#[async_trait]
impl QuizStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let record = UserRepository::new(&self.pool).find_by_email(email).await?;
        Ok(record.map(User::try_from).transpose()?)
    }

    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            name: user.name,
            picture: user.picture,
            created_at: user.created_at.timestamp(),
        };
        UserRepository::new(&self.pool).insert(&record).await?;
        Ok(User::try_from(record)?)
    }

    async fn user_exists(&self, user_id: &str) -> CoreResult<bool> {
        Ok(UserRepository::new(&self.pool).exists(user_id).await?)
    }

    async fn insert_result(&self, result: NewResult) -> CoreResult<()> {
        let record = ResultRecord {
            user_id: result.user_id,
            points: result.points,
            time_taken: result.time_taken,
            created_at: result.created_at.timestamp(),
        };
        ResultRepository::new(&self.pool).insert(&record).await?;
        Ok(())
    }

    async fn joined_results(&self) -> CoreResult<Vec<JoinedResult>> {
        let rows = ResultRepository::new(&self.pool)
            .joined_in_insertion_order()
            .await?;
        Ok(rows.into_iter().map(JoinedResult::from).collect())
    }

    async fn has_result(&self, user_id: &str) -> CoreResult<bool> {
        Ok(ResultRepository::new(&self.pool)
            .exists_for_user(user_id)
            .await?)
    }
}
