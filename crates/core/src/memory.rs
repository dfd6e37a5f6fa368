//! In-process store: two tables behind a single `RwLock`

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CoreResult, QuizError};
use crate::store::QuizStore;
use crate::types::{JoinedResult, NewResult, NewUser, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    /// email -> index into `users`
    by_email: HashMap<String, usize>,
    results: Vec<NewResult>,
}

/// Volatile store for tests and `--backend memory`
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Number of stored results
    pub async fn result_count(&self) -> usize {
        self.tables.read().await.results.len()
    }

    /// Append a result without checking the user reference. Used to model
    /// rows left behind by another writer.
    pub async fn insert_unchecked_result(&self, result: NewResult) {
        self.tables.write().await.results.push(result);
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .map(|&idx| tables.users[idx].clone()))
    }

    async fn insert_user(&self, user: NewUser) -> CoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.by_email.contains_key(&user.email) {
            return Err(QuizError::DuplicateUser(user.email));
        }

        let record = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            name: user.name,
            picture: user.picture,
            created_at: user.created_at,
        };
        let idx = tables.users.len();
        tables.by_email.insert(record.email.clone(), idx);
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn user_exists(&self, user_id: &str) -> CoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().any(|u| u.id == user_id))
    }

    async fn insert_result(&self, result: NewResult) -> CoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == result.user_id) {
            return Err(QuizError::UserNotFound(result.user_id));
        }
        tables.results.push(result);
        Ok(())
    }

    async fn joined_results(&self) -> CoreResult<Vec<JoinedResult>> {
        let tables = self.tables.read().await;
        let names: HashMap<&str, &str> = tables
            .users
            .iter()
            .map(|u| (u.id.as_str(), u.name.as_str()))
            .collect();

        Ok(tables
            .results
            .iter()
            .filter_map(|r| {
                names.get(r.user_id.as_str()).map(|name| JoinedResult {
                    user_id: r.user_id.clone(),
                    name: (*name).to_string(),
                    points: r.points,
                    time_taken: r.time_taken,
                })
            })
            .collect())
    }

    async fn has_result(&self, user_id: &str) -> CoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.results.iter().any(|r| r.user_id == user_id))
    }
}
