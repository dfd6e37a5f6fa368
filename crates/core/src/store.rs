//! Storage abstraction implemented by every backend adapter

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{JoinedResult, NewResult, NewUser, User};

/// Primitive operations a backend must provide. Consistency rules (first
/// write wins, conflict retry, ranking) are layered on top in
/// [`crate::service::QuizService`] so they are shared by all backends.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Insert a user with a freshly generated id.
    /// Must fail with [`crate::QuizError::DuplicateUser`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> CoreResult<User>;

    async fn user_exists(&self, user_id: &str) -> CoreResult<bool>;

    async fn insert_result(&self, result: NewResult) -> CoreResult<()>;

    /// Inner join of results to users, in insertion order
    async fn joined_results(&self) -> CoreResult<Vec<JoinedResult>>;

    async fn has_result(&self, user_id: &str) -> CoreResult<bool>;
}
