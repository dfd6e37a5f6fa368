//! Domain types shared by the service, the stores and the HTTP layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered quiz participant. `email` is the natural key, `id` the
/// surrogate referenced by results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a user; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn from_identity(identity: &VerifiedIdentity) -> Self {
        Self {
            email: identity.email.clone(),
            name: identity.name.clone(),
            picture: identity.picture.clone(),
            created_at: Utc::now(),
        }
    }
}

/// A single quiz submission
#[derive(Debug, Clone, PartialEq)]
pub struct NewResult {
    pub user_id: String,
    pub points: i64,
    /// Seconds spent on the quiz
    pub time_taken: f64,
    pub created_at: DateTime<Utc>,
}

impl NewResult {
    pub fn new(user_id: impl Into<String>, points: i64, time_taken: f64) -> Self {
        Self {
            user_id: user_id.into(),
            points,
            time_taken,
            created_at: Utc::now(),
        }
    }
}

/// A result joined with its owning user, as yielded by a store.
/// Stores return these in insertion order; ranking happens in [`crate::ranking`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedResult {
    pub user_id: String,
    pub name: String,
    pub points: i64,
    pub time_taken: f64,
}

/// One row of the public leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub points: i64,
    pub time_taken: f64,
}

impl From<JoinedResult> for LeaderboardEntry {
    fn from(row: JoinedResult) -> Self {
        Self {
            name: row.name,
            points: row.points,
            time_taken: row.time_taken,
        }
    }
}

/// Identity returned by the identity provider after token verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}
