//! Quiz operations written once against [`QuizStore`]

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CoreResult, QuizError};
use crate::identity::IdentityVerifier;
use crate::ranking;
use crate::store::QuizStore;
use crate::types::{LeaderboardEntry, NewResult, NewUser, User, VerifiedIdentity};

/// User directory, result store, leaderboard ranker and quiz-status lookup
/// over one injected backend.
#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    verifier: Arc<dyn IdentityVerifier>,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { store, verifier }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Verify a sign-in token and resolve it to a user, creating one on first login
    pub async fn login(&self, token: &str) -> CoreResult<User> {
        let identity = self.verifier.verify(token).await?;
        self.get_or_create_user(&identity).await
    }

    /// Look up the user for `identity.email`, creating it if absent.
    ///
    /// An existing user is returned unchanged (name and picture are never
    /// overwritten). If a concurrent login inserted the same email between
    /// our lookup and insert, the store reports `DuplicateUser` and the
    /// winner's record is returned instead.
    pub async fn get_or_create_user(&self, identity: &VerifiedIdentity) -> CoreResult<User> {
        if let Some(user) = self.store.find_user_by_email(&identity.email).await? {
            debug!(user_id = %user.id, "Existing user signed in");
            return Ok(user);
        }

        match self.store.insert_user(NewUser::from_identity(identity)).await {
            Ok(user) => {
                info!(user_id = %user.id, backend = self.backend(), "Created user");
                Ok(user)
            }
            Err(QuizError::DuplicateUser(email)) => {
                warn!("Concurrent first login detected, re-reading user");
                self.store
                    .find_user_by_email(&email)
                    .await?
                    .ok_or_else(|| {
                        QuizError::Storage(format!("user vanished after duplicate insert: {email}"))
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Record a submission for an existing user
    pub async fn submit_result(&self, user_id: &str, points: i64, time_taken: f64) -> CoreResult<()> {
        if !self.store.user_exists(user_id).await? {
            return Err(QuizError::UserNotFound(user_id.to_string()));
        }

        self.store
            .insert_result(NewResult::new(user_id, points, time_taken))
            .await?;
        debug!(%user_id, points, time_taken, "Result saved");
        Ok(())
    }

    /// Every submission ranked by points, then time
    pub async fn leaderboard(&self) -> CoreResult<Vec<LeaderboardEntry>> {
        let rows = self.store.joined_results().await?;
        Ok(ranking::rank(rows))
    }

    /// Each user's best submission, ranked
    pub async fn leaderboard_best_per_user(&self) -> CoreResult<Vec<LeaderboardEntry>> {
        let rows = self.store.joined_results().await?;
        Ok(ranking::rank_best_per_user(rows))
    }

    /// Whether the user registered under `email` has submitted at least one result
    pub async fn has_taken_quiz(&self, email: &str) -> CoreResult<bool> {
        match self.store.find_user_by_email(email).await? {
            Some(user) => self.store.has_result(&user.id).await,
            None => Ok(false),
        }
    }
}
