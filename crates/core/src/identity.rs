//! Identity verification seam

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::VerifiedIdentity;

/// Turns an opaque sign-in token into a verified identity.
///
/// Implementations return [`crate::QuizError::InvalidToken`] for tokens the
/// provider rejects and [`crate::QuizError::IdentityProvider`] when the
/// provider cannot be reached.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> CoreResult<VerifiedIdentity>;
}
