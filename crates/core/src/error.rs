//! Error taxonomy for quiz operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Invalid Google token: {0}")]
    InvalidToken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A second insert for an email that already has a user.
    #[error("User already exists for email {0}")]
    DuplicateUser(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl QuizError {
    /// Client errors are caused by the request; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidToken(_) | Self::UserNotFound(_))
    }
}

pub type CoreResult<T> = Result<T, QuizError>;
