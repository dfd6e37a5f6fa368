//! Quiz leaderboard core - domain types, storage seam and ranking
//!
//! Provides:
//! - `QuizService`: user directory, result store, leaderboard, quiz status
//! - `QuizStore` trait implemented by every storage backend
//! - `MemoryStore` for tests and ephemeral runs
//! - Google ID token verification

pub mod api;
pub mod error;
pub mod identity;
pub mod memory;
pub mod ranking;
pub mod service;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use api::GoogleTokenVerifier;
pub use error::{CoreResult, QuizError};
pub use identity::IdentityVerifier;
pub use memory::MemoryStore;
pub use service::QuizService;
pub use store::QuizStore;
pub use types::*;
