//! Repository implementations for database operations

pub mod results;
pub mod users;

pub use results::*;
pub use users::*;
