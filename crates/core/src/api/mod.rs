//! Clients for external identity providers

pub mod google;

pub use google::GoogleTokenVerifier;
