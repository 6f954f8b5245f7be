//! # LeadFlow Shared Library
//!
//! This crate contains shared types and business data access used by the
//! LeadFlow API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, leads, notifications)
//! - `auth`: JWT issuance/validation, password hashing, request extraction
//! - `db`: Connection pool and migration runner
//! - `events`: Real-time event envelopes published to connected clients

pub mod auth;
pub mod db;
pub mod events;
pub mod models;

/// Current version of the LeadFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
