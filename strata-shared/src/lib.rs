//! # Strata Shared Library
//!
//! Domain types, storage and business rules for the Strata content
//! versioning backend. The HTTP server in `strata-api` is a thin layer over
//! [`services::Services`].
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Passwords, tokens and the membership gate
//! - `db`: Connection pool and migrations
//! - `store`: Storage trait with PostgreSQL and in-memory backends
//! - `services`: Identity, membership, content, versions, tags and search

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Strata shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
