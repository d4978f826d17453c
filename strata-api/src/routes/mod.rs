/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Liveness and readiness
/// - `auth`: Register, login, refresh
/// - `projects`: Projects and members
/// - `contents`: Content items
/// - `versions`: Content versions
/// - `tags`: Tags and content tagging
/// - `search`: Keyword search

pub mod auth;
pub mod contents;
pub mod health;
pub mod projects;
pub mod search;
pub mod tags;
pub mod versions;
