//! Persistence layer — libSQL-backed storage for sessions, cases, and auth.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{AnalyticsEvent, ClaimOutcome, Database, EmailVerification, User};
