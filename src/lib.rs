//! GuideBuoy intake — complaint-intake backend.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod cases;
pub mod config;
pub mod error;
pub mod evidence;
pub mod llm;
pub mod ratelimit;
pub mod router;
pub mod rules;
pub mod safety;
pub mod store;
