//! Durable case records created from converted router sessions.

pub mod model;
pub mod routes;

pub use model::{Case, CaseStatus, ClaimType, derive_claim_type};
