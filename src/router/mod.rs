//! Anonymous intake funnel: classify a narrative, generate clarifying
//! questions, and assess eligibility — all keyed by a client-held session
//! token until signup converts the session.

pub mod model;
pub mod prompts;
pub mod routes;

pub use model::{
    Classification, EligibilityAssessment, Question, QuestionSet, RecommendedPath, RouterSession,
    SessionStatus,
};
