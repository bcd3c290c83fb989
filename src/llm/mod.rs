//! LLM integration for the intake service.
//!
//! One provider is supported in production — Google Gemini via its
//! `generateContent` REST endpoint with JSON output mode. Everything above
//! this module talks to the [`LlmProvider`] trait, so tests can substitute a
//! scripted provider.

mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::LlmSettings;

/// Create the production LLM provider from configuration.
pub fn create_provider(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    tracing::info!(model = %settings.model, "Using Gemini");
    Arc::new(GeminiProvider::new(
        settings.api_key.clone(),
        settings.model.clone(),
        settings.base_url.clone(),
    ))
}
