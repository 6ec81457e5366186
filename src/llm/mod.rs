//! LLM integration for the contact relay.
//!
//! Talks to Google's Gemini `generateContent` endpoint over reqwest and
//! exposes it through the `LlmProvider` trait so the classifier can be
//! exercised against mocks.

pub mod gemini;
pub mod provider;

pub use gemini::GeminiProvider;
pub use provider::*;

use std::sync::Arc;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub api_base: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    tracing::info!("Using Gemini (model: {})", config.model);
    Arc::new(GeminiProvider::new(
        config.api_key.clone(),
        &config.model,
        &config.api_base,
    ))
}
