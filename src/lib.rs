//! Contact relay. Validates contact-form submissions, classifies them with
//! an LLM when one is configured, and forwards them to Telegram.

pub mod analysis;
pub mod channels;
pub mod config;
pub mod contact;
pub mod error;
pub mod llm;

use std::sync::Arc;

use axum::Router;

use analysis::{LlmClassifier, MessageClassifier};
use channels::{Notifier, TelegramNotifier};
use config::RelayConfig;
use contact::ContactPipeline;

/// Wire the configured classifier and notifier into the HTTP router.
pub fn build_app(config: &RelayConfig) -> Router {
    let classifier = config.llm.as_ref().map(|llm_config| {
        let llm = llm::create_provider(llm_config);
        Arc::new(LlmClassifier::new(llm)) as Arc<dyn MessageClassifier>
    });
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(config.telegram.clone()));

    contact::contact_routes(
        ContactPipeline::new(classifier, notifier),
        config.allowed_origin.clone(),
    )
}
