//! Message classifier. Asks the LLM for a structured analysis of a submission.
//!
//! One request per submission: fixed system instruction, templated prompt,
//! JSON output constrained to the `Classification` schema. No retries.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::model::Classification;
use crate::contact::Submission;
use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Something that can classify a contact submission.
#[async_trait]
pub trait MessageClassifier: Send + Sync {
    async fn classify(&self, submission: &Submission) -> Result<Classification, LlmError>;
}

/// Classifier backed by an `LlmProvider` with structured output.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MessageClassifier for LlmClassifier {
    async fn classify(&self, submission: &Submission) -> Result<Classification, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_instruction()),
            ChatMessage::user(build_user_prompt(submission)),
        ])
        .with_response_schema(Classification::response_schema());

        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            output_tokens = response.output_tokens,
            "Classifier response received"
        );
        parse_classification(&response.content)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

fn build_system_instruction() -> String {
    "You are an elite Customer Experience AI Agent.\n\
     Analyze the incoming contact form submission contextually.\n\
     Be critical about 'urgency': only true emergencies or high-value leads are 'high'."
        .to_string()
}

/// The three fields are embedded verbatim.
fn build_user_prompt(submission: &Submission) -> String {
    format!(
        "Analyze this submission:\n---\nName: {}\nEmail: {}\nMessage: {}\n---",
        submission.name, submission.email, submission.message
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse model output into a `Classification`, rejecting out-of-enum values.
pub fn parse_classification(raw: &str) -> Result<Classification, LlmError> {
    let json_str = extract_json_object(raw);
    Ok(serde_json::from_str(&json_str)?)
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
