//! Contact-form request, submission, and response types.

use serde::{Deserialize, Serialize};

use crate::analysis::Classification;
use crate::error::ValidationError;

/// Name used when the form leaves it out.
pub const DEFAULT_NAME: &str = "Anonymous";

/// Email used when the form leaves it out.
pub const DEFAULT_EMAIL: &str = "No Email";

/// Acknowledgement returned on every accepted submission.
pub const ACK_MESSAGE: &str = "Your message has been received! I'll get back to you soon.";

/// Raw `POST /contact` body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A validated contact submission. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    /// Kept exactly as sent; only its trimmed form is checked.
    pub message: String,
}

impl Submission {
    /// Validate a request.
    ///
    /// An absent or empty message is `MessageRequired`; a whitespace-only
    /// one is `MessageEmpty`. Missing or blank name/email get placeholders.
    pub fn from_request(request: ContactRequest) -> Result<Self, ValidationError> {
        let message = match request.message {
            Some(m) if !m.is_empty() => m,
            _ => return Err(ValidationError::MessageRequired),
        };
        if message.trim().is_empty() {
            return Err(ValidationError::MessageEmpty);
        }

        Ok(Self {
            name: or_default(request.name, DEFAULT_NAME),
            email: or_default(request.email, DEFAULT_EMAIL),
            message,
        })
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse and validate a raw request body.
///
/// An empty body or JSON `null` counts as a missing message. Anything that
/// is not an object of string fields is `MalformedBody`.
pub fn parse_submission(body: &[u8]) -> Result<Submission, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MessageRequired);
    }

    let request = serde_json::from_slice::<Option<ContactRequest>>(body)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?
        .ok_or(ValidationError::MessageRequired)?;

    Submission::from_request(request)
}

/// Body of a successful `POST /contact`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactResponse {
    pub status: String,
    pub message: String,
    pub telegram_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Classification>,
}

impl ContactResponse {
    pub fn success(telegram_sent: bool, analysis: Option<Classification>) -> Self {
        Self {
            status: "success".to_string(),
            message: ACK_MESSAGE.to_string(),
            telegram_sent,
            analysis,
        }
    }
}
