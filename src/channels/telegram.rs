//! Telegram notifier: posts contact submissions to a chat via the Bot API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::Notifier;
use crate::analysis::Classification;
use crate::config::TelegramConfig;
use crate::contact::Submission;
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

const CHANNEL_NAME: &str = "telegram";

/// Sends each submission to a fixed chat as Markdown.
pub struct TelegramNotifier {
    bot_token: Option<SecretString>,
    chat_id: Option<String>,
    api_base: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token,
            chat_id: config.chat_id,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, bot_token: &str, method: &str) -> String {
        format!("{}/bot{bot_token}/{method}", self.api_base)
    }

    fn credentials(&self) -> Result<(&str, &str), ChannelError> {
        let missing = |what: &str| ChannelError::NotConfigured {
            name: CHANNEL_NAME.into(),
            missing: what.into(),
        };
        let token = self
            .bot_token
            .as_ref()
            .ok_or_else(|| missing("TELEGRAM_BOT_TOKEN"))?;
        let chat_id = self
            .chat_id
            .as_deref()
            .ok_or_else(|| missing("TELEGRAM_CHAT_ID"))?;
        Ok((token.expose_secret(), chat_id))
    }

    /// Send a text message, splitting it if it exceeds Telegram's limit.
    async fn send_message(&self, text: &str) -> Result<(), ChannelError> {
        let (token, chat_id) = self.credentials()?;
        for chunk in split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH) {
            self.send_message_chunk(token, chat_id, &chunk).await?;
        }
        Ok(())
    }

    /// Send a single chunk (≤4096 chars). Only HTTP 200 counts as delivered.
    async fn send_message_chunk(
        &self,
        token: &str,
        chat_id: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });

        let resp = self
            .client
            .post(self.api_url(token, "sendMessage"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: CHANNEL_NAME.into(),
                reason: if e.is_timeout() {
                    format!("timed out after {:?}", self.timeout)
                } else {
                    // reqwest errors can embed the URL, which carries the token.
                    e.without_url().to_string()
                },
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }

        let raw = resp.text().await.unwrap_or_default();
        let description = serde_json::from_str::<TelegramApiResponse>(&raw)
            .ok()
            .and_then(|r| r.description)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        Err(ChannelError::Rejected {
            name: CHANNEL_NAME.into(),
            status: status.as_u16(),
            description,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    async fn notify(
        &self,
        submission: &Submission,
        analysis: Option<&Classification>,
    ) -> Result<(), ChannelError> {
        let text = format_notification(submission, analysis);
        self.send_message(&text).await
    }
}

/// Error body returned by the Bot API.
#[derive(Debug, Deserialize)]
struct TelegramApiResponse {
    description: Option<String>,
}

// ── Formatting ──────────────────────────────────────────────────────

/// Build the Markdown notification for a submission.
pub fn format_notification(submission: &Submission, analysis: Option<&Classification>) -> String {
    let mut text = format!(
        "🚀 *New Contact Submission!*\n\n\
         👤 *Name:* {}\n\
         📧 *Email:* {}\n\n\
         💬 *Message:*\n{}\n",
        escape_markdown(&submission.name),
        escape_markdown(&submission.email),
        escape_markdown(&submission.message),
    );

    if let Some(a) = analysis {
        text.push_str(&format!(
            "\n🤖 *AI Analysis:*\n\
             • *Category:* {}\n\
             • *Sentiment:* {}\n\
             • *Urgency:* {}\n\
             • *Summary:* {}\n\
             • *Actionable:* {}\n\
             • *Next Step:* {}\n",
            a.category,
            escape_markdown(&a.sentiment),
            a.urgency,
            escape_markdown(&a.summary),
            if a.is_actionable { "Yes" } else { "No" },
            escape_markdown(&a.suggested_next_step),
        ));
    }

    text
}

/// Escape the characters Telegram's legacy Markdown treats as entity markers.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts on a char
/// boundary that does not separate an escape from its character.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let window = &remaining[..floor_char_boundary(remaining, max_len)];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or_else(|| hard_cut(window));

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

/// Largest char boundary ≤ `max`, but never 0 for non-empty input.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut i = max.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    if i == 0 {
        s.chars().next().map_or(0, char::len_utf8)
    } else {
        i
    }
}

fn hard_cut(window: &str) -> usize {
    if window.len() > 1 && window.ends_with('\\') {
        window.len() - 1
    } else {
        window.len()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
