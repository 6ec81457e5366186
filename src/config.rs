//! Configuration types.

use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::LlmConfig;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_TELEGRAM_TIMEOUT_SECS: u64 = 10;

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// The single browser origin allowed by CORS.
    pub allowed_origin: HeaderValue,
    /// Classifier settings. `None` when no API key is configured.
    pub llm: Option<LlmConfig>,
    /// Telegram notifier settings.
    pub telegram: TelegramConfig,
}

/// Telegram Bot API settings. Credentials may be missing; the notifier
/// then reports every delivery as failed instead of refusing to start.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<SecretString>,
    pub chat_id: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TELEGRAM_TIMEOUT_SECS),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let origin = get("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.into());
        let allowed_origin =
            HeaderValue::from_str(&origin).map_err(|e| ConfigError::InvalidValue {
                key: "CORS_ALLOWED_ORIGIN".into(),
                message: e.to_string(),
            })?;

        let llm = get("GEMINI_API_KEY").map(|api_key| LlmConfig {
            api_key: SecretString::from(api_key),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.into()),
        });

        let timeout_secs = match get("TELEGRAM_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "TELEGRAM_TIMEOUT_SECS".into(),
                message: format!("{raw:?}: {e}"),
            })?,
            None => DEFAULT_TELEGRAM_TIMEOUT_SECS,
        };

        let telegram = TelegramConfig {
            bot_token: get("TELEGRAM_BOT_TOKEN").map(SecretString::from),
            chat_id: get("TELEGRAM_CHAT_ID"),
            api_base: get("TELEGRAM_API_BASE").unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.into()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            port,
            allowed_origin,
            llm,
            telegram,
        })
    }
}
