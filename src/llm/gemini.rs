//! Gemini provider.
//!
//! Uses the `generateContent` REST endpoint. Structured output is requested
//! with `responseMimeType: application/json` plus a `responseSchema`.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, Role,
};
use crate::error::LlmError;

const PROVIDER: &str = "gemini";

/// Gemini `generateContent` client.
///
/// No request timeout is set; reqwest's default applies.
pub struct GeminiProvider {
    client: HttpClient,
    api_key: SecretString,
    model: String,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: &str, api_base: &str) -> Self {
        Self {
            client: HttpClient::new(),
            api_key,
            model: model.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn build_request(request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiTextPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: request.system_instruction().map(|text| {
                GeminiSystemInstruction {
                    parts: vec![GeminiTextPart { text }],
                }
            }),
            generation_config: request.response_schema.clone().map(|schema| {
                GeminiGenerationConfig {
                    response_mime_type: "application/json".to_string(),
                    response_schema: schema,
                }
            }),
        }
    }

    fn parse_response(response: GenerateContentResponse) -> Result<CompletionResponse, LlmError> {
        if let Some(reason) = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: format!("prompt blocked: {reason}"),
            });
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: "no candidates returned".into(),
            })?;

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: format!(
                    "empty candidate (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                FinishReason::Safety
            }
            Some(_) => FinishReason::Other,
        };

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::build_request(&request);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.into(),
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<GeminiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or(text);
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.into(),
                reason: format!("{status}: {reason}"),
            });
        }

        let text = response.text().await.map_err(|e| LlmError::RequestFailed {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        })?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;

        let completion = Self::parse_response(parsed)?;
        tracing::debug!(
            model = %self.model,
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            finish_reason = ?completion.finish_reason,
            "Gemini completion finished"
        );
        Ok(completion)
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::llm::provider::ChatMessage;

    #[derive(Debug, Clone)]
    struct Captured {
        path: String,
        api_key: Option<String>,
        body: Value,
    }

    #[derive(Clone)]
    struct MockState {
        status: StatusCode,
        reply: Value,
        captured: Arc<Mutex<Option<Captured>>>,
    }

    async fn mock_generate(
        State(state): State<MockState>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> impl IntoResponse {
        *state.captured.lock().unwrap() = Some(Captured {
            path: uri.path().to_string(),
            api_key: headers
                .get("x-goog-api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body,
        });
        (state.status, Json(state.reply.clone()))
    }

    /// Start a fake Gemini API on a random port; returns its base URL.
    async fn spawn_gemini(
        status: StatusCode,
        reply: Value,
    ) -> (String, Arc<Mutex<Option<Captured>>>) {
        let captured = Arc::new(Mutex::new(None));
        let state = MockState {
            status,
            reply,
            captured: Arc::clone(&captured),
        };
        let app = Router::new().fallback(mock_generate).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://127.0.0.1:{port}"), captured)
    }

    fn provider(base: &str) -> GeminiProvider {
        GeminiProvider::new(SecretString::from("test-key"), "gemini-test", base)
    }

    fn structured_request() -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system("You are an analyst."),
            ChatMessage::user("Analyze this."),
        ])
        .with_response_schema(json!({"type": "OBJECT"}))
    }

    #[test]
    fn endpoint_includes_model_and_method() {
        let p = provider("https://generativelanguage.googleapis.com/");
        assert_eq!(
            p.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn build_request_splits_system_and_user() {
        let body = serde_json::to_value(GeminiProvider::build_request(&structured_request())).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are an analyst.");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze this.");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn build_request_omits_generation_config_without_schema() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")]);
        let body = serde_json::to_value(GeminiProvider::build_request(&request)).unwrap();
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn complete_returns_candidate_text() {
        let (base, captured) = spawn_gemini(
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"category\":"}, {"text": "\"spam\"}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 7}
            }),
        )
        .await;

        let completion = provider(&base).complete(structured_request()).await.unwrap();
        assert_eq!(completion.content, "{\"category\":\"spam\"}");
        assert_eq!(completion.input_tokens, 12);
        assert_eq!(completion.output_tokens, 7);
        assert_eq!(completion.finish_reason, FinishReason::Stop);

        let captured = captured.lock().unwrap().clone().unwrap();
        assert_eq!(captured.path, "/v1beta/models/gemini-test:generateContent");
        assert_eq!(captured.api_key.as_deref(), Some("test-key"));
        assert_eq!(
            captured.body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[tokio::test]
    async fn complete_maps_unauthorized_to_auth_failed() {
        let (base, _) = spawn_gemini(StatusCode::FORBIDDEN, json!({})).await;
        let err = provider(&base).complete(structured_request()).await.unwrap_err();
        assert!(matches!(err, LlmError::AuthFailed { .. }));
    }

    #[tokio::test]
    async fn complete_surfaces_api_error_message() {
        let (base, _) = spawn_gemini(
            StatusCode::BAD_REQUEST,
            json!({"error": {"code": 400, "message": "schema rejected", "status": "INVALID_ARGUMENT"}}),
        )
        .await;
        let err = provider(&base).complete(structured_request()).await.unwrap_err();
        match err {
            LlmError::RequestFailed { reason, .. } => assert!(reason.contains("schema rejected")),
            other => panic!("Expected RequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_rejects_blocked_prompt() {
        let (base, _) = spawn_gemini(
            StatusCode::OK,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        )
        .await;
        let err = provider(&base).complete(structured_request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn complete_rejects_empty_candidates() {
        let (base, _) = spawn_gemini(StatusCode::OK, json!({"candidates": []})).await;
        let err = provider(&base).complete(structured_request()).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn complete_fails_when_unreachable() {
        let err = provider("http://127.0.0.1:1")
            .complete(structured_request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }));
    }
}
