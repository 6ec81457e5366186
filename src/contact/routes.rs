//! HTTP endpoints for contact submissions.

use std::any::Any;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::pipeline::ContactPipeline;
use super::types::{ContactResponse, parse_submission};
use crate::error::{Error, internal_error_response};

/// Shared state for contact routes.
#[derive(Clone)]
pub struct ContactRouteState {
    pub pipeline: ContactPipeline,
}

/// Build the contact router: `POST /contact`, `GET /health`, CORS for one
/// origin, and panic recovery. Request bodies are not size-limited.
pub fn contact_routes(pipeline: ContactPipeline, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/contact", post(submit_contact))
        .route("/health", get(health))
        .with_state(ContactRouteState { pipeline })
        .layer(DefaultBodyLimit::disable())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
}

/// POST /contact
///
/// 400 on a missing or blank message, otherwise 200 with the delivery
/// result and the analysis when one was produced.
async fn submit_contact(
    State(state): State<ContactRouteState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ContactResponse>, Error> {
    let request_id = Uuid::new_v4();

    async move {
        let body = body.map_err(|e| Error::Body(e.body_text()))?;
        let submission = parse_submission(&body)?;
        info!(
            message_len = submission.message.len(),
            "Contact submission received"
        );

        let outcome = state.pipeline.process(&submission).await;
        info!(
            telegram_sent = outcome.telegram_sent,
            analyzed = outcome.analysis.is_some(),
            "Contact submission handled"
        );

        Ok::<_, Error>(Json(ContactResponse::success(
            outcome.telegram_sent,
            outcome.analysis,
        )))
    }
    .instrument(info_span!("contact", %request_id))
    .await
}

/// GET /health
///
/// Reports whether each integration is configured; never echoes secrets.
async fn health(State(state): State<ContactRouteState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "contact-relay",
        "classifier": state.pipeline.has_classifier(),
        "notifier": state.pipeline.notifier_configured(),
    }))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "Contact handler panicked");
    internal_error_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::{Classification, MessageClassifier};
    use crate::channels::Notifier;
    use crate::contact::Submission;
    use crate::error::{ChannelError, INTERNAL_ERROR_MESSAGE, LlmError};

    const ORIGIN: &str = "https://portfolio.example";

    struct CountingClassifier {
        calls: AtomicUsize,
        panic: bool,
    }

    #[async_trait]
    impl MessageClassifier for CountingClassifier {
        async fn classify(&self, _submission: &Submission) -> Result<Classification, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("classifier exploded");
            }
            Err(LlmError::InvalidResponse {
                provider: "mock".into(),
                reason: "no analysis".into(),
            })
        }
    }

    struct CountingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        fn name(&self) -> &str {
            "counting"
        }

        fn is_configured(&self) -> bool {
            false
        }

        async fn notify(
            &self,
            _submission: &Submission,
            _analysis: Option<&Classification>,
        ) -> Result<(), ChannelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        app: Router,
        classifier: Arc<CountingClassifier>,
        notifier: Arc<CountingNotifier>,
    }

    fn harness(panic: bool) -> Harness {
        let classifier = Arc::new(CountingClassifier {
            calls: AtomicUsize::new(0),
            panic,
        });
        let notifier = Arc::new(CountingNotifier {
            calls: AtomicUsize::new(0),
        });
        let pipeline = ContactPipeline::new(Some(classifier.clone()), notifier.clone());
        Harness {
            app: contact_routes(pipeline, HeaderValue::from_static(ORIGIN)),
            classifier,
            notifier,
        }
    }

    fn post_contact(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/contact")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn empty_message_is_400_without_outbound_calls() {
        let h = harness(false);
        let response = h.app.oneshot(post_contact(r#"{"message": ""}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Message is required");
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whitespace_message_is_400_cannot_be_empty() {
        let h = harness(false);
        let response = h.app.oneshot(post_contact(r#"{"message": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Message cannot be empty");
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let h = harness(false);
        let response = h.app.oneshot(post_contact("{oops")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid JSON payload");
    }

    #[tokio::test]
    async fn large_message_is_accepted() {
        let h = harness(false);
        let body = serde_json::json!({ "message": "x".repeat(3 * 1024 * 1024) }).to_string();
        let response = h.app.oneshot(post_contact(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "success");
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn body_read_failure_is_generic_500() {
        let h = harness(false);
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(br#"{"message": "hel"#)),
            Err(std::io::Error::other("connection reset")),
        ];
        let request = Request::builder()
            .method("POST")
            .uri("/contact")
            .header("content-type", "application/json")
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn classifier_failure_still_succeeds() {
        let h = harness(false);
        let response = h
            .app
            .oneshot(post_contact(r#"{"message": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["telegram_sent"], true);
        assert!(body.get("analysis").is_none());
        assert_eq!(h.classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panic_becomes_generic_500() {
        let h = harness(true);
        let response = h
            .app
            .oneshot(post_contact(r#"{"message": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("exploded"));
    }

    #[tokio::test]
    async fn health_reports_integrations() {
        let h = harness(false);
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["classifier"], true);
        assert_eq!(body["notifier"], false);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let h = harness(false);
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/contact")
            .header("origin", ORIGIN)
            .header("access-control-request-method", "POST")
            .header("access-control-request-headers", "content-type")
            .body(Body::empty())
            .unwrap();
        let response = h.app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            ORIGIN
        );
    }

    #[tokio::test]
    async fn cors_rejects_other_origins() {
        let h = harness(false);
        let mut request = post_contact(r#"{"message": "hello"}"#);
        request
            .headers_mut()
            .insert("origin", HeaderValue::from_static("https://evil.example"));
        let response = h.app.oneshot(request).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
