//! HTTP webhook relay

use super::normalize::normalize_reply;
use super::types::{RelayReply, RelayRequest, WebhookPayload};
use super::{RelayError, WebhookRelay};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default bound on one webhook round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw bodies are truncated to this many characters in logs
const LOG_PREVIEW_CHARS: usize = 500;

/// Configuration for the webhook relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let timeout = std::env::var("TUTOR_RELAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Self { timeout }
    }
}

/// Relay that POSTs to the caller-supplied webhook URL
pub struct HttpWebhookRelay {
    client: Client,
}

impl HttpWebhookRelay {
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookRelay for HttpWebhookRelay {
    async fn relay(&self, request: &RelayRequest) -> Result<RelayReply, RelayError> {
        let (message, webhook_url) = request.required()?;

        tracing::info!(
            webhook_url = %webhook_url,
            message_len = message.len(),
            "Relaying chat message"
        );

        let payload = WebhookPayload::new(message, &request.metadata);

        let response = self
            .client
            .post(webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::timeout(format!("Webhook request timed out: {e}"))
                } else if e.is_connect() {
                    RelayError::transport(format!("Connection to webhook failed: {e}"))
                } else if e.is_builder() {
                    RelayError::transport(format!("Invalid webhook URL: {e}"))
                } else {
                    RelayError::transport(format!("Webhook request failed: {e}"))
                }
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Webhook responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %preview(&body),
                "Webhook returned error status"
            );
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::timeout(format!("Timed out reading webhook response: {e}"))
            } else {
                RelayError::transport(format!("Failed to read webhook response: {e}"))
            }
        })?;

        tracing::debug!(raw = %preview(&raw), "Raw webhook response");

        if raw.trim().is_empty() {
            return Err(RelayError::EmptyResponse);
        }

        let response = normalize_reply(&raw);
        tracing::info!(response_len = response.len(), "Relay reply normalized");

        Ok(RelayReply { response })
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Canned reply served by the fake webhook
    #[derive(Clone)]
    struct Canned {
        status: StatusCode,
        body: &'static str,
        delay: Option<Duration>,
        received: Arc<Mutex<Vec<Value>>>,
    }

    async fn fake_hook(
        State(canned): State<Canned>,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        canned.received.lock().unwrap().push(body);
        if let Some(delay) = canned.delay {
            tokio::time::sleep(delay).await;
        }
        (canned.status, canned.body.to_string())
    }

    /// Spawn a webhook on a random local port, returning its URL and the recorded bodies
    async fn spawn_hook(
        status: StatusCode,
        body: &'static str,
        delay: Option<Duration>,
    ) -> (String, Arc<Mutex<Vec<Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let canned = Canned {
            status,
            body,
            delay,
            received: received.clone(),
        };
        let app = Router::new().route("/hook", post(fake_hook)).with_state(canned);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), received)
    }

    fn relay() -> HttpWebhookRelay {
        HttpWebhookRelay::new(&RelayConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_json_response_field() {
        let (url, _) = spawn_hook(StatusCode::OK, r#"{"response":"Hello"}"#, None).await;
        let reply = relay().relay(&RelayRequest::new("hi", url)).await.unwrap();
        assert_eq!(reply.response, "Hello");
    }

    #[tokio::test]
    async fn test_output_field_fallback() {
        let (url, _) = spawn_hook(StatusCode::OK, r#"{"output":"42"}"#, None).await;
        let reply = relay().relay(&RelayRequest::new("hi", url)).await.unwrap();
        assert_eq!(reply.response, "42");
    }

    #[tokio::test]
    async fn test_plain_text_reply() {
        let (url, _) = spawn_hook(StatusCode::OK, "Hi there", None).await;
        let reply = relay().relay(&RelayRequest::new("hi", url)).await.unwrap();
        assert_eq!(reply.response, "Hi there");
    }

    #[tokio::test]
    async fn test_quoted_reply_is_cleaned() {
        let (url, _) = spawn_hook(StatusCode::OK, r#""quoted\ntext""#, None).await;
        let reply = relay().relay(&RelayRequest::new("hi", url)).await.unwrap();
        assert_eq!(reply.response, "quoted\ntext");
        assert_eq!(reply.response.lines().collect::<Vec<_>>(), ["quoted", "text"]);
    }

    #[tokio::test]
    async fn test_error_status() {
        let (url, _) = spawn_hook(
            StatusCode::INTERNAL_SERVER_ERROR,
            "workflow crashed: stack trace",
            None,
        )
        .await;
        let err = relay().relay(&RelayRequest::new("hi", url)).await.unwrap_err();
        match &err {
            RelayError::UpstreamStatus { status, body } => {
                assert_eq!(*status, 500);
                assert!(body.contains("workflow crashed"));
            }
            other => panic!("expected upstream status error, got {other:?}"),
        }
        assert!(!err.to_string().contains("workflow crashed"));
    }

    #[tokio::test]
    async fn test_empty_body() {
        let (url, _) = spawn_hook(StatusCode::OK, "", None).await;
        let err = relay().relay(&RelayRequest::new("hi", url)).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyResponse));

        let (url, _) = spawn_hook(StatusCode::OK, "  \n\t ", None).await;
        let err = relay().relay(&RelayRequest::new("hi", url)).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_input_makes_no_call() {
        let (url, received) = spawn_hook(StatusCode::OK, "unused", None).await;

        let mut request = RelayRequest::new("", url.clone());
        let err = relay().relay(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingInput));

        request.message = Some("hi".to_string());
        request.webhook_url = None;
        let err = relay().relay(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingInput));

        assert!(received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = relay()
            .relay(&RelayRequest::new("hi", format!("http://{addr}/hook")))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport { timed_out: false, .. }));
    }

    #[tokio::test]
    async fn test_unusable_url_is_transport_error() {
        let err = relay()
            .relay(&RelayRequest::new("hi", "not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let (url, _) = spawn_hook(
            StatusCode::OK,
            "too late",
            Some(Duration::from_secs(5)),
        )
        .await;
        let relay = HttpWebhookRelay::new(&RelayConfig {
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let err = relay.relay(&RelayRequest::new("hi", url)).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport { timed_out: true, .. }));
    }

    #[tokio::test]
    async fn test_payload_sent_to_webhook() {
        let (url, received) = spawn_hook(StatusCode::OK, "ok", None).await;
        let request: RelayRequest = serde_json::from_value(json!({
            "message": "Explain photosynthesis",
            "webhookUrl": url,
            "subject": "Bio Buddy",
            "subjectName": "Biology",
            "className": "10",
            "board": "ICSE",
            "sessionId": "subject-1",
            "userId": "user-1",
        }))
        .unwrap();

        relay().relay(&request).await.unwrap();

        let bodies = received.lock().unwrap().clone();
        assert_eq!(bodies.len(), 1);
        let body = &bodies[0];
        assert_eq!(body["message"], "Explain photosynthesis");
        assert_eq!(body["subject"], "Bio Buddy");
        assert_eq!(body["subjectName"], "Biology");
        assert_eq!(body["className"], "10");
        assert_eq!(body["board"], "ICSE");
        assert_eq!(body["sessionId"], "subject-1");
        assert_eq!(body["userId"], "user-1");
        assert!(body["timestamp"].is_string());
        assert!(body.get("webhookUrl").is_none());
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let (url, received) =
            spawn_hook(StatusCode::OK, r#"{"text":"\"same\\tanswer\""}"#, None).await;
        let relay = relay();
        let request = RelayRequest::new("hi", url);

        let first = relay.relay(&request).await.unwrap();
        let second = relay.relay(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.response, "same\tanswer");
        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let long = "é".repeat(LOG_PREVIEW_CHARS + 10);
        assert_eq!(preview(&long).chars().count(), LOG_PREVIEW_CHARS);
    }
}
