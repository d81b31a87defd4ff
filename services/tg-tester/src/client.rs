//! Bot API client. Thin reqwest wrapper that maps the service's
//! structured responses (including 429 throttle bodies) to typed
//! outcomes.

use anyhow::{anyhow, Result};
use core_logic::NetworkError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope every Bot API method returns.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetMeResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<User>,
}

/// How a single `sendMessage` call resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Throttled { retry_after: Duration },
}

pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// `api_base` override exists for self-hosted Bot API servers.
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Startup probe: verifies the token before the load loop begins.
    pub async fn get_me(&self) -> Result<String> {
        let url = self.method_url("getMe");
        let response = self.client.get(&url).send().await?;
        let body: GetMeResponse = response.json().await?;

        if !body.ok {
            return Err(anyhow!(
                "getMe rejected: {}",
                body.description.unwrap_or_else(|| "no description".to_string())
            ));
        }

        Ok(body
            .result
            .and_then(|u| u.username)
            .unwrap_or_else(|| "<unnamed bot>".to_string()))
    }

    /// POST one message; a 429 body with `retry_after` becomes a
    /// throttle outcome rather than an error.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<SendOutcome, NetworkError> {
        let url = self.method_url("sendMessage");
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_transport_error("sendMessage", e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error("sendMessage", e))?;

        interpret_response("sendMessage", status, &body)
    }
}

fn map_transport_error(endpoint: &str, e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout {
            timeout_ms: REQUEST_TIMEOUT.as_millis() as u64,
            endpoint: endpoint.to_string(),
        }
    } else if e.is_connect() {
        NetworkError::ConnectionRefused {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    } else {
        NetworkError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Pure response interpretation, split out so it is testable without a
/// live endpoint.
fn interpret_response(
    endpoint: &str,
    status: u16,
    body: &str,
) -> Result<SendOutcome, NetworkError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| NetworkError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: format!("unparseable body: {}", e),
        })?;

    if parsed.ok {
        return Ok(SendOutcome::Sent);
    }

    if parsed.error_code == Some(429) {
        if let Some(retry_after) = parsed.parameters.and_then(|p| p.retry_after) {
            return Ok(SendOutcome::Throttled {
                retry_after: Duration::from_secs(retry_after),
            });
        }
    }

    if let Some(description) = &parsed.description {
        debug!("{} rejected: {}", endpoint, description);
    }

    Err(NetworkError::HttpError {
        status_code: parsed.error_code.map(|c| c as u16).unwrap_or(status),
        endpoint: endpoint.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_body_is_sent() {
        let body = r#"{"ok": true, "result": {"message_id": 42}}"#;
        let outcome = interpret_response("sendMessage", 200, body).unwrap();
        assert_eq!(outcome, SendOutcome::Sent);
    }

    #[test]
    fn throttle_body_carries_retry_after() {
        let body = r#"{"ok": false, "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}}"#;
        let outcome = interpret_response("sendMessage", 429, body).unwrap();
        assert_eq!(
            outcome,
            SendOutcome::Throttled {
                retry_after: Duration::from_secs(5)
            }
        );
    }

    #[test]
    fn throttle_without_retry_after_is_an_http_error() {
        let body = r#"{"ok": false, "error_code": 429, "description": "Too Many Requests"}"#;
        let err = interpret_response("sendMessage", 429, body).unwrap_err();
        match err {
            NetworkError::HttpError { status_code, .. } => assert_eq!(status_code, 429),
            other => panic!("expected HttpError, got {:?}", other),
        }
    }

    #[test]
    fn api_error_maps_to_http_error() {
        let body = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let err = interpret_response("sendMessage", 400, body).unwrap_err();
        match err {
            NetworkError::HttpError { status_code, .. } => assert_eq!(status_code, 400),
            other => panic!("expected HttpError, got {:?}", other),
        }
    }

    #[test]
    fn garbage_body_is_an_invalid_response() {
        let err = interpret_response("sendMessage", 200, "<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResponse { .. }));
    }

    #[test]
    fn method_urls_embed_the_token() {
        let client = TelegramClient::with_api_base("123:abc", "https://example.org/").unwrap();
        assert_eq!(
            client.method_url("sendMessage"),
            "https://example.org/bot123:abc/sendMessage"
        );
    }
}
