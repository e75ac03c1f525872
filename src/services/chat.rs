//! OpenAI-compatible chat-completions client shared by the extraction and
//! translation services.
//!
//! [`ChatClient`] posts to `{base_url}/v1/chat/completions` and returns the
//! first choice's message content. All connection details come from
//! [`ServiceConfig`]; nothing is hardcoded.

use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfig;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to a remote service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status code.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The service returned no usable text.
    #[error("service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Extract `choices[0].message.content` from a response body.
pub(crate) fn parse_completion(body: &str) -> Result<String, ServiceError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::Parse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ServiceError::Parse("response has no message content".into()))
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// Works with any gateway that speaks the chat-completions wire format and
/// accepts `image_url` parts holding `data:` URLs.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl ChatClient {
    /// Build a client from service config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`. A default client is used if the builder fails.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: format!("{}/v1/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.resolved_api_key(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `messages` and return the trimmed content of the first choice.
    ///
    /// The `Authorization: Bearer …` header is attached only when an API key
    /// is configured.
    pub async fn complete(&self, messages: serde_json::Value) -> Result<String, ServiceError> {
        let body = serde_json::json!({
            "model":       self.model,
            "messages":    messages,
            "stream":      false,
            "temperature": self.temperature
        });

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::warn!("services: {} answered {status}", self.url);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
