use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::resolver::BackendEndpoint;

#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Ollama returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Ollama response contained no message")]
    MissingMessage,
    #[error("Invalid Ollama endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters forwarded in the `options` object of a chat request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f32,
    pub seed: i64,
}

impl ChatOptions {
    /// Greedy decoding with a fixed seed.
    pub const fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

impl ChatRequest {
    pub fn single_turn(model: &str, prompt: &str, options: Option<ChatOptions>) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
            options,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// A chat-completion provider.
///
/// [`OllamaClient`] is the production implementation; tests swap in
/// in-process stubs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// The address requests are sent to.
    fn endpoint(&self) -> &BackendEndpoint;

    async fn chat(&self, request: ChatRequest) -> Result<ChatMessage, OllamaError>;
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: BackendEndpoint,
    chat_url: Url,
}

impl OllamaClient {
    /// Fails unless `endpoint` is an absolute `http`/`https` URL.
    pub fn new(endpoint: BackendEndpoint, timeout: Duration) -> Result<Self, OllamaError> {
        let invalid = |reason: String| OllamaError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        let chat_url = Url::parse(&format!(
            "{}/api/chat",
            endpoint.as_str().trim_end_matches('/')
        ))
        .map_err(|e| invalid(e.to_string()))?;
        if !matches!(chat_url.scheme(), "http" | "https") || chat_url.host_str().is_none() {
            return Err(invalid("expected an http(s) URL with a host".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            chat_url,
        })
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatMessage, OllamaError> {
        let response = self
            .client
            .post(self.chat_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%status, error = %e, "failed to read error body");
                    format!("<unreadable body: {e}>")
                }
            };
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)?;

        parsed.message.ok_or(OllamaError::MissingMessage)
    }
}
