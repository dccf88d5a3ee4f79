use std::sync::Arc;

use tracing::{debug, warn};

use crate::ollama::{ChatBackend, ChatOptions, ChatRequest};
use crate::resolver::BackendEndpoint;

pub const DEFAULT_MODEL: &str = "llama3.1:8b";
const HEALTH_PROMPT: &str = "ping";

/// Outcome of a single generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success { text: String },
    Failure { error: String, details: String },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }
}

/// Forwards prompts to the backend, one call per prompt, no retries.
#[derive(Clone)]
pub struct GenerationProxy {
    backend: Arc<dyn ChatBackend>,
    model: String,
    deterministic: bool,
}

impl GenerationProxy {
    pub fn new(backend: Arc<dyn ChatBackend>, model: impl Into<String>, deterministic: bool) -> Self {
        Self {
            backend,
            model: model.into(),
            deterministic,
        }
    }

    pub fn endpoint(&self) -> &BackendEndpoint {
        self.backend.endpoint()
    }

    pub async fn generate(&self, prompt: &str) -> GenerationResult {
        let options = self.deterministic.then(ChatOptions::deterministic);
        let request = ChatRequest::single_turn(&self.model, prompt, options);

        match self.backend.chat(request).await {
            Ok(message) => {
                debug!(model = %self.model, chars = message.content.len(), "generation complete");
                GenerationResult::Success {
                    text: message.content,
                }
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint(), error = %e, "generation failed");
                GenerationResult::Failure {
                    error: format!("Could not connect to Ollama at {}", self.endpoint()),
                    details: e.to_string(),
                }
            }
        }
    }

    /// Deep liveness: true only if the backend answers a pinned-decoding ping.
    pub async fn backend_reachable(&self) -> bool {
        let request = ChatRequest::single_turn(
            &self.model,
            HEALTH_PROMPT,
            Some(ChatOptions::deterministic()),
        );
        match self.backend.chat(request).await {
            Ok(_) => true,
            Err(e) => {
                debug!(endpoint = %self.endpoint(), error = %e, "backend ping failed");
                false
            }
        }
    }
}
