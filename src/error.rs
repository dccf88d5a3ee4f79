use thiserror::Error;

use crate::ollama::OllamaError;

/// Conditions that stop the process at startup.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid OLLAMA_HOST {value:?}: {reason}")]
    InvalidHost { value: String, reason: String },
    #[error("Failed to build Ollama client: {0}")]
    Client(#[from] OllamaError),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(std::io::Error),
    #[error("Endpoint resolution task failed: {0}")]
    Resolve(#[from] tokio::task::JoinError),
}
