use std::sync::Arc;

use ollama_gateway::config::Config;
use ollama_gateway::error::GatewayError;
use ollama_gateway::ollama::OllamaClient;
use ollama_gateway::pod::PodIdentity;
use ollama_gateway::proxy::GenerationProxy;
use ollama_gateway::resolver::{resolve_backend_address, SystemDns, SystemFs};
use ollama_gateway::server::{self, AppState};
use ollama_gateway::{output, telemetry};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    dotenvy::dotenv().ok();
    telemetry::init();
    let config = Config::from_env();

    let endpoint = match config.ollama_endpoint()? {
        Some(endpoint) => {
            info!(%endpoint, "using OLLAMA_HOST");
            endpoint
        }
        None => {
            let settings = config.resolver.clone();
            tokio::task::spawn_blocking(move || {
                resolve_backend_address(&settings, &SystemFs, &SystemDns)
            })
            .await?
        }
    };

    let client = OllamaClient::new(endpoint.clone(), config.request_timeout)?;
    let proxy = GenerationProxy::new(
        Arc::new(client),
        config.ollama_model.clone(),
        config.deterministic,
    );

    output::startup_banner(&config.listen_addr);
    output::config_item("Ollama", endpoint.as_str());
    output::config_item("Model", &config.ollama_model);
    output::config_item(
        "Decoding",
        if config.deterministic { "deterministic" } else { "default" },
    );
    output::pod_identity(&PodIdentity::from_env());

    let state = AppState::new(proxy)
        .with_pod_info(config.include_pod_info)
        .with_failure_status(config.failure_status);

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|source| GatewayError::Bind {
            addr: config.listen_addr.clone(),
            source,
        })?;

    server::serve(listener, state).await
}
