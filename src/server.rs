use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::FailureStatus;
use crate::error::GatewayError;
use crate::pod::PodIdentity;
use crate::proxy::{GenerationProxy, GenerationResult};

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_info: Option<PodIdentity>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendHealth {
    pub ollama: bool,
    pub endpoint: String,
}

#[derive(Clone)]
pub struct AppState {
    proxy: GenerationProxy,
    include_pod_info: bool,
    failure_status: FailureStatus,
}

impl AppState {
    pub fn new(proxy: GenerationProxy) -> Self {
        Self {
            proxy,
            include_pod_info: true,
            failure_status: FailureStatus::default(),
        }
    }

    pub fn with_pod_info(mut self, include: bool) -> Self {
        self.include_pod_info = include;
        self
    }

    pub fn with_failure_status(mut self, status: FailureStatus) -> Self {
        self.failure_status = status;
        self
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/generate", get(generate))
        .route("/health", get(health))
        .route("/health/backend", get(backend_health))
        .with_state(state)
}

/// Serve until the listener fails. The state, and with it the resolved
/// endpoint, is fixed before the first connection is accepted.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), GatewayError> {
    let addr = listener.local_addr().map_err(GatewayError::Serve)?;
    info!(%addr, endpoint = %state.proxy.endpoint(), "listening");

    axum::serve(listener, app(state))
        .await
        .map_err(GatewayError::Serve)
}

async fn generate(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
) -> Response {
    match state.proxy.generate(&params.prompt).await {
        GenerationResult::Success { text } => {
            let pod_info = state.include_pod_info.then(PodIdentity::from_env);
            Json(GenerateResponse {
                response: text,
                pod_info,
            })
            .into_response()
        }
        GenerationResult::Failure { error, details } => {
            let status = match state.failure_status {
                FailureStatus::Ok => StatusCode::OK,
                FailureStatus::BadGateway => StatusCode::BAD_GATEWAY,
            };
            (status, Json(ErrorResponse { error, details })).into_response()
        }
    }
}

async fn health() -> Json<PodIdentity> {
    Json(PodIdentity::from_env())
}

async fn backend_health(State(state): State<AppState>) -> Response {
    let ollama = state.proxy.backend_reachable().await;
    let status = if ollama {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = BackendHealth {
        ollama,
        endpoint: state.proxy.endpoint().to_string(),
    };
    (status, Json(body)).into_response()
}
