use crate::catalog::{self, InstallStore, ProviderListing};
use crate::dispatch;
use crate::health;
use crate::logging::request_id_middleware;
use crate::relay;
use crate::types::*;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use clap::Parser;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 120)]
    pub request_timeout_secs: u64,
    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,
    #[arg(long, default_value_t = 2 * 1024 * 1024)]
    pub max_body_size: usize,
}

/// Shared, read-only per-process state. The system preamble lives in
/// `constants`; everything mutable here (install store, health counters) is
/// internally synchronized.
pub struct AppState {
    pub client: reqwest::Client,
    pub xai_url: String,
    pub xai_key: String,
    pub groq_url: String,
    pub groq_key: String,
    pub mcp_url: String,
    pub fal_proxy_url: String,
    pub catalog: Arc<Vec<ProviderListing>>,
    pub installed: InstallStore,
    pub health: Arc<UpstreamHealth>,
    pub args: Arc<Args>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.args.max_body_size;
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/providers", get(catalog::list_providers))
        .route("/api/providers/install", post(catalog::install_provider))
        .route("/api/providers/connect", get(catalog::connect_provider))
        .route("/health", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tracing::instrument(
    name = "gateway.chat",
    skip_all,
    fields(backend = tracing::field::Empty, messages = tracing::field::Empty)
)]
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // The raw bytes are kept alongside the parsed request so the proxy path
    // can forward the body verbatim.
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("[🖱️  -> ⚙️ ] Payload deserialization failed: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("Payload deserialization failed: {}", e),
                    "code": "INVALID_REQUEST",
                })),
            )
                .into_response();
        }
    };

    if let Err(e) = request.validate() {
        tracing::error!("[🖱️  -> ⚙️ ] Validation Failed: {}", e);
        return e.into_response();
    }

    tracing::Span::current().record("messages", request.messages.len());
    tracing::info!(
        "[🖱️  -> ⚙️ ] Received Turn [History: {}]",
        request.messages.len()
    );

    let outcome = dispatch::dispatch(&state, request, &headers, body).await;
    relay::deliver(outcome)
}
