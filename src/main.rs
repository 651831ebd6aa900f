use estuary::catalog::{builtin_catalog, InstallStore};
use estuary::constants::{DEFAULT_FAL_PROXY_URL, DEFAULT_MCP_URL};
use estuary::server::{router, AppState, Args};
use estuary::*;

use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    use tracing_subscriber::prelude::*;

    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => "estuary=debug".into(),
    };

    let file_appender = tracing_appender::rolling::daily(".", "estuary.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    estuary::logging::setup_panic_hook();

    let args = Arc::new(Args::parse());

    let xai_key = match std::env::var("XAI_API_KEY") {
        Ok(k) if !k.is_empty() => k,
        _ => {
            eprintln!("Error: XAI_API_KEY environment variable is missing or empty.");
            eprintln!("Please set it in your .env file or environment.");
            std::process::exit(1);
        }
    };

    let groq_key = std::env::var("GROQ_API_KEY").unwrap_or_default();
    if groq_key.is_empty() {
        tracing::warn!("GROQ_API_KEY not set; requests hinting 'groq' will be rejected upstream");
    }

    let mcp_url = std::env::var("MCP_SERVER_URL").unwrap_or_else(|_| DEFAULT_MCP_URL.to_string());
    let fal_proxy_url =
        std::env::var("FAL_PROXY_URL").unwrap_or_else(|_| DEFAULT_FAL_PROXY_URL.to_string());

    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(args.request_timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(args.connect_timeout_secs))
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .tcp_keepalive(Some(std::time::Duration::from_secs(60)))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState {
        client,
        xai_url: constants::XAI_CHAT_COMPLETIONS.to_string(),
        xai_key,
        groq_url: constants::GROQ_CHAT_COMPLETIONS.to_string(),
        groq_key,
        mcp_url,
        fal_proxy_url,
        catalog: Arc::new(builtin_catalog()),
        installed: InstallStore::default(),
        health: Arc::new(UpstreamHealth::default()),
        args: args.clone(),
    });

    let app = router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Estuary listening on {}", addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
