use crate::server::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub catalog: String,
    pub credentials: String,
    pub upstream_failures: u64,
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

pub async fn readiness(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let catalog_ok = !state.catalog.is_empty();
    if !catalog_ok {
        tracing::error!("Readiness check: provider catalog empty");
    }

    let credentials_ok = !state.xai_key.is_empty();
    if !credentials_ok {
        tracing::error!("Readiness check: upstream credentials missing");
    }

    let failed = state
        .health
        .failed_requests
        .load(std::sync::atomic::Ordering::Relaxed);

    let status_code = if catalog_ok && credentials_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status: if catalog_ok && credentials_ok {
                "ready"
            } else {
                "unready"
            }
            .to_string(),
            catalog: if catalog_ok { "ok" } else { "empty" }.to_string(),
            credentials: if credentials_ok { "ok" } else { "missing" }.to_string(),
            upstream_failures: failed,
        }),
    )
}
