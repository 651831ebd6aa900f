//! Provider marketplace surface: an immutable built-in catalog plus the
//! install/connect endpoints. The catalog is loaded once at start-up and
//! shared read-only; installation state lives behind a synchronized store.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::server::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderListing {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plans: Option<Vec<&'static str>>,
    pub website: &'static str,
    pub pricing: &'static str,
    pub documentation: &'static str,
}

/// Installed-provider ids. The original gateway kept this as a bare mutable
/// list shared across requests; here it is a proper synchronized store.
#[derive(Clone, Default)]
pub struct InstallStore {
    inner: Arc<RwLock<HashSet<String>>>,
}

impl InstallStore {
    pub async fn install(&self, provider_id: &str) {
        self.inner.write().await.insert(provider_id.to_string());
    }

    pub async fn installed_ids(&self) -> HashSet<String> {
        self.inner.read().await.clone()
    }
}

pub fn builtin_catalog() -> Vec<ProviderListing> {
    vec![
        ProviderListing {
            id: "xai-marketplace",
            name: "xAIMarketplace",
            description: "An AI service with an efficient text model and a wide context image understanding model.",
            kind: "native",
            installed: false,
            plans: Some(vec!["Free", "Pro", "Enterprise"]),
            website: "/docs/ai/xai",
            pricing: "See website",
            documentation: "/docs/ai/xai",
        },
        ProviderListing {
            id: "groq-marketplace",
            name: "GroqMarketplace",
            description: "A high-performance AI inference service with an ultra-fast Language Processing Unit (LPU) architecture.",
            kind: "native",
            installed: false,
            plans: Some(vec!["Basic", "Advanced"]),
            website: "/docs/ai/groq",
            pricing: "See website",
            documentation: "/docs/ai/groq",
        },
        ProviderListing {
            id: "fal-marketplace",
            name: "falMarketplace",
            description: "A serverless AI inferencing platform for creative processes.",
            kind: "native",
            installed: false,
            plans: Some(vec!["Starter", "Business"]),
            website: "/docs/ai/fal",
            pricing: "See website",
            documentation: "/docs/ai/fal",
        },
        ProviderListing {
            id: "deepinfra-marketplace",
            name: "DeepInfraMarketplace",
            description: "A platform with access to a vast library of open-source models.",
            kind: "native",
            installed: false,
            plans: Some(vec!["Free", "Premium"]),
            website: "/docs/ai/deepinfra",
            pricing: "See website",
            documentation: "/docs/ai/deepinfra",
        },
        ProviderListing {
            id: "connectable-example",
            name: "Example Connectable Provider",
            description: "A connectable account provider example.",
            kind: "connectable",
            installed: false,
            plans: None,
            website: "https://example.com",
            pricing: "See website",
            documentation: "https://example.com/docs",
        },
        ProviderListing {
            id: "elevenlabs",
            name: "ElevenLabs",
            description: "Advanced voice synthesis and audio processing technologies for natural-sounding speech and audio enhancements.",
            kind: "connectable",
            installed: false,
            plans: None,
            website: "https://elevenlabs.io",
            pricing: "See https://elevenlabs.io/pricing",
            documentation: "https://elevenlabs.io/docs",
        },
        ProviderListing {
            id: "lmnt",
            name: "LMNT",
            description: "Data processing and predictive analytics models for high quality text-to-speech and custom voices with low latency.",
            kind: "connectable",
            installed: false,
            plans: None,
            website: "https://lmnt.com",
            pricing: "See https://lmnt.com/pricing",
            documentation: "https://docs.lmnt.com",
        },
        ProviderListing {
            id: "pinecone",
            name: "Pinecone",
            description: "A vector database service for machine learning models, content recommendation, personalized search, and more.",
            kind: "connectable",
            installed: false,
            plans: None,
            website: "https://pinecone.io",
            pricing: "See https://pinecone.io/pricing",
            documentation: "https://docs.pinecone.io",
        },
    ]
}

pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let installed = state.installed.installed_ids().await;
    let providers: Vec<ProviderListing> = state
        .catalog
        .iter()
        .map(|p| ProviderListing {
            installed: installed.contains(p.id),
            ..p.clone()
        })
        .collect();

    Json(serde_json::json!({ "providers": providers }))
}

#[derive(Debug, Deserialize)]
pub struct InstallRequest {
    #[serde(default, rename = "providerId")]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default, rename = "installationName")]
    pub installation_name: Option<String>,
}

pub async fn install_provider(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InstallRequest>,
) -> Response {
    let complete = [
        request.provider_id.as_deref(),
        request.plan.as_deref(),
        request.installation_name.as_deref(),
    ]
    .iter()
    .all(|f| f.is_some_and(|v| !v.is_empty()));

    if !complete {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "Missing required fields" })),
        )
            .into_response();
    }

    let provider_id = request.provider_id.unwrap_or_default();
    state.installed.install(&provider_id).await;
    tracing::info!("[🛒] Installed provider '{}'", provider_id);

    Json(serde_json::json!({ "message": "Provider installed successfully" })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default, rename = "providerId")]
    pub provider_id: Option<String>,
}

pub async fn connect_provider(Query(params): Query<ConnectParams>) -> Response {
    let Some(provider_id) = params.provider_id.filter(|id| !id.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "Missing providerId" })),
        )
            .into_response();
    };

    let redirect_url = match provider_id.as_str() {
        "elevenlabs" => "https://elevenlabs.io/connect".to_string(),
        "lmnt" => "https://lmnt.com/connect".to_string(),
        "pinecone" => "https://app.pinecone.io/".to_string(),
        other => format!(
            "https://example.com/connect?providerId={}",
            urlencode(other)
        ),
    };

    Redirect::temporary(&redirect_url).into_response()
}

/// Minimal percent-encoding for the providerId query value. Covers only the
/// query-value charset (unreserved bytes pass through, everything else is
/// escaped); not suitable for full URLs or path segments.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
