use axum::http::StatusCode;
use clap::Parser;
use estuary::catalog::{builtin_catalog, InstallStore};
use estuary::server::{router, AppState, Args};
use estuary::types::UpstreamHealth;
use std::sync::Arc;

fn test_state() -> Arc<AppState> {
    Arc::new(AppState {
        client: reqwest::Client::new(),
        xai_url: "http://unused".to_string(),
        xai_key: "xai-test-key".to_string(),
        groq_url: "http://unused".to_string(),
        groq_key: "groq-test-key".to_string(),
        mcp_url: "http://unused".to_string(),
        fal_proxy_url: "http://unused".to_string(),
        catalog: Arc::new(builtin_catalog()),
        installed: InstallStore::default(),
        health: Arc::new(UpstreamHealth::default()),
        args: Arc::new(Args::parse_from(["estuary"])),
    })
}

async fn spawn_gateway() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(test_state());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn list_returns_the_full_catalog() {
    let base = spawn_gateway().await;

    let body: serde_json::Value = reqwest::get(format!("{}/api/providers", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 8);
    assert!(providers.iter().all(|p| p["installed"] == false));

    let xai = &providers[0];
    assert_eq!(xai["id"], "xai-marketplace");
    assert_eq!(xai["type"], "native");
    assert_eq!(
        xai["plans"],
        serde_json::json!(["Free", "Pro", "Enterprise"])
    );

    // Connectable providers carry no plans field at all.
    let elevenlabs = providers.iter().find(|p| p["id"] == "elevenlabs").unwrap();
    assert_eq!(elevenlabs["type"], "connectable");
    assert!(elevenlabs.get("plans").is_none());
}

#[tokio::test]
async fn install_flips_the_installed_flag() {
    let base = spawn_gateway().await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/providers/install", base))
        .json(&serde_json::json!({
            "providerId": "groq-marketplace",
            "plan": "Basic",
            "installationName": "my groq",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Provider installed successfully");

    let body: serde_json::Value = http
        .get(format!("{}/api/providers", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let providers = body["providers"].as_array().unwrap();
    for p in providers {
        let expected = p["id"] == "groq-marketplace";
        assert_eq!(p["installed"].as_bool().unwrap(), expected, "id: {}", p["id"]);
    }
}

#[tokio::test]
async fn install_rejects_incomplete_requests() {
    let base = spawn_gateway().await;
    let http = reqwest::Client::new();

    let incomplete = [
        serde_json::json!({ "plan": "Basic", "installationName": "x" }),
        serde_json::json!({ "providerId": "groq-marketplace", "installationName": "x" }),
        serde_json::json!({ "providerId": "groq-marketplace", "plan": "Basic" }),
        serde_json::json!({ "providerId": "", "plan": "Basic", "installationName": "x" }),
    ];

    for payload in incomplete {
        let response = http
            .post(format!("{}/api/providers/install", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["message"], "Missing required fields");
    }
}

#[tokio::test]
async fn connect_requires_a_provider_id() {
    let base = spawn_gateway().await;

    let response = reqwest::get(format!("{}/api/providers/connect", base))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Missing providerId");
}

#[tokio::test]
async fn connect_redirects_to_the_provider() {
    let base = spawn_gateway().await;
    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let cases = [
        ("elevenlabs", "https://elevenlabs.io/connect"),
        ("lmnt", "https://lmnt.com/connect"),
        ("pinecone", "https://app.pinecone.io/"),
        (
            "some-other",
            "https://example.com/connect?providerId=some-other",
        ),
    ];

    for (provider_id, location) in cases {
        let response = http
            .get(format!(
                "{}/api/providers/connect?providerId={}",
                base, provider_id
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get("location").unwrap(),
            location,
            "providerId: {}",
            provider_id
        );
    }
}
