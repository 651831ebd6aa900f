use axum::{extract::State, routing::post, Json, Router};
use estuary::mcp::invoke_first_tool;
use estuary::types::EstuaryError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct McpMock {
    tools: Vec<&'static str>,
    content: Vec<serde_json::Value>,
    calls: AtomicUsize,
    last_params: Mutex<Option<serde_json::Value>>,
}

async fn mcp_handler(
    State(mock): State<Arc<McpMock>>,
    Json(payload): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    match payload.get("method").and_then(|m| m.as_str()) {
        Some("listTools") => {
            let tools: Vec<serde_json::Value> = mock
                .tools
                .iter()
                .map(|name| serde_json::json!({ "name": name }))
                .collect();
            Json(serde_json::json!({ "result": { "tools": tools } }))
        }
        Some("callTool") => {
            mock.calls.fetch_add(1, Ordering::SeqCst);
            *mock.last_params.lock().unwrap() = payload.get("params").cloned();
            Json(serde_json::json!({ "result": { "content": mock.content } }))
        }
        other => panic!("unexpected MCP method: {:?}", other),
    }
}

async fn spawn_mock(mock: Arc<McpMock>) -> String {
    let app = Router::new().route("/", post(mcp_handler)).with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn first_tool_is_invoked_with_the_user_text() {
    let mock = Arc::new(McpMock {
        tools: vec!["search", "echo"],
        content: vec![
            serde_json::json!({ "text": "part one" }),
            serde_json::json!({ "text": "part two" }),
        ],
        calls: AtomicUsize::new(0),
        last_params: Mutex::new(None),
    });
    let url = spawn_mock(mock.clone()).await;

    let client = reqwest::Client::new();
    let text = invoke_first_tool(&client, &url, "look up mcp docs")
        .await
        .expect("tool invocation should succeed");

    assert_eq!(text, "part one\npart two");
    assert_eq!(mock.calls.load(Ordering::SeqCst), 1);

    let params = mock.last_params.lock().unwrap().clone().unwrap();
    assert_eq!(params["name"], "search");
    assert_eq!(params["arguments"]["input"], "look up mcp docs");
}

#[tokio::test]
async fn empty_tool_set_fails_without_attempting_a_call() {
    let mock = Arc::new(McpMock {
        tools: vec![],
        content: vec![],
        calls: AtomicUsize::new(0),
        last_params: Mutex::new(None),
    });
    let url = spawn_mock(mock.clone()).await;

    let client = reqwest::Client::new();
    let result = invoke_first_tool(&client, &url, "anything").await;

    let err = result.expect_err("empty tool set should fail");
    assert!(matches!(err.inner, EstuaryError::ToolUnavailable));
    assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_tool_output_becomes_a_placeholder() {
    let mock = Arc::new(McpMock {
        tools: vec!["noop"],
        content: vec![],
        calls: AtomicUsize::new(0),
        last_params: Mutex::new(None),
    });
    let url = spawn_mock(mock.clone()).await;

    let client = reqwest::Client::new();
    let text = invoke_first_tool(&client, &url, "anything").await.unwrap();
    assert_eq!(text, "No response from MCP tool");
}

#[tokio::test]
async fn unreachable_server_surfaces_a_network_error() {
    let client = reqwest::Client::new();
    // Port 9 (discard) is never an MCP server.
    let result = invoke_first_tool(&client, "http://127.0.0.1:9", "anything").await;
    let err = result.expect_err("unreachable server should fail");
    assert!(matches!(err.inner, EstuaryError::Network(_)));
}
