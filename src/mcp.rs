//! Tool-invocation adapter: the two-step MCP exchange over streamable HTTP.
//!
//! Step one lists the tools exposed by the server; an empty set is a hard
//! `ToolUnavailable` and no call is attempted. Step two invokes the first
//! listed tool with the latest user text as its sole argument. The whole
//! result is emitted once as a single fragment; there is no incremental
//! delivery on this path.

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct McpEnvelope<'a> {
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ListToolsResponse {
    #[serde(default)]
    result: Option<ListToolsResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CallToolResponse {
    #[serde(default)]
    result: Option<CallToolResult>,
}

#[derive(Debug, Default, Deserialize)]
struct CallToolResult {
    #[serde(default)]
    content: Vec<ContentFragment>,
}

#[derive(Debug, Deserialize)]
struct ContentFragment {
    #[serde(default)]
    text: Option<String>,
}

/// Lists tools on the MCP server and invokes the first one with `input`.
/// Returns the tool's textual result, content fragments joined by newlines.
pub async fn invoke_first_tool(
    client: &reqwest::Client,
    mcp_url: &str,
    input: &str,
) -> Result<String> {
    let list_response = client
        .post(mcp_url)
        .json(&McpEnvelope {
            method: "listTools",
            params: serde_json::json!({}),
        })
        .send()
        .await
        .map_err(EstuaryError::Network)?;

    if !list_response.status().is_success() {
        return Err(EstuaryError::Upstream(
            list_response.status(),
            "Failed to list MCP tools".into(),
        )
        .into());
    }

    let listed: ListToolsResponse = list_response.json().await.map_err(EstuaryError::Network)?;
    let tools = listed.result.unwrap_or_default().tools;

    let Some(tool) = tools.first() else {
        tracing::warn!("[⚙️  -> ☁️ ] MCP server advertised no tools");
        return Err(EstuaryError::ToolUnavailable.into());
    };

    tracing::info!("[⚙️  -> ☁️ ] Invoking MCP tool '{}'", tool.name);

    let call_response = client
        .post(mcp_url)
        .json(&McpEnvelope {
            method: "callTool",
            params: serde_json::json!({
                "name": tool.name,
                "arguments": { "input": input },
            }),
        })
        .send()
        .await
        .map_err(EstuaryError::Network)?;

    if !call_response.status().is_success() {
        return Err(EstuaryError::Upstream(
            call_response.status(),
            "Failed to call MCP tool".into(),
        )
        .into());
    }

    let called: CallToolResponse = call_response.json().await.map_err(EstuaryError::Network)?;
    let text = called
        .result
        .unwrap_or_default()
        .content
        .iter()
        .filter_map(|c| c.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() {
        return Ok("No response from MCP tool".to_string());
    }

    Ok(text)
}
