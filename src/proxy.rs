//! Pass-through adapter: forwards the inbound request verbatim to the fal
//! proxy endpoint and hands its response back unmodified. This path bypasses
//! fragment framing entirely; the relay forwards status, headers, and body
//! as-is.

use crate::types::*;
use axum::http::header::{HeaderMap, HeaderName};
use bytes::Bytes;

/// Hop-by-hop headers that must not be forwarded between connections.
const STRIPPED_HEADERS: &[HeaderName] = &[
    axum::http::header::CONNECTION,
    axum::http::header::HOST,
    axum::http::header::CONTENT_LENGTH,
    axum::http::header::TE,
    axum::http::header::TRAILER,
    axum::http::header::TRANSFER_ENCODING,
    axum::http::header::UPGRADE,
];

/// Forwards method, headers, and raw body to `url` and returns the upstream
/// response untouched.
pub async fn forward(
    client: &reqwest::Client,
    url: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<reqwest::Response> {
    let mut forwarded = headers.clone();
    for name in STRIPPED_HEADERS {
        forwarded.remove(name);
    }

    tracing::info!("[⚙️  -> ☁️ ] Forwarding request verbatim to {}", url);

    let response = client
        .post(url)
        .headers(forwarded)
        .body(body)
        .send()
        .await
        .map_err(EstuaryError::Network)?;

    Ok(response)
}
