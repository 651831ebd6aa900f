//! The dispatcher: selects one backend per request, invokes it, and always
//! yields a well-formed outcome. Adapter failures degrade to a single
//! in-band "Error: ..." fragment rather than a broken connection, so partial
//! failures stay visible inside the conversation.

use crate::constants::SYSTEM_PREAMBLE;
use crate::routing::{select_backend, Backend};
use crate::server::AppState;
use crate::types::*;
use crate::{mcp, proxy, upstream};
use axum::http::HeaderMap;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// What one dispatch produced: either an ordered fragment stream, or (proxy
/// path only) the forwarded endpoint's raw response.
pub enum DispatchOutcome {
    Fragments(ReceiverStream<FragmentResult>),
    Raw(reqwest::Response),
}

/// A stream that yields `text` once and ends.
pub fn single_fragment(text: String) -> ReceiverStream<FragmentResult> {
    let (tx, rx) = mpsc::channel(1);
    // Capacity 1 and the only send, so this cannot fail.
    let _ = tx.try_send(Ok(Bytes::from(text)));
    ReceiverStream::new(rx)
}

/// Invokes exactly one provider adapter per the selection policy. The raw
/// headers and body travel alongside the parsed request so the proxy path
/// can forward them verbatim.
pub async fn dispatch(
    state: &AppState,
    request: ChatRequest,
    headers: &HeaderMap,
    raw_body: Bytes,
) -> DispatchOutcome {
    let backend = select_backend(&request);
    tracing::Span::current().record("backend", backend.name());
    tracing::info!(
        "[⚙️ ] Routing to {} backend [History: {}]",
        backend.name(),
        request.messages.len()
    );

    let result = match backend {
        Backend::Tool => {
            mcp::invoke_first_tool(&state.client, &state.mcp_url, request.latest_user_text())
                .await
                .map(|text| DispatchOutcome::Fragments(single_fragment(text)))
        }
        Backend::Proxy => proxy::forward(&state.client, &state.fal_proxy_url, headers, raw_body)
            .await
            .map(DispatchOutcome::Raw),
        Backend::Native(model) => {
            let mut outbound = Vec::with_capacity(request.messages.len() + 1);
            outbound.push(Message::system(SYSTEM_PREAMBLE));
            outbound.extend(request.messages.iter().cloned());

            let endpoint = native_endpoint(state, model);
            upstream::open_stream(&state.client, &endpoint, model, &outbound)
                .await
                .map(DispatchOutcome::Fragments)
        }
    };

    match result {
        Ok(outcome) => {
            state.health.record_success();
            outcome
        }
        Err(e) => {
            state.health.record_failure();
            tracing::error!(
                "[⚙️ ] {} backend failed, degrading to in-band error: {}",
                backend.name(),
                e
            );
            DispatchOutcome::Fragments(single_fragment(format!("Error: {}", e)))
        }
    }
}

fn native_endpoint(state: &AppState, model: &str) -> upstream::NativeEndpoint {
    if model == crate::constants::GROQ_MODEL {
        upstream::NativeEndpoint {
            url: state.groq_url.clone(),
            api_key: state.groq_key.clone(),
        }
    } else {
        upstream::NativeEndpoint {
            url: state.xai_url.clone(),
            api_key: state.xai_key.clone(),
        }
    }
}
