//! Native model adapter: turns one hosted chat-completions SSE response into
//! an ordered sequence of text fragments.

use crate::constants::{MAX_STREAM_LINES, MAX_UPSTREAM_LINE_BYTES};
use crate::logging::StreamMetric;
use crate::types::*;
use bytes::Bytes;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::{FramedRead, LinesCodec};

/// Where a native model lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct NativeEndpoint {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Opens a streaming completion against `endpoint` and returns the lazy
/// fragment sequence. The request itself (connect, status check) fails
/// eagerly; once the stream is open, mid-stream errors end the sequence
/// with whatever was already delivered.
pub async fn open_stream(
    client: &reqwest::Client,
    endpoint: &NativeEndpoint,
    model: &str,
    messages: &[Message],
) -> Result<ReceiverStream<FragmentResult>> {
    let body = CompletionRequest {
        model,
        messages,
        stream: true,
    };

    let response = client
        .post(&endpoint.url)
        .header("Authorization", format!("Bearer {}", endpoint.api_key))
        .json(&body)
        .send()
        .await
        .map_err(EstuaryError::Network)?;

    let status = response.status();
    if !status.is_success() {
        let error_body = match response.text().await {
            Ok(text) => text,
            Err(_) => "Unknown error".to_string(),
        };
        tracing::error!("[☁️  -> ⚙️ ] Upstream Error ({}): {}", status, error_body);
        return Err(EstuaryError::Upstream(status, error_body).into());
    }

    tracing::info!("[☁️  -> ⚙️ ] Stream opened for model {}", model);

    let bytes_stream = response
        .bytes_stream()
        .map(|r| r.map_err(std::io::Error::other));
    let mut lines_stream = FramedRead::new(
        tokio_util::io::StreamReader::new(bytes_stream),
        LinesCodec::new_with_max_length(MAX_UPSTREAM_LINE_BYTES),
    );

    let (tx, rx) = mpsc::channel::<FragmentResult>(100);
    let model = model.to_string();

    tokio::spawn(async move {
        let mut metrics = StreamMetric::new();
        let mut line_count = 0;

        while let Some(line_result) = lines_stream.next().await {
            line_count += 1;
            if line_count > MAX_STREAM_LINES {
                tracing::error!(
                    "[☁️  -> ⚙️ ] Stream exceeded max line limit ({})",
                    MAX_STREAM_LINES
                );
                break;
            }

            let line = match line_result {
                Ok(l) => l,
                Err(e) => {
                    // Truncation is allowed; the fragments already delivered
                    // stand as the final content.
                    tracing::warn!("[☁️  -> ⚙️ ] Stream read error, ending early: {}", e);
                    break;
                }
            };

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };
            if data == "[DONE]" {
                tracing::debug!("[☁️  -> ⚙️ ] Stream end marker [DONE] received");
                break;
            }

            let chunk: CompletionChunk = match serde_json::from_str(data) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("[☁️  -> ⚙️ ] Skipping unparseable chunk: {}", e);
                    continue;
                }
            };

            let Some(content) = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.as_deref())
            else {
                continue;
            };
            if content.is_empty() {
                continue;
            }

            metrics.record_fragment(content.len());
            if tx.send(Ok(Bytes::copy_from_slice(content.as_bytes()))).await.is_err() {
                tracing::trace!("Client disconnected, stopping stream");
                break;
            }
        }

        metrics.log_summary(&model);
    });

    Ok(ReceiverStream::new(rx))
}
