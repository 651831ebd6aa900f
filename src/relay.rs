//! Transport boundary for dispatch outcomes. Fragments are flushed to the
//! caller as transport writes the moment they arrive, never buffered until
//! completion; there are no delimiters between them. The proxy path passes
//! the forwarded response through with its status and headers intact.

use crate::dispatch::DispatchOutcome;
use axum::body::Body;
use axum::http::header;
use axum::response::Response;
use futures_util::StreamExt;

/// Streamed text body content type. The body is an open text stream;
/// fragment boundaries are transport-level writes, not semantic markers.
pub const STREAM_CONTENT_TYPE: &str = "text/event-stream";
pub const STREAM_CACHE_CONTROL: &str = "no-cache, no-transform";

pub fn deliver(outcome: DispatchOutcome) -> Response {
    match outcome {
        DispatchOutcome::Fragments(stream) => {
            let builder = Response::builder()
                .header(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)
                .header(header::CACHE_CONTROL, STREAM_CACHE_CONTROL)
                .header(header::CONNECTION, "keep-alive");
            match builder.body(Body::from_stream(stream)) {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Failed to build relay response: {}", e);
                    Response::new(Body::empty())
                }
            }
        }
        DispatchOutcome::Raw(upstream) => {
            let status = upstream.status();
            let headers = upstream.headers().clone();
            let body = Body::from_stream(
                upstream
                    .bytes_stream()
                    .map(|r| r.map_err(std::io::Error::other)),
            );

            let mut builder = Response::builder().status(status);
            for (name, value) in headers.iter() {
                if name == header::TRANSFER_ENCODING || name == header::CONNECTION {
                    continue;
                }
                builder = builder.header(name, value);
            }
            match builder.body(body) {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Failed to rebuild proxied response: {}", e);
                    Response::new(Body::empty())
                }
            }
        }
    }
}
