//! Client-side incremental assembler: consumes the gateway's fragment stream
//! and maintains the live conversation view.
//!
//! One session runs one cycle at a time: `Idle -> Sending -> Receiving ->
//! Idle`. Fragments are applied in strict arrival order by concatenation into
//! the single open assistant turn; there are never two open turns because a
//! new submission is rejected at the boundary while a cycle is in flight.

use crate::types::*;
use futures_util::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Sending,
    Receiving,
}

/// Carries undecoded bytes across fragment boundaries so a multi-byte scalar
/// split between two fragments still decodes to one character.
#[derive(Default)]
struct Utf8Carry {
    pending: Vec<u8>,
}

impl Utf8Carry {
    /// Appends `bytes` and drains the longest decodable prefix as text. An
    /// incomplete trailing sequence stays pending; genuinely invalid bytes
    /// are replaced rather than held forever.
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                text
            }
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let text = String::from_utf8_lossy(&self.pending[..valid]).into_owned();
                self.pending.drain(..valid);
                text
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                text
            }
        }
    }

    /// Flushes whatever is still pending at stream end, lossily.
    fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// The live conversation plus the per-cycle receive state.
pub struct ChatSession {
    messages: Vec<Message>,
    provider: Option<String>,
    phase: SessionPhase,
    error: Option<String>,
    accumulator: String,
    carry: Utf8Carry,
    open_turn: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            provider: None,
            phase: SessionPhase::Idle,
            error: None,
            accumulator: String::new(),
            carry: Utf8Carry::default(),
            open_turn: false,
        }
    }

    /// A session whose submissions carry a provider hint.
    pub fn with_provider(provider: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.provider = Some(provider.into());
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Caller-visible error from the last failed cycle, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    /// Appends a user turn and produces the dispatch request carrying the
    /// whole conversation so far. Rejected without any state mutation when a
    /// cycle is already active or the input is empty.
    pub fn submit(&mut self, input: &str) -> Result<ChatRequest> {
        if self.is_busy() {
            return Err(EstuaryError::InvalidRequest(
                "a submission is already in flight".into(),
            )
            .into());
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EstuaryError::InvalidRequest("input is empty".into()).into());
        }

        self.error = None;
        self.accumulator.clear();
        self.carry = Utf8Carry::default();
        self.open_turn = false;
        self.messages.push(Message::user(trimmed));
        self.phase = SessionPhase::Sending;

        Ok(ChatRequest {
            messages: self.messages.clone(),
            provider: self.provider.clone(),
        })
    }

    /// Merges one raw fragment into the open assistant turn, opening it if
    /// needed. Fragments combine by concatenation in arrival order; no
    /// boundary assumptions are made about the chunking.
    pub fn apply_fragment(&mut self, bytes: &[u8]) {
        self.phase = SessionPhase::Receiving;
        let text = self.carry.push(bytes);
        if text.is_empty() {
            return;
        }
        self.accumulator.push_str(&text);
        self.sync_open_turn();
    }

    /// Stream end: the open assistant turn becomes immutable.
    pub fn complete(&mut self) {
        let tail = self.carry.finish();
        if !tail.is_empty() {
            self.accumulator.push_str(&tail);
            self.sync_open_turn();
        }
        self.open_turn = false;
        self.phase = SessionPhase::Idle;
    }

    /// Read failure: surface the reason, keep whatever was already merged,
    /// and never fabricate content beyond it.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
        self.open_turn = false;
        self.phase = SessionPhase::Idle;
    }

    fn sync_open_turn(&mut self) {
        if self.open_turn {
            if let Some(last) = self.messages.last_mut() {
                last.content.clone_from(&self.accumulator);
            }
        } else {
            self.messages.push(Message::assistant(self.accumulator.clone()));
            self.open_turn = true;
        }
    }
}

/// Async driver that runs a session's cycle against a live gateway endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    session: ChatSession,
}

impl ChatClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            session: ChatSession::new(),
        }
    }

    pub fn with_provider(endpoint: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            session: ChatSession::with_provider(provider),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Submits `input` and consumes the response stream to completion,
    /// merging fragments as they arrive. Transport rejection and mid-read
    /// failure both land in the session's error slot; the conversation keeps
    /// only what was actually delivered.
    pub async fn send(&mut self, input: &str) -> Result<()> {
        let request = self.session.submit(input)?;

        let response = match self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let reason = e.to_string();
                self.session.fail(reason);
                return Err(EstuaryError::Network(e).into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = rejection_reason(&body);
            self.session.fail(reason.clone());
            return Err(EstuaryError::Upstream(status, reason).into());
        }

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => self.session.apply_fragment(&bytes),
                Err(e) => {
                    let reason = e.to_string();
                    self.session.fail(reason.clone());
                    return Err(EstuaryError::StreamRead(reason).into());
                }
            }
        }

        self.session.complete();
        Ok(())
    }
}

/// Pulls the human-readable reason out of a gateway rejection body, which is
/// JSON of the form `{"error": "...", "code": "..."}` when it comes from us.
fn rejection_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.to_string())
}
