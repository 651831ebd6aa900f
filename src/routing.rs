use crate::constants::{DEFAULT_MODEL, GROQ_MODEL, HINT_FAL, HINT_GROQ, TOOL_ROUTE_MARKER};
use crate::types::ChatRequest;

/// The response source chosen for one dispatch. One variant per backend:
/// a hosted streaming model, the verbatim fal passthrough, or the MCP
/// tool-invocation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Native(&'static str),
    Proxy,
    Tool,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Native(_) => "native",
            Backend::Proxy => "proxy",
            Backend::Tool => "tool",
        }
    }
}

/// Ordered tie-break policy over the request's explicit inputs. First match
/// wins:
///
/// 1. latest user text contains "mcp" (case-insensitive) -> Tool
/// 2. provider hint "fal" -> Proxy
/// 3. provider hint "groq" -> Native(groq model)
/// 4. otherwise -> Native(default model)
///
/// The substring scan is deliberately coarse; it reproduces the demo routing
/// of the original gateway and can misfire on unrelated text containing
/// those letters.
pub fn select_backend(request: &ChatRequest) -> Backend {
    if request
        .latest_user_text()
        .to_lowercase()
        .contains(TOOL_ROUTE_MARKER)
    {
        return Backend::Tool;
    }

    match request.provider.as_deref() {
        Some(HINT_FAL) => Backend::Proxy,
        Some(HINT_GROQ) => Backend::Native(GROQ_MODEL),
        _ => Backend::Native(DEFAULT_MODEL),
    }
}
