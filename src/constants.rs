/// Fixed system preamble prepended to every outbound conversation. Process-wide
/// constant state, never mutated after initialization.
pub const SYSTEM_PREAMBLE: &str = "\
You are CodeAgent, an autonomous full-stack coding assistant.\n\n\
Your job is to:\n\
- Understand complex software engineering tasks\n\
- Design and implement full solutions across backend, frontend, and APIs\n\
- Write complete code (well-structured, idiomatic, modular)\n\
- Use reasoning to decide what files, libraries, or patterns to use\n\
- Respond with clean, copy-paste-ready code blocks\n\
- Explain decisions only when asked — otherwise, be direct and efficient\n\n\
You have access to tools and capabilities including:\n\
- JavaScript, TypeScript, Python, Go, Rust, SQL, and Shell scripting\n\
- Frameworks: Next.js, React, Express, FastAPI, Flask, TailwindCSS, Prisma\n\
- Vercel AI SDK for building agentic, streaming chat UIs\n\
- File system simulation: You can create or modify files and return file paths and contents\n\
- Git commands and CLI instructions\n\
- MCP client to call external MCP servers and tools\n\n\
Instructions:\n\
- When given a user request, first plan the steps\n\
- Then execute each step in order, returning the relevant code or explanation\n\
- If asked to \"build X\", return the full code in a structured format\n\
- Never hallucinate library names — check if they exist in npm or PyPI\n\
- When unsure, ask clarifying questions before continuing\n\n\
Behavior settings:\n\
- Smart and focused\n\
- Code-first: Always respond with code\n\
- Structured output: Use folders/files structure when returning multi-file output\n";

/// Default hosted model and its chat-completions endpoint.
pub const DEFAULT_MODEL: &str = "grok-2-1212";
pub const XAI_CHAT_COMPLETIONS: &str = "https://api.x.ai/v1/chat/completions";

/// Model used when the caller hints "groq".
pub const GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const GROQ_CHAT_COMPLETIONS: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Fallback MCP endpoint when MCP_SERVER_URL is not set.
pub const DEFAULT_MCP_URL: &str = "http://localhost:3000/api/mcp";

/// Fallback fal passthrough endpoint when FAL_PROXY_URL is not set.
pub const DEFAULT_FAL_PROXY_URL: &str = "http://localhost:3000/api/fal/proxy";

/// Substring in the latest user message that routes a request to the
/// tool-invocation path. Matched case-insensitively anywhere in the text.
pub const TOOL_ROUTE_MARKER: &str = "mcp";

/// Provider hints recognized by the selection policy.
pub const HINT_FAL: &str = "fal";
pub const HINT_GROQ: &str = "groq";

/// Upper bound on SSE line length accepted from a native provider.
pub const MAX_UPSTREAM_LINE_BYTES: usize = 1024 * 1024;

/// Upper bound on lines read from one native provider stream.
pub const MAX_STREAM_LINES: usize = 100_000;
