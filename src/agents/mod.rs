// Repo-Scribe: Agent Layer
// Tool-call parsing, intent classification and the per-conversation file agent

pub mod file_agent;
pub mod intent;

// Re-exports
pub use file_agent::{FileAgentSession, SessionOptions, SessionSummary};
pub use intent::{classify_text, infer_call, ToolCall, ToolSpec, TOOLS};

/// Base trait for all agents
pub trait Agent: Send + Sync {
    /// Get the agent's name
    fn name(&self) -> &str;

    /// Get the agent's system prompt
    fn system_prompt(&self) -> &str;
}
