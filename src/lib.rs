// Repo-Scribe: Resilient File-Mutation Agent Core
// Normalizes agent-supplied arguments and applies file operations to a remote repository

// Per-conversation file agent and tool-call parsing
pub mod agents;

// Settings file and environment layering
pub mod config;

// Typed operation errors
pub mod error;

// CLI command handlers
pub mod handlers;

// Normalizer, resolver, extractor and dispatcher
pub mod ops;

// Re-export the types most callers need
pub use agents::{Agent, FileAgentSession, SessionOptions, SessionSummary, ToolCall};
pub use config::ScribeConfig;
pub use error::{AgentError, AgentResult};
pub use ops::{
    ContentRecovery, Dispatcher, FileOperationRequest, OperationKind, OperationOutcome,
    OperationResult,
};

// Store contract and adapters
pub use github_store::{GitHubClient, GitHubConfig, RepoSlug};
pub use repo_store::{FileStore, MemoryFileStore, StoreError};
