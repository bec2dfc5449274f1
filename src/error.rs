// Repo-Scribe: Error Taxonomy
// Typed failures for every file operation, each carrying the offending input

use repo_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("could not parse arguments: {message} (input: {input:?})")]
    ArgumentParse { input: String, message: String },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("ambiguous path: {path} (did you mean: {})", .candidates.join(", "))]
    AmbiguousPath {
        path: String,
        candidates: Vec<String>,
    },

    #[error("file already exists: {0} (use edit_file to change it)")]
    AlreadyExists(String),

    #[error("conflict on {path}: {message}")]
    Conflict { path: String, message: String },

    #[error("authentication failed for {path}: {message}")]
    Authentication { path: String, message: String },

    #[error("branch not found: {0}")]
    BranchNotFound(String),

    #[error("unknown tool: {0:?}")]
    UnknownTool(String),

    #[error("store error on {path:?}: {source}")]
    Store {
        path: String,
        #[source]
        source: StoreError,
    },
}

pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    pub fn parse(input: &str, message: impl Into<String>) -> Self {
        Self::ArgumentParse {
            input: input.to_string(),
            message: message.into(),
        }
    }

    /// Translate a store failure for `path` into the agent taxonomy.
    pub fn from_store(path: &str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::FileNotFound(path.to_string()),
            StoreError::Conflict(message) => Self::Conflict {
                path: path.to_string(),
                message,
            },
            StoreError::Authentication(message) => Self::Authentication {
                path: path.to_string(),
                message,
            },
            other => Self::Store {
                path: path.to_string(),
                source: other,
            },
        }
    }

    /// Stable snake_case tag for structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "invalid_path",
            Self::ArgumentParse { .. } => "argument_parse",
            Self::FileNotFound(_) => "file_not_found",
            Self::AmbiguousPath { .. } => "ambiguous_path",
            Self::AlreadyExists(_) => "already_exists",
            Self::Conflict { .. } => "conflict",
            Self::Authentication { .. } => "authentication",
            Self::BranchNotFound(_) => "branch_not_found",
            Self::UnknownTool(_) => "unknown_tool",
            Self::Store { .. } => "store",
        }
    }

    /// Paths suggested by the resolver, empty for every other kind.
    pub fn candidates(&self) -> &[String] {
        match self {
            Self::AmbiguousPath { candidates, .. } => candidates,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_keeps_offending_path() {
        let err = AgentError::from_store("a.py", StoreError::NotFound("gone".into()));
        assert!(matches!(err, AgentError::FileNotFound(ref p) if p == "a.py"));

        let err = AgentError::from_store("a.py", StoreError::Conflict("sha mismatch".into()));
        assert_eq!(err.kind(), "conflict");
        assert!(err.to_string().contains("a.py"));

        let err = AgentError::from_store(
            "a.py",
            StoreError::Remote {
                status: 500,
                message: "boom".into(),
            },
        );
        assert_eq!(err.kind(), "store");
    }

    #[test]
    fn test_ambiguous_message_lists_candidates() {
        let err = AgentError::AmbiguousPath {
            path: "utils/gitrepo.py".into(),
            candidates: vec!["utils/git_repo.py".into(), "utils/github_agent.py".into()],
        };
        let text = err.to_string();
        assert!(text.contains("utils/gitrepo.py"));
        assert!(text.contains("utils/git_repo.py, utils/github_agent.py"));
        assert_eq!(err.candidates().len(), 2);
    }
}
