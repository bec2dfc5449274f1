// Repository URL parsing for the GitHub adapter

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RepoUrlError {
    #[error("Unsupported repository URL format: {0}")]
    Unsupported(String),

    #[error("Invalid GitHub URL format: {0}")]
    Invalid(String),
}

/// `owner/repo` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    /// Accepts `https://github.com/owner/repo(.git)`, `git@github.com:owner/repo.git`
    /// and bare `owner/repo`.
    pub fn parse(repo_url: &str) -> Result<Self, RepoUrlError> {
        let trimmed = repo_url.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let tail = if let Some(idx) = trimmed.find("github.com") {
            let rest = &trimmed[idx + "github.com".len()..];
            match rest.strip_prefix('/').or_else(|| rest.strip_prefix(':')) {
                Some(tail) => tail,
                None => return Err(RepoUrlError::Invalid(repo_url.to_string())),
            }
        } else if trimmed.contains('/') && !trimmed.starts_with("http") {
            trimmed
        } else {
            return Err(RepoUrlError::Unsupported(repo_url.to_string()));
        };

        let mut parts = tail.split('/').filter(|s| !s.is_empty());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if valid_segment(owner) && valid_segment(repo) => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(RepoUrlError::Invalid(repo_url.to_string())),
        }
    }
}

fn valid_segment(s: &str) -> bool {
    !s.is_empty() && s != ".." && !s.contains('?') && !s.contains('#') && !s.contains(' ')
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
