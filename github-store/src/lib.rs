pub mod client;
pub mod repo_url;
pub mod wire;

// Re-exports
pub use client::{classify_status, GitHubClient, GitHubConfig};
pub use repo_url::{RepoSlug, RepoUrlError};
pub use wire::{GitHubUser, RepoPermissions, RepositoryInfo};
