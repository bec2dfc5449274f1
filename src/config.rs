// Repo-Scribe: Configuration
// Defaults, then the JSON settings file, then environment, then CLI flags

use crate::agents::SessionOptions;
use crate::ops::{CommitMessages, ContentRecovery};
use anyhow::{anyhow, Context};
use github_store::{GitHubConfig, RepoSlug};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_TOKEN: &str = "GITHUB_API_TOKEN";
pub const ENV_REPO: &str = "REPO_SCRIBE_REPO";
pub const ENV_API_BASE: &str = "REPO_SCRIBE_API_BASE";
pub const ENV_BASE_BRANCH: &str = "REPO_SCRIBE_BASE_BRANCH";
pub const ENV_CONTENT_RECOVERY: &str = "REPO_SCRIBE_CONTENT_RECOVERY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// `https://github.com/owner/repo` or `owner/repo`
    pub repo_url: Option<String>,
    #[serde(skip_serializing)]
    pub github_token: Option<String>,
    pub api_base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Branch reads and writes go to; `None` follows the repository default
    pub branch: Option<String>,
    pub default_base_branch: String,
    pub content_recovery: ContentRecovery,
    pub commit_messages: CommitMessages,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            repo_url: None,
            github_token: None,
            api_base_url: "https://api.github.com".to_string(),
            user_agent: format!("repo-scribe/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            branch: None,
            default_base_branch: "main".to_string(),
            content_recovery: ContentRecovery::default(),
            commit_messages: CommitMessages::default(),
        }
    }
}

impl ScribeConfig {
    /// `<config_dir>/repo-scribe/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repo-scribe")
            .join("config.json")
    }

    /// Load defaults, the settings file and the process environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overlay values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_TOKEN) {
            self.github_token = Some(token);
        }
        if let Some(repo) = get(ENV_REPO) {
            self.repo_url = Some(repo);
        }
        if let Some(base) = get(ENV_API_BASE) {
            self.api_base_url = base;
        }
        if let Some(branch) = get(ENV_BASE_BRANCH) {
            self.default_base_branch = branch;
        }
        if let Some(policy) = get(ENV_CONTENT_RECOVERY) {
            self.content_recovery = policy
                .parse()
                .map_err(|e: String| anyhow!("{}: {}", ENV_CONTENT_RECOVERY, e))?;
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            content_recovery: self.content_recovery,
            default_base_branch: self.default_base_branch.clone(),
            commit_messages: self.commit_messages.clone(),
        }
    }

    pub fn repo_slug(&self) -> anyhow::Result<RepoSlug> {
        let url = self
            .repo_url
            .as_deref()
            .ok_or_else(|| anyhow!("No repository configured; pass --repo or set {}", ENV_REPO))?;
        Ok(RepoSlug::parse(url)?)
    }

    pub fn github_config(&self) -> anyhow::Result<GitHubConfig> {
        let mut config = GitHubConfig::new(self.repo_slug()?, self.github_token.clone())
            .with_api_base(&self.api_base_url)
            .with_branch(self.branch.clone());
        config.timeout_secs = self.timeout_secs;
        config.user_agent = self.user_agent.clone();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_file_then_env_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"repo_url": "octo/demo", "timeout_secs": 5, "content_recovery": "strict", "github_token": "from-file"}"#,
        )
        .unwrap();

        let mut config = ScribeConfig::from_file(&path).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_base_branch, "main");
        assert_eq!(config.content_recovery, ContentRecovery::Strict);
        assert_eq!(config.github_token.as_deref(), Some("from-file"));

        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_TOKEN, "from-env"),
            (ENV_CONTENT_RECOVERY, "synthesize"),
            (ENV_BASE_BRANCH, ""),
        ]);
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.github_token.as_deref(), Some("from-env"));
        assert_eq!(config.content_recovery, ContentRecovery::Synthesize);
        assert_eq!(config.default_base_branch, "main");
    }

    #[test]
    fn test_token_is_never_serialized() {
        let config = ScribeConfig {
            github_token: Some("secret".into()),
            ..ScribeConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_bad_policy_and_missing_repo() {
        let mut config = ScribeConfig::default();
        assert!(config
            .apply_env(|k| (k == ENV_CONTENT_RECOVERY).then(|| "lenient".to_string()))
            .is_err());
        assert!(config.github_config().is_err());

        config.repo_url = Some("https://github.com/octo/demo.git".into());
        let gh = config.github_config().unwrap();
        assert_eq!(gh.repo.to_string(), "octo/demo");
        assert_eq!(gh.timeout_secs, 30);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ScribeConfig::load(Some(&dir.path().join("nope.json"))).is_err());
    }
}
