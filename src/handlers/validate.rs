// Repo-Scribe: Setup Validator
// Checks the token and repository permissions before any file operation runs

use crate::config::{ScribeConfig, ENV_TOKEN};
use github_store::{GitHubClient, GitHubConfig, RepoPermissions, RepoSlug};
use repo_store::{FileStore, StoreError};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationChecks {
    pub read_contents: bool,
    pub list_files: bool,
    pub create_branch: bool,
    pub write_access: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoAccess {
    pub full_name: String,
    pub html_url: String,
    pub private: bool,
    pub default_branch: String,
    pub permissions: RepoPermissions,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetupReport {
    pub success: bool,
    pub token_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepoAccess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations: Option<OperationChecks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recommendations: Vec<String>,
}

impl SetupReport {
    fn failed(error: String, recommendations: &[&str]) -> Self {
        Self {
            error: Some(error),
            recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Validate the configured token and, when a repository is configured, the
/// access it grants there.
pub async fn validate_setup(config: &ScribeConfig) -> SetupReport {
    let Some(token) = config.github_token.clone() else {
        return SetupReport::failed(
            format!("{} is not set", ENV_TOKEN),
            &["Create a personal access token and export it as GITHUB_API_TOKEN"],
        );
    };

    let slug = match config.repo_url.as_deref().map(RepoSlug::parse).transpose() {
        Ok(slug) => slug,
        Err(e) => {
            return SetupReport::failed(
                e.to_string(),
                &["Use https://github.com/<owner>/<repo> or <owner>/<repo>"],
            )
        }
    };

    // Without a repository only the user endpoint is queried.
    let gh_config = match &slug {
        Some(_) => config.github_config(),
        None => Ok(GitHubConfig::new(RepoSlug::new("", ""), Some(token))
            .with_api_base(&config.api_base_url)),
    };
    let client = match gh_config.map_err(|e| e.to_string()).and_then(|c| {
        GitHubClient::new(c).map_err(|e| e.to_string())
    }) {
        Ok(client) => client,
        Err(e) => return SetupReport::failed(e, &[]),
    };

    let mut report = SetupReport::default();
    match client.current_user().await {
        Ok(user) => {
            report.token_valid = true;
            report.user = Some(user.login);
        }
        Err(StoreError::Authentication(_)) => {
            return SetupReport::failed(
                format!("Invalid GitHub token. Please check your {}", ENV_TOKEN),
                &["Generate a new token and make sure it has not expired"],
            );
        }
        Err(e) => return SetupReport::failed(format!("GitHub API error: {}", e), &[]),
    }

    if slug.is_none() {
        report.success = true;
        return report;
    }

    let repo = match client.repository().await {
        Ok(repo) => repo,
        Err(StoreError::NotFound(_)) => {
            report.error = Some(format!("Repository not found: {}", client.repo()));
            report.recommendations = vec![
                "Check if the repository URL is correct".to_string(),
                "Verify the repository exists".to_string(),
                "Ensure your token has access to this repository".to_string(),
            ];
            return report;
        }
        Err(StoreError::Authentication(_)) => {
            report.error = Some("Authentication failed for repository access".to_string());
            report.recommendations = vec![
                format!("Check your {} is valid", ENV_TOKEN),
                "Ensure the token has 'repo' scope for private repositories".to_string(),
            ];
            return report;
        }
        Err(e) => {
            report.error = Some(format!("Repository access error: {}", e));
            return report;
        }
    };

    let permissions = repo.permissions.clone().unwrap_or_default();
    let mut checks = OperationChecks {
        write_access: permissions.push,
        ..OperationChecks::default()
    };
    if client.list("", None).await.is_ok() {
        checks.read_contents = true;
        checks.list_files = true;
    }
    if checks.write_access {
        checks.create_branch = client.get_ref(&repo.default_branch).await.is_ok();
    }

    report.recommendations = recommendations(&checks);
    report.repository = Some(RepoAccess {
        full_name: repo.full_name,
        html_url: repo.html_url,
        private: repo.private,
        default_branch: repo.default_branch,
        permissions,
    });
    report.operations = Some(checks);
    report.success = true;
    report
}

fn recommendations(checks: &OperationChecks) -> Vec<String> {
    let mut out = Vec::new();
    if !checks.read_contents {
        out.push("Token may not have read access to repository contents".to_string());
    }
    if !checks.write_access {
        out.push("Token does not have write access; only read operations will work".to_string());
        out.push("For full functionality, ensure the token has 'repo' scope".to_string());
    }
    if checks.write_access && !checks.create_branch {
        out.push("Branch creation may be restricted by repository settings".to_string());
    }
    out
}
