// GitHub REST client for repo-scribe
// Implements the FileStore contract over the contents, search, commits and refs APIs

use crate::repo_url::RepoSlug;
use crate::wire::{
    CommitEntry, ContentItem, ContentsResponse, CreateRefBody, DeleteContentsBody, ErrorBody,
    GitHubUser, GitRef, PutContentsBody, RepositoryInfo, SearchResponse, WriteResponse,
};
use async_trait::async_trait;
use repo_store::util::encode_base64;
use repo_store::{
    CodeSearchHit, CommitInfo, EntryType, FileBlob, FileStore, RefInfo, RemoteFileRecord,
    StoreError, StoreResult, WriteReceipt,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Warn once the remaining request budget drops below this.
const RATE_LIMIT_WARN_THRESHOLD: u32 = 10;

/// Configuration for the GitHub client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// API root, `https://api.github.com` for github.com
    pub api_base_url: String,
    /// Personal access token; requests go out unauthenticated without one
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub repo: RepoSlug,
    /// Branch for reads and writes; `None` uses the repository default
    pub branch: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl GitHubConfig {
    pub fn new(repo: RepoSlug, token: Option<String>) -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            token,
            repo,
            branch: None,
            timeout_secs: 30,
            user_agent: format!("repo-scribe/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_api_base(mut self, api_base_url: &str) -> Self {
        self.api_base_url = api_base_url.to_string();
        self
    }

    pub fn with_branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }
}

/// GitHub-backed file store
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base: Url,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));
        if let Some(token) = config.token.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StoreError::Authentication("token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let base = Url::parse(&config.api_base_url)
            .map_err(|e| StoreError::Transport(format!("Invalid API base URL: {}", e)))?;

        Ok(Self {
            client,
            base,
            config,
        })
    }

    pub fn repo(&self) -> &RepoSlug {
        &self.config.repo
    }

    /// The authenticated user; the cheapest call that proves the token works.
    pub async fn current_user(&self) -> StoreResult<GitHubUser> {
        let url = self.endpoint(&["user"])?;
        self.send(self.client.get(url)).await
    }

    pub async fn repository(&self) -> StoreResult<RepositoryInfo> {
        let url = self.repo_endpoint(&[])?;
        self.send(self.client.get(url)).await
    }

    fn endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport("API base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn repo_endpoint(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut all = vec!["repos", self.config.repo.owner.as_str(), self.config.repo.repo.as_str()];
        all.extend_from_slice(segments);
        self.endpoint(&all)
    }

    /// `repos/{owner}/{repo}/contents/{path}`. A lone `/` keeps the trailing
    /// slash so callers can probe both root conventions.
    fn contents_url(&self, path: &str) -> StoreResult<Url> {
        let mut segments = vec!["contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.repo_endpoint(&segments)?;
        if path == "/" {
            if let Ok(mut segs) = url.path_segments_mut() {
                segs.push("");
            }
        }
        Ok(url)
    }

    fn with_ref(mut url: Url, git_ref: Option<&str>) -> Url {
        if let Some(r) = git_ref {
            url.query_pairs_mut().append_pair("ref", r);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        if let Some(remaining) = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
        {
            if remaining < RATE_LIMIT_WARN_THRESHOLD {
                log::warn!("GitHub API rate limit low: {} remaining", remaining);
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to read response body: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(classify_status(status, &body));
        }
        serde_json::from_str(&body).map_err(StoreError::from)
    }

    fn write_branch(&self) -> Option<&str> {
        self.config.branch.as_deref()
    }
}

/// Map a non-2xx response to the store taxonomy.
pub fn classify_status(status: u16, body: &str) -> StoreError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let lower = message.to_lowercase();

    match status {
        401 => StoreError::Authentication(message),
        403 if lower.contains("credentials") || lower.contains("not accessible") => {
            StoreError::Authentication(message)
        }
        404 => StoreError::NotFound(message),
        409 | 422 => StoreError::Conflict(message),
        _ => StoreError::Remote { status, message },
    }
}

fn to_record(item: ContentItem) -> RemoteFileRecord {
    let entry_type = if item.kind == "dir" {
        EntryType::Dir
    } else {
        EntryType::File
    };
    RemoteFileRecord {
        size: match entry_type {
            EntryType::File => item.size,
            EntryType::Dir => None,
        },
        path: item.path,
        name: item.name,
        entry_type,
        revision_id: item.sha,
        content: None,
    }
}

fn receipt(response: WriteResponse) -> WriteReceipt {
    WriteReceipt {
        revision_id: response.content.map(|c| c.sha),
        commit_id: response.commit.map(|c| c.sha),
    }
}

#[async_trait]
impl FileStore for GitHubClient {
    async fn list(&self, path: &str, git_ref: Option<&str>) -> StoreResult<Vec<RemoteFileRecord>> {
        let git_ref = git_ref.or(self.config.branch.as_deref());
        let url = Self::with_ref(self.contents_url(path)?, git_ref);
        log::debug!("GET {}", url);
        let response: ContentsResponse = self.send(self.client.get(url)).await?;
        Ok(match response {
            ContentsResponse::Dir(items) => items.into_iter().map(to_record).collect(),
            ContentsResponse::File(item) => vec![to_record(*item)],
        })
    }

    async fn get(&self, path: &str) -> StoreResult<FileBlob> {
        let url = Self::with_ref(self.contents_url(path)?, self.config.branch.as_deref());
        log::debug!("GET {}", url);
        let response: ContentsResponse = self.send(self.client.get(url)).await?;
        match response {
            ContentsResponse::File(item) => {
                let item = *item;
                Ok(FileBlob {
                    size: item.size.unwrap_or(0),
                    content: item.content.unwrap_or_default(),
                    encoding: item.encoding,
                    revision_id: item.sha,
                    path: item.path,
                    name: item.name,
                })
            }
            ContentsResponse::Dir(_) => {
                Err(StoreError::NotFound(format!("{} is a directory", path)))
            }
        }
    }

    async fn create(&self, path: &str, content: &str, message: &str) -> StoreResult<WriteReceipt> {
        let url = self.contents_url(path)?;
        let body = PutContentsBody {
            message,
            content: encode_base64(content),
            sha: None,
            branch: self.write_branch(),
        };
        let response: WriteResponse = self.send(self.client.put(url).json(&body)).await?;
        Ok(receipt(response))
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_revision_id: &str,
    ) -> StoreResult<WriteReceipt> {
        let url = self.contents_url(path)?;
        let body = PutContentsBody {
            message,
            content: encode_base64(content),
            sha: Some(expected_revision_id),
            branch: self.write_branch(),
        };
        let response: WriteResponse = self.send(self.client.put(url).json(&body)).await?;
        Ok(receipt(response))
    }

    async fn delete(
        &self,
        path: &str,
        message: &str,
        expected_revision_id: &str,
    ) -> StoreResult<WriteReceipt> {
        let url = self.contents_url(path)?;
        let body = DeleteContentsBody {
            message,
            sha: expected_revision_id,
            branch: self.write_branch(),
        };
        let response: WriteResponse = self
            .send(self.client.request(Method::DELETE, url).json(&body))
            .await?;
        Ok(receipt(response))
    }

    async fn search_code(&self, query: &str) -> StoreResult<Vec<CodeSearchHit>> {
        let mut url = self.endpoint(&["search", "code"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("{} repo:{}", query, self.config.repo));
        let response: SearchResponse = self.send(self.client.get(url)).await?;
        Ok(response
            .items
            .into_iter()
            .map(|item| CodeSearchHit {
                path: item.path,
                name: item.name,
                score: item.score,
            })
            .collect())
    }

    async fn commit_history(&self, path: &str) -> StoreResult<Vec<CommitInfo>> {
        let mut url = self.repo_endpoint(&["commits"])?;
        url.query_pairs_mut().append_pair("path", path);
        if let Some(branch) = self.config.branch.as_deref() {
            url.query_pairs_mut().append_pair("sha", branch);
        }
        let response: Vec<CommitEntry> = self.send(self.client.get(url)).await?;
        Ok(response
            .into_iter()
            .map(|entry| {
                let (author, timestamp) = match entry.commit.author {
                    Some(a) => (a.name, a.date),
                    None => (String::new(), Default::default()),
                };
                CommitInfo {
                    revision_id: entry.sha,
                    message: entry.commit.message,
                    author,
                    timestamp,
                }
            })
            .collect())
    }

    async fn get_ref(&self, name: &str) -> StoreResult<RefInfo> {
        let name = name.strip_prefix("refs/heads/").unwrap_or(name);
        let mut segments = vec!["git", "ref", "heads"];
        segments.extend(name.split('/'));
        let url = self.repo_endpoint(&segments)?;
        let git_ref: GitRef = self.send(self.client.get(url)).await?;
        Ok(RefInfo {
            name: name.to_string(),
            revision_id: git_ref.object.sha,
        })
    }

    async fn create_ref(&self, name: &str, revision_id: &str) -> StoreResult<RefInfo> {
        let name = name.strip_prefix("refs/heads/").unwrap_or(name);
        let url = self.repo_endpoint(&["git", "refs"])?;
        let body = CreateRefBody {
            name: format!("refs/heads/{}", name),
            sha: revision_id,
        };
        let git_ref: GitRef = self.send(self.client.post(url).json(&body)).await?;
        Ok(RefInfo {
            name: git_ref
                .name
                .strip_prefix("refs/heads/")
                .unwrap_or(&git_ref.name)
                .to_string(),
            revision_id: git_ref.object.sha,
        })
    }

    async fn default_branch(&self) -> StoreResult<String> {
        Ok(self.repository().await?.default_branch)
    }
}
