use crate::error::{StoreError, StoreResult};
use crate::models::{
    CodeSearchHit, CommitInfo, FileBlob, RefInfo, RemoteFileRecord, WriteReceipt,
};
use crate::search::SearchIndex;
use crate::store::FileStore;
use crate::util;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use walkdir::WalkDir;

const REF_PREFIX: &str = "refs/heads/";

/// In-process [`FileStore`] with the same conflict semantics as the hosted
/// store: content-addressed revisions, compare-and-swap writes, one commit
/// per mutation on the default branch.
#[derive(Clone, Default)]
pub struct MemoryFileStore {
    // Arc<RwLock> gives interior mutability and cheap clones
    inner: Arc<RwLock<MemoryStoreInner>>,
}

struct StoredFile {
    content: String,
    revision_id: String,
}

struct StoredCommit {
    revision_id: String,
    message: String,
    author: String,
    timestamp: DateTime<Utc>,
    path: String,
}

struct MemoryStoreInner {
    files: BTreeMap<String, StoredFile>,
    // Oldest first
    commits: Vec<StoredCommit>,
    refs: BTreeMap<String, String>,
    default_branch: String,
    author: String,
    seq: u64,
    base64_blobs: bool,
}

impl Default for MemoryStoreInner {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            commits: Vec::new(),
            refs: BTreeMap::new(),
            default_branch: "main".to_string(),
            author: "repo-scribe".to_string(),
            seq: 0,
            base64_blobs: false,
        }
    }
}

impl MemoryStoreInner {
    fn commit(&mut self, path: &str, message: &str) -> String {
        self.seq += 1;
        let parent = self.refs.get(&self.default_branch).cloned();
        let revision_id = util::commit_revision(parent.as_deref(), path, message, self.seq);
        self.commits.push(StoredCommit {
            revision_id: revision_id.clone(),
            message: message.to_string(),
            author: self.author.clone(),
            timestamp: Utc::now(),
            path: path.to_string(),
        });
        let branch = self.default_branch.clone();
        self.refs.insert(branch, revision_id.clone());
        revision_id
    }

    fn is_dir(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir);
        self.files.keys().any(|p| p.starts_with(&prefix))
    }

    fn children(&self, dir: &str) -> Vec<RemoteFileRecord> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let mut dirs = BTreeSet::new();
        let mut entries = Vec::new();
        for (path, file) in self.files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    if dirs.insert(child.to_string()) {
                        entries.push(RemoteFileRecord::dir(&format!("{}{}", prefix, child)));
                    }
                }
                None => entries.push(RemoteFileRecord::file(
                    path,
                    file.content.len() as u64,
                    &file.revision_id,
                )),
            }
        }
        entries
    }

    fn knows_ref(&self, name: &str) -> bool {
        name == self.default_branch || self.refs.contains_key(name)
    }
}

fn clean_path(path: &str) -> &str {
    path.trim().trim_matches('/')
}

fn branch_name(name: &str) -> &str {
    name.strip_prefix(REF_PREFIX).unwrap_or(name)
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve blobs base64-encoded the way GitHub does, so callers exercise
    /// their decoding path.
    pub fn with_base64_blobs(self) -> Self {
        self.write().base64_blobs = true;
        self
    }

    pub fn with_default_branch(self, branch: &str) -> Self {
        self.write().default_branch = branch.to_string();
        self
    }

    /// Seed a file directly, recording a commit like any other write.
    pub fn seed(&self, path: &str, content: &str) -> String {
        let path = clean_path(path);
        let mut inner = self.write();
        let revision_id = util::content_revision(content);
        inner.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision_id: revision_id.clone(),
            },
        );
        inner.commit(path, &format!("Seed {}", path));
        revision_id
    }

    /// Mirror a local directory tree. `.git` and non-UTF-8 files are skipped.
    pub fn from_dir(root: &Path) -> StoreResult<Self> {
        let store = Self::new();
        let mut seeded = 0usize;
        for entry in WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
        {
            let entry = entry.map_err(|e| StoreError::Transport(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            match std::fs::read_to_string(entry.path()) {
                Ok(content) => {
                    store.seed(&rel, &content);
                    seeded += 1;
                }
                Err(e) => tracing::debug!("Skipping {}: {}", rel, e),
            }
        }
        tracing::info!("Seeded {} files from {}", seeded, root.display());
        Ok(store)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().files.contains_key(clean_path(path))
    }

    pub fn content_of(&self, path: &str) -> Option<String> {
        self.read()
            .files
            .get(clean_path(path))
            .map(|f| f.content.clone())
    }

    pub fn file_count(&self) -> usize {
        self.read().files.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryStoreInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStoreInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn list(&self, path: &str, git_ref: Option<&str>) -> StoreResult<Vec<RemoteFileRecord>> {
        let inner = self.read();
        if let Some(r) = git_ref {
            if !inner.knows_ref(branch_name(r)) {
                return Err(StoreError::NotFound(format!("No commit found for the ref {}", r)));
            }
        }

        let path = clean_path(path);
        if path.is_empty() {
            return Ok(inner.children(""));
        }
        if let Some(file) = inner.files.get(path) {
            return Ok(vec![RemoteFileRecord::file(
                path,
                file.content.len() as u64,
                &file.revision_id,
            )]);
        }
        if inner.is_dir(path) {
            return Ok(inner.children(path));
        }
        Err(StoreError::NotFound(path.to_string()))
    }

    async fn get(&self, path: &str) -> StoreResult<FileBlob> {
        let inner = self.read();
        let path = clean_path(path);
        let file = inner
            .files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        let (content, encoding) = if inner.base64_blobs {
            (util::encode_base64(&file.content), Some("base64".to_string()))
        } else {
            (file.content.clone(), None)
        };

        Ok(FileBlob {
            path: path.to_string(),
            name: util::basename(path).to_string(),
            content,
            encoding,
            revision_id: file.revision_id.clone(),
            size: file.content.len() as u64,
        })
    }

    async fn create(&self, path: &str, content: &str, message: &str) -> StoreResult<WriteReceipt> {
        let mut inner = self.write();
        let path = clean_path(path);
        if inner.files.contains_key(path) {
            return Err(StoreError::Conflict(format!("\"sha\" wasn't supplied for {}", path)));
        }
        let revision_id = util::content_revision(content);
        inner.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision_id: revision_id.clone(),
            },
        );
        let commit_id = inner.commit(path, message);
        Ok(WriteReceipt {
            revision_id: Some(revision_id),
            commit_id: Some(commit_id),
        })
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_revision_id: &str,
    ) -> StoreResult<WriteReceipt> {
        let mut inner = self.write();
        let path = clean_path(path);
        let file = inner
            .files
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if file.revision_id != expected_revision_id {
            return Err(StoreError::Conflict(format!(
                "{} is at {} but {} was expected",
                path, file.revision_id, expected_revision_id
            )));
        }
        let revision_id = util::content_revision(content);
        file.content = content.to_string();
        file.revision_id = revision_id.clone();
        let commit_id = inner.commit(path, message);
        Ok(WriteReceipt {
            revision_id: Some(revision_id),
            commit_id: Some(commit_id),
        })
    }

    async fn delete(
        &self,
        path: &str,
        message: &str,
        expected_revision_id: &str,
    ) -> StoreResult<WriteReceipt> {
        let mut inner = self.write();
        let path = clean_path(path);
        let current = inner
            .files
            .get(path)
            .map(|f| f.revision_id.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if current != expected_revision_id {
            return Err(StoreError::Conflict(format!(
                "{} is at {} but {} was expected",
                path, current, expected_revision_id
            )));
        }
        inner.files.remove(path);
        let commit_id = inner.commit(path, message);
        Ok(WriteReceipt {
            revision_id: None,
            commit_id: Some(commit_id),
        })
    }

    async fn search_code(&self, query: &str) -> StoreResult<Vec<CodeSearchHit>> {
        let inner = self.read();
        let index = SearchIndex::new(
            inner
                .files
                .iter()
                .map(|(path, file)| (path.as_str(), file.content.as_str())),
        );
        Ok(index.search(query))
    }

    async fn commit_history(&self, path: &str) -> StoreResult<Vec<CommitInfo>> {
        let inner = self.read();
        let path = clean_path(path);
        Ok(inner
            .commits
            .iter()
            .rev()
            .filter(|c| c.path == path)
            .map(|c| CommitInfo {
                revision_id: c.revision_id.clone(),
                message: c.message.clone(),
                author: c.author.clone(),
                timestamp: c.timestamp,
            })
            .collect())
    }

    async fn get_ref(&self, name: &str) -> StoreResult<RefInfo> {
        let inner = self.read();
        let name = branch_name(name);
        inner
            .refs
            .get(name)
            .map(|revision_id| RefInfo {
                name: name.to_string(),
                revision_id: revision_id.clone(),
            })
            .ok_or_else(|| StoreError::NotFound(format!("Branch not found: {}", name)))
    }

    async fn create_ref(&self, name: &str, revision_id: &str) -> StoreResult<RefInfo> {
        let mut inner = self.write();
        let name = branch_name(name);
        if inner.refs.contains_key(name) {
            return Err(StoreError::Conflict(format!("Reference already exists: {}", name)));
        }
        if !inner.commits.iter().any(|c| c.revision_id == revision_id) {
            return Err(StoreError::Conflict(format!("Object does not exist: {}", revision_id)));
        }
        inner.refs.insert(name.to_string(), revision_id.to_string());
        Ok(RefInfo {
            name: name.to_string(),
            revision_id: revision_id.to_string(),
        })
    }

    async fn default_branch(&self) -> StoreResult<String> {
        Ok(self.read().default_branch.clone())
    }
}
