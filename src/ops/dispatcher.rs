// Repo-Scribe: Operation Dispatcher
// Runs a validated request against the file store and types every failure

use super::listing::{list_recursive, list_root, FALLBACK_BRANCH};
use super::outcome::{BranchInfo, OperationOutcome, OperationResult};
use super::request::{FileOperationRequest, OperationKind};
use super::resolver::{resolve, resolve_for_write};
use crate::error::{AgentError, AgentResult};
use repo_store::util::{basename, decode_content};
use repo_store::{EntryType, FileStore, RemoteFileRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Commit message templates; `{path}` is replaced with the target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitMessages {
    pub create: String,
    pub edit: String,
    pub delete: String,
}

impl Default for CommitMessages {
    fn default() -> Self {
        Self {
            create: "Create {path} via repo-scribe".to_string(),
            edit: "Update {path} via repo-scribe".to_string(),
            delete: "Delete {path} via repo-scribe".to_string(),
        }
    }
}

impl CommitMessages {
    fn render(template: &str, path: &str) -> String {
        template.replace("{path}", path)
    }
}

pub struct Dispatcher {
    store: Arc<dyn FileStore>,
    messages: CommitMessages,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self {
            store,
            messages: CommitMessages::default(),
        }
    }

    pub fn with_messages(mut self, messages: CommitMessages) -> Self {
        self.messages = messages;
        self
    }

    pub fn store(&self) -> &dyn FileStore {
        self.store.as_ref()
    }

    pub async fn dispatch(&self, request: &FileOperationRequest) -> AgentResult<OperationOutcome> {
        log::info!("{} {:?}", request.kind(), request.path());
        match request.kind() {
            OperationKind::List => self.list(request.path()).await.map(OperationOutcome::Listing),
            OperationKind::Read => self.read(request.path()).await.map(OperationOutcome::File),
            OperationKind::Create => self.create(request).await.map(OperationOutcome::Applied),
            OperationKind::Edit => self.edit(request).await.map(OperationOutcome::Applied),
            OperationKind::Delete => self.delete(request).await.map(OperationOutcome::Applied),
            OperationKind::Search => self.search(request.path()).await,
            OperationKind::Find => self.find(request.path()).await.map(OperationOutcome::Matches),
            OperationKind::History => self.history(request.path()).await,
            OperationKind::CreateBranch => {
                let base = request.base_ref().unwrap_or(FALLBACK_BRANCH);
                self.create_branch(request.path(), base)
                    .await
                    .map(OperationOutcome::Branch)
            }
        }
    }

    /// Direct children of `dir`; the root goes through every root convention.
    pub async fn list(&self, dir: &str) -> AgentResult<Vec<RemoteFileRecord>> {
        if dir.is_empty() {
            return list_root(self.store()).await;
        }
        self.store
            .list(dir, None)
            .await
            .map_err(|e| AgentError::from_store(dir, e))
    }

    pub async fn read(&self, path: &str) -> AgentResult<RemoteFileRecord> {
        let real = self.resolve_existing(path).await?;
        let blob = self
            .store
            .get(&real)
            .await
            .map_err(|e| AgentError::from_store(&real, e))?;
        let content = decode_content(&blob.content, blob.encoding.as_deref())
            .map_err(|e| AgentError::from_store(&real, e))?;

        Ok(RemoteFileRecord {
            name: basename(&real).to_string(),
            entry_type: EntryType::File,
            size: Some(blob.size),
            revision_id: blob.revision_id,
            content: Some(content),
            path: real,
        })
    }

    /// Create never overwrites: the existence probe runs before the write and
    /// a store-side conflict is reported the same way.
    pub async fn create(&self, request: &FileOperationRequest) -> AgentResult<OperationResult> {
        let path = request.path();
        let content = require_content(request)?;

        match self.store.get(path).await {
            Ok(_) => return Err(AgentError::AlreadyExists(path.to_string())),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(AgentError::from_store(path, e)),
        }

        let message = self.message(request, &self.messages.create, path);
        let receipt = match self.store.create(path, content, &message).await {
            Ok(receipt) => receipt,
            Err(e) if e.is_conflict() => return Err(AgentError::AlreadyExists(path.to_string())),
            Err(e) => return Err(AgentError::from_store(path, e)),
        };

        Ok(OperationResult {
            applied_path: path.to_string(),
            revision_id: receipt.revision_id,
            commit_id: receipt.commit_id,
            message: format!("Created {}", path),
        })
    }

    /// Compare-and-swap update against the revision fetched just before the
    /// write.
    pub async fn edit(&self, request: &FileOperationRequest) -> AgentResult<OperationResult> {
        let content = require_content(request)?;
        let real = self.resolve_target(request.path()).await?;

        let current = self
            .store
            .get(&real)
            .await
            .map_err(|e| AgentError::from_store(&real, e))?;

        if let Some(expected) = request.if_match() {
            if expected != current.revision_id {
                return Err(AgentError::Conflict {
                    path: real,
                    message: format!(
                        "expected revision {} but the file is at {}",
                        expected, current.revision_id
                    ),
                });
            }
        }

        let message = self.message(request, &self.messages.edit, &real);
        let receipt = self
            .store
            .update(&real, content, &message, &current.revision_id)
            .await
            .map_err(|e| AgentError::from_store(&real, e))?;

        Ok(OperationResult {
            message: format!("Updated {}", real),
            applied_path: real,
            revision_id: receipt.revision_id,
            commit_id: receipt.commit_id,
        })
    }

    /// Delete with the freshly fetched revision. If the store says the file
    /// is already gone, a second probe decides: confirmed absence is success,
    /// anything else is reported as not found.
    pub async fn delete(&self, request: &FileOperationRequest) -> AgentResult<OperationResult> {
        let real = self.resolve_target(request.path()).await?;

        let current = self
            .store
            .get(&real)
            .await
            .map_err(|e| AgentError::from_store(&real, e))?;

        let message = self.message(request, &self.messages.delete, &real);
        match self.store.delete(&real, &message, &current.revision_id).await {
            Ok(receipt) => Ok(OperationResult {
                message: format!("Deleted {}", real),
                applied_path: real,
                revision_id: None,
                commit_id: receipt.commit_id,
            }),
            Err(e) if e.is_not_found() => match self.store.get(&real).await {
                Err(probe) if probe.is_not_found() => {
                    log::warn!("{} vanished before the delete landed; treating as deleted", real);
                    Ok(OperationResult {
                        message: format!("{} was already deleted", real),
                        applied_path: real,
                        revision_id: None,
                        commit_id: None,
                    })
                }
                Err(probe) => Err(AgentError::from_store(&real, probe)),
                Ok(_) => Err(AgentError::FileNotFound(real)),
            },
            Err(e) => Err(AgentError::from_store(&real, e)),
        }
    }

    pub async fn search(&self, query: &str) -> AgentResult<OperationOutcome> {
        if query.trim().is_empty() {
            return Err(AgentError::parse(query, "search_files requires a query"));
        }
        self.store
            .search_code(query)
            .await
            .map(OperationOutcome::SearchHits)
            .map_err(|e| AgentError::from_store(query, e))
    }

    /// Files whose name contains `name`, or is contained in it, ignoring case.
    pub async fn find(&self, name: &str) -> AgentResult<Vec<RemoteFileRecord>> {
        let needle = basename(name).to_lowercase();
        if needle.is_empty() {
            return Err(AgentError::parse(name, "find_file requires a file name"));
        }
        let files = list_recursive(self.store()).await?;
        Ok(files
            .into_iter()
            .filter(|f| {
                let candidate = basename(&f.path).to_lowercase();
                candidate.contains(&needle) || needle.contains(&candidate)
            })
            .collect())
    }

    pub async fn history(&self, path: &str) -> AgentResult<OperationOutcome> {
        self.store
            .commit_history(path)
            .await
            .map(OperationOutcome::History)
            .map_err(|e| AgentError::from_store(path, e))
    }

    pub async fn create_branch(&self, name: &str, base: &str) -> AgentResult<BranchInfo> {
        let tip = match self.store.get_ref(base).await {
            Ok(tip) => tip,
            Err(e) if e.is_not_found() => return Err(AgentError::BranchNotFound(base.to_string())),
            Err(e) => return Err(AgentError::from_store(base, e)),
        };

        let created = self
            .store
            .create_ref(name, &tip.revision_id)
            .await
            .map_err(|e| AgentError::from_store(name, e))?;

        Ok(BranchInfo {
            name: created.name,
            base: base.to_string(),
            revision_id: created.revision_id,
        })
    }

    async fn resolve_existing(&self, path: &str) -> AgentResult<String> {
        resolve(self.store(), path)
            .await?
            .ok_or_else(|| AgentError::FileNotFound(path.to_string()))
    }

    /// Mutations accept only the named path, modulo case.
    async fn resolve_target(&self, path: &str) -> AgentResult<String> {
        resolve_for_write(self.store(), path)
            .await?
            .ok_or_else(|| AgentError::FileNotFound(path.to_string()))
    }

    fn message(&self, request: &FileOperationRequest, template: &str, path: &str) -> String {
        match request.commit_message() {
            Some(message) => message.to_string(),
            None => CommitMessages::render(template, path),
        }
    }
}

fn require_content(request: &FileOperationRequest) -> AgentResult<&str> {
    request
        .content()
        .ok_or_else(|| AgentError::parse(request.path(), format!("{} requires content", request.kind())))
}
