// Repo-Scribe: Tree Listing
// Root listing strategies and the recursive walk shared by resolver, find and list

use crate::error::{AgentError, AgentResult};
use repo_store::{FileStore, RemoteFileRecord, StoreError};

/// Branch tried last when the root cannot be listed any other way.
pub const FALLBACK_BRANCH: &str = "main";

/// List the repository root.
///
/// Hosted stores disagree on how the root is addressed, so several
/// conventions are tried in order: `""`, `"/"`, the default branch and
/// finally `main`. The first listing that succeeds wins. When every attempt
/// reports not-found the repository has no commits yet and the root is
/// empty. Any other failure is returned immediately.
pub async fn list_root(store: &dyn FileStore) -> AgentResult<Vec<RemoteFileRecord>> {
    for path in ["", "/"] {
        match store.list(path, None).await {
            Ok(entries) => return Ok(entries),
            Err(e) if e.is_not_found() => {
                log::debug!("Root listing via {:?} not found: {}", path, e);
            }
            Err(e) => return Err(AgentError::from_store(path, e)),
        }
    }

    let default_branch = match store.default_branch().await {
        Ok(branch) => Some(branch),
        Err(e) if e.is_not_found() => None,
        Err(e) => return Err(AgentError::from_store("", e)),
    };

    let mut refs: Vec<&str> = Vec::new();
    if let Some(branch) = default_branch.as_deref() {
        refs.push(branch);
    }
    if default_branch.as_deref() != Some(FALLBACK_BRANCH) {
        refs.push(FALLBACK_BRANCH);
    }

    for git_ref in refs {
        match store.list("", Some(git_ref)).await {
            Ok(entries) => return Ok(entries),
            Err(e) if e.is_not_found() => {
                log::debug!("Root listing at ref {} not found: {}", git_ref, e);
            }
            Err(e) => return Err(AgentError::from_store("", e)),
        }
    }

    log::info!("Repository root has no entries yet");
    Ok(Vec::new())
}

/// Every file in the tree, depth first in listing order.
///
/// The walk is redone on every call. Directories that disappear while the
/// walk is in progress are skipped.
pub async fn list_recursive(store: &dyn FileStore) -> AgentResult<Vec<RemoteFileRecord>> {
    let mut pending: Vec<RemoteFileRecord> = list_root(store).await?;
    pending.reverse();

    let mut files = Vec::new();
    while let Some(entry) = pending.pop() {
        if !entry.is_dir() {
            files.push(entry);
            continue;
        }
        match store.list(&entry.path, None).await {
            Ok(children) => pending.extend(children.into_iter().rev()),
            Err(StoreError::NotFound(_)) => {
                log::debug!("Directory {} vanished during walk", entry.path);
            }
            Err(e) => return Err(AgentError::from_store(&entry.path, e)),
        }
    }
    Ok(files)
}
