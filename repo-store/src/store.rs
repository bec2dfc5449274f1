use crate::error::StoreResult;
use crate::models::{CodeSearchHit, CommitInfo, FileBlob, RefInfo, RemoteFileRecord, WriteReceipt};
use async_trait::async_trait;

/// Contract of the hosted version-controlled file store.
///
/// Paths are repository-relative with `/` separators. The store owns
/// conflict detection: `update` and `delete` must reject a stale
/// `expected_revision_id` with [`crate::StoreError::Conflict`].
#[async_trait]
pub trait FileStore: Send + Sync {
    /// One level of the tree. `git_ref` selects a branch; `None` means the
    /// store's default.
    async fn list(&self, path: &str, git_ref: Option<&str>) -> StoreResult<Vec<RemoteFileRecord>>;

    async fn get(&self, path: &str) -> StoreResult<FileBlob>;

    async fn create(&self, path: &str, content: &str, message: &str) -> StoreResult<WriteReceipt>;

    async fn update(
        &self,
        path: &str,
        content: &str,
        message: &str,
        expected_revision_id: &str,
    ) -> StoreResult<WriteReceipt>;

    async fn delete(
        &self,
        path: &str,
        message: &str,
        expected_revision_id: &str,
    ) -> StoreResult<WriteReceipt>;

    async fn search_code(&self, query: &str) -> StoreResult<Vec<CodeSearchHit>>;

    /// Commits touching `path`, newest first.
    async fn commit_history(&self, path: &str) -> StoreResult<Vec<CommitInfo>>;

    async fn get_ref(&self, name: &str) -> StoreResult<RefInfo>;

    async fn create_ref(&self, name: &str, revision_id: &str) -> StoreResult<RefInfo>;

    async fn default_branch(&self) -> StoreResult<String>;
}
