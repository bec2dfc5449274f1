// Repo-Scribe: File Operations
// Normalizer, resolver, extractor and dispatcher over a FileStore

pub mod dispatcher;
pub mod extract;
pub mod listing;
pub mod normalize;
pub mod outcome;
pub mod request;
pub mod resolver;

// Re-exports
pub use dispatcher::{CommitMessages, Dispatcher};
pub use extract::{extract, extract_branch, extract_single, ContentRecovery, ExtractMode, ExtractedArgs, InputShape};
pub use listing::{list_recursive, list_root};
pub use normalize::{normalize, normalize_dir, normalize_path};
pub use outcome::{BranchInfo, OperationOutcome, OperationResult};
pub use request::{FileOperationRequest, OperationKind};
pub use resolver::{resolve, resolve_for_write, MAX_CANDIDATES};
