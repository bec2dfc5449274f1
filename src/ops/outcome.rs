// Repo-Scribe: Operation Outcomes
// What a dispatched operation hands back, in serializable and printable form

use repo_store::{CodeSearchHit, CommitInfo, RemoteFileRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub applied_path: String,
    /// New file revision; `None` after a delete.
    pub revision_id: Option<String>,
    pub commit_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub base: String,
    pub revision_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OperationOutcome {
    Listing(Vec<RemoteFileRecord>),
    File(RemoteFileRecord),
    Applied(OperationResult),
    SearchHits(Vec<CodeSearchHit>),
    Matches(Vec<RemoteFileRecord>),
    History(Vec<CommitInfo>),
    Branch(BranchInfo),
}

fn short(revision: &str) -> &str {
    revision.get(..7).unwrap_or(revision)
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Listing(entries) | OperationOutcome::Matches(entries) => {
                if entries.is_empty() {
                    return writeln!(f, "(no entries)");
                }
                for entry in entries {
                    if entry.is_dir() {
                        writeln!(f, "{}/", entry.path)?;
                    } else {
                        match entry.size {
                            Some(size) => writeln!(f, "{} ({} bytes)", entry.path, size)?,
                            None => writeln!(f, "{}", entry.path)?,
                        }
                    }
                }
                Ok(())
            }
            OperationOutcome::File(record) => {
                writeln!(f, "{} @ {}", record.path, short(&record.revision_id))?;
                writeln!(f, "{}", record.content.as_deref().unwrap_or(""))
            }
            OperationOutcome::Applied(result) => {
                write!(f, "{}", result.message)?;
                if let Some(rev) = &result.revision_id {
                    write!(f, " (revision {})", short(rev))?;
                }
                if let Some(commit) = &result.commit_id {
                    write!(f, " [commit {}]", short(commit))?;
                }
                writeln!(f)
            }
            OperationOutcome::SearchHits(hits) => {
                if hits.is_empty() {
                    return writeln!(f, "(no matches)");
                }
                for hit in hits {
                    writeln!(f, "{:>8.3}  {}", hit.score, hit.path)?;
                }
                Ok(())
            }
            OperationOutcome::History(commits) => {
                if commits.is_empty() {
                    return writeln!(f, "(no history)");
                }
                for commit in commits {
                    writeln!(
                        f,
                        "{} {} {} {}",
                        short(&commit.revision_id),
                        commit.timestamp.format("%Y-%m-%d %H:%M"),
                        commit.author,
                        commit.message.lines().next().unwrap_or("")
                    )?;
                }
                Ok(())
            }
            OperationOutcome::Branch(branch) => writeln!(
                f,
                "Created branch {} from {} at {}",
                branch.name,
                branch.base,
                short(&branch.revision_id)
            ),
        }
    }
}
