use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

/// One entry of the remote tree. `content` is only populated by a read.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RemoteFileRecord {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default)]
    pub revision_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RemoteFileRecord {
    pub fn file(path: &str, size: u64, revision_id: &str) -> Self {
        Self {
            path: path.to_string(),
            name: crate::util::basename(path).to_string(),
            entry_type: EntryType::File,
            size: Some(size),
            revision_id: revision_id.to_string(),
            content: None,
        }
    }

    pub fn dir(path: &str) -> Self {
        Self {
            path: path.to_string(),
            name: crate::util::basename(path).to_string(),
            entry_type: EntryType::Dir,
            size: None,
            revision_id: String::new(),
            content: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Dir
    }
}

/// Raw file payload as the store returns it. `content` may still be encoded;
/// `encoding` says how (`base64` for GitHub, `None` for plain text).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FileBlob {
    pub path: String,
    pub name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub revision_id: String,
    pub size: u64,
}

/// What a mutating call reports back.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WriteReceipt {
    /// New revision of the file, absent after a delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CodeSearchHit {
    pub path: String,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitInfo {
    pub revision_id: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RefInfo {
    pub name: String,
    pub revision_id: String,
}
