// Repo-Scribe: Operation Requests
// Closed set of operations and the validated request that carries one

use super::normalize::{normalize, normalize_dir, normalize_path};
use crate::error::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every operation the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    List,
    Read,
    Create,
    Edit,
    Delete,
    Search,
    Find,
    History,
    CreateBranch,
}

impl OperationKind {
    pub const ALL: [OperationKind; 9] = [
        OperationKind::List,
        OperationKind::Read,
        OperationKind::Create,
        OperationKind::Edit,
        OperationKind::Delete,
        OperationKind::Search,
        OperationKind::Find,
        OperationKind::History,
        OperationKind::CreateBranch,
    ];

    /// Tool name exposed to the upstream model.
    pub fn tool_name(self) -> &'static str {
        match self {
            OperationKind::List => "list_files",
            OperationKind::Read => "read_file",
            OperationKind::Create => "create_file",
            OperationKind::Edit => "edit_file",
            OperationKind::Delete => "delete_file",
            OperationKind::Search => "search_files",
            OperationKind::Find => "find_file",
            OperationKind::History => "get_file_history",
            OperationKind::CreateBranch => "create_branch",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_end_matches(':').to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.tool_name() == name)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// A single validated file operation.
///
/// Only the constructors below can build one, so `content` is always present
/// and non-empty for Create/Edit and `path` is non-empty for every kind except
/// List. For Search the `path` slot holds the query, for Find the file name
/// and for CreateBranch the new branch name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOperationRequest {
    kind: OperationKind,
    path: String,
    content: Option<String>,
    commit_message: Option<String>,
    base_ref: Option<String>,
    if_match: Option<String>,
}

impl FileOperationRequest {
    fn new(kind: OperationKind, path: String) -> Self {
        Self {
            kind,
            path,
            content: None,
            commit_message: None,
            base_ref: None,
            if_match: None,
        }
    }

    pub fn list(dir: &str) -> AgentResult<Self> {
        Ok(Self::new(OperationKind::List, normalize_dir(Some(dir))?))
    }

    pub fn read(path: &str) -> AgentResult<Self> {
        Ok(Self::new(OperationKind::Read, normalize_path(Some(path))?))
    }

    pub fn create(path: &str, content: &str) -> AgentResult<Self> {
        Self::with_body(OperationKind::Create, path, content)
    }

    pub fn edit(path: &str, content: &str) -> AgentResult<Self> {
        Self::with_body(OperationKind::Edit, path, content)
    }

    pub fn delete(path: &str) -> AgentResult<Self> {
        Ok(Self::new(OperationKind::Delete, normalize_path(Some(path))?))
    }

    pub fn search(query: &str) -> AgentResult<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::parse(query, "search_files requires a query"));
        }
        Ok(Self::new(OperationKind::Search, query.to_string()))
    }

    pub fn find(name: &str) -> AgentResult<Self> {
        let name = normalize(Some(name));
        if name.is_empty() {
            return Err(AgentError::parse(&name, "find_file requires a file name"));
        }
        Ok(Self::new(OperationKind::Find, name))
    }

    pub fn history(path: &str) -> AgentResult<Self> {
        Ok(Self::new(OperationKind::History, normalize_path(Some(path))?))
    }

    pub fn create_branch(name: &str, base: &str) -> AgentResult<Self> {
        let name = normalize(Some(name));
        let base = normalize(Some(base));
        if name.is_empty() || base.is_empty() {
            return Err(AgentError::parse(
                &format!("{} {}", name, base),
                "create_branch requires a branch name and a base branch",
            ));
        }
        let mut request = Self::new(OperationKind::CreateBranch, name);
        request.base_ref = Some(base);
        Ok(request)
    }

    fn with_body(kind: OperationKind, path: &str, content: &str) -> AgentResult<Self> {
        let path = normalize_path(Some(path))?;
        if content.trim().is_empty() {
            return Err(AgentError::parse(
                &path,
                format!("{} requires non-empty content", kind),
            ));
        }
        let mut request = Self::new(kind, path);
        request.content = Some(content.to_string());
        Ok(request)
    }

    pub fn with_commit_message(mut self, message: Option<String>) -> Self {
        self.commit_message = message.filter(|m| !m.trim().is_empty());
        self
    }

    /// Pin the revision an Edit expects to overwrite.
    pub fn with_if_match(mut self, revision_id: Option<String>) -> Self {
        self.if_match = revision_id;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn commit_message(&self) -> Option<&str> {
        self.commit_message.as_deref()
    }

    pub fn base_ref(&self) -> Option<&str> {
        self.base_ref.as_deref()
    }

    pub fn if_match(&self) -> Option<&str> {
        self.if_match.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_names_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_tool_name(kind.tool_name()), Some(kind));
        }
        assert_eq!(OperationKind::from_tool_name(" Create_File "), Some(OperationKind::Create));
        assert_eq!(OperationKind::from_tool_name("rm_rf"), None);
    }

    #[test]
    fn test_body_required_for_create_and_edit() {
        assert!(matches!(
            FileOperationRequest::create("a.py", "   "),
            Err(AgentError::ArgumentParse { .. })
        ));
        assert!(matches!(
            FileOperationRequest::edit("'{'", "x = 1"),
            Err(AgentError::InvalidPath(_))
        ));
        let request = FileOperationRequest::edit("'a.py'", "x = 1").unwrap();
        assert_eq!(request.path(), "a.py");
        assert_eq!(request.content(), Some("x = 1"));
        assert_eq!(request.kind(), OperationKind::Edit);
    }

    #[test]
    fn test_path_rules_per_kind() {
        assert_eq!(FileOperationRequest::list("").unwrap().path(), "");
        assert!(FileOperationRequest::read("").is_err());
        assert!(FileOperationRequest::delete("github.com").is_err());
        assert!(FileOperationRequest::search("  ").is_err());
        assert_eq!(FileOperationRequest::find("'readme'").unwrap().path(), "readme");

        let branch = FileOperationRequest::create_branch("feature/x", "main").unwrap();
        assert_eq!(branch.path(), "feature/x");
        assert_eq!(branch.base_ref(), Some("main"));
    }

    #[test]
    fn test_blank_commit_message_is_dropped() {
        let request = FileOperationRequest::delete("a.py")
            .unwrap()
            .with_commit_message(Some("  ".into()));
        assert_eq!(request.commit_message(), None);
    }
}
