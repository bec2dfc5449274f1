// Repo-Scribe: Intent Classifier
// Turns model output into a ToolCall and a ToolCall into an OperationKind

use crate::error::{AgentError, AgentResult};
use crate::ops::OperationKind;
use serde::{Deserialize, Serialize};

/// Catalog entry shown to the upstream model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolSpec {
    pub kind: OperationKind,
    pub input: &'static str,
    pub description: &'static str,
}

impl ToolSpec {
    pub fn name(&self) -> &'static str {
        self.kind.tool_name()
    }
}

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        kind: OperationKind::List,
        input: "[path]",
        description: "List files and directories. An empty path lists the repository root.",
    },
    ToolSpec {
        kind: OperationKind::Read,
        input: "<file_path>",
        description: "Read a file. The path is matched case-insensitively.",
    },
    ToolSpec {
        kind: OperationKind::Create,
        input: "<file_path> <content>",
        description: "Create a new file. Fails if the file already exists.",
    },
    ToolSpec {
        kind: OperationKind::Edit,
        input: "<file_path> <new_content>",
        description: "Replace the whole content of an existing file.",
    },
    ToolSpec {
        kind: OperationKind::Delete,
        input: "<file_path>",
        description: "Delete a file.",
    },
    ToolSpec {
        kind: OperationKind::Search,
        input: "<query>",
        description: "Search file contents. Results are ranked by relevance.",
    },
    ToolSpec {
        kind: OperationKind::Find,
        input: "<file_name>",
        description: "Find files by name, ignoring case.",
    },
    ToolSpec {
        kind: OperationKind::History,
        input: "<file_path>",
        description: "Commit history of a file, newest first.",
    },
    ToolSpec {
        kind: OperationKind::CreateBranch,
        input: "<branch_name> [base_branch]",
        description: "Create a branch from the tip of the base branch (default main).",
    },
];

/// One tool invocation as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub input: String,
}

impl ToolCall {
    pub fn new(tool: &str, input: &str) -> Self {
        Self {
            tool: tool.trim().to_string(),
            input: input.to_string(),
        }
    }

    pub fn kind(&self) -> AgentResult<OperationKind> {
        OperationKind::from_tool_name(&self.tool)
            .ok_or_else(|| AgentError::UnknownTool(self.tool.clone()))
    }

    /// Accepts a ReAct block (`Action:` / `Action Input:`) or a single
    /// `<tool> <input>` line. Returns `None` for blank text.
    pub fn parse(text: &str) -> Option<Self> {
        parse_react(text).or_else(|| parse_line(text))
    }
}

fn parse_line(text: &str) -> Option<ToolCall> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.split_once(char::is_whitespace) {
        Some((tool, input)) => Some(ToolCall::new(tool.trim_end_matches(':'), input.trim_start())),
        None => Some(ToolCall::new(text.trim_end_matches(':'), "")),
    }
}

fn parse_react(text: &str) -> Option<ToolCall> {
    let mut tool = None;
    let mut input: Option<Vec<&str>> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("Action Input:") {
            input = Some(vec![rest.trim_start()]);
        } else if let Some(rest) = trimmed.strip_prefix("Action:") {
            tool = Some(rest.trim());
        } else if trimmed.starts_with("Observation:") {
            break;
        } else if let Some(lines) = input.as_mut() {
            lines.push(line);
        }
    }

    let tool = tool.filter(|t| !t.is_empty())?;
    let input = input.map(|lines| lines.join("\n")).unwrap_or_default();
    Some(ToolCall::new(tool, input.trim_end()))
}

/// Keyword classifier for free-text requests. More specific intents are
/// checked first so "show files" lists instead of reading.
pub fn classify_text(message: &str) -> Option<OperationKind> {
    let lower = message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .collect();
    let has = |candidates: &[&str]| candidates.iter().any(|c| words.contains(c));
    let phrase = |candidates: &[&str]| candidates.iter().any(|c| lower.contains(c));

    if has(&["history", "commits"]) {
        Some(OperationKind::History)
    } else if has(&["branch"]) {
        Some(OperationKind::CreateBranch)
    } else if has(&["delete", "remove"]) {
        Some(OperationKind::Delete)
    } else if has(&["edit", "update", "modify", "change", "replace"]) {
        Some(OperationKind::Edit)
    } else if has(&["create", "add", "new"]) {
        Some(OperationKind::Create)
    } else if has(&["list", "ls"]) || phrase(&["show files", "show all files"]) {
        Some(OperationKind::List)
    } else if has(&["find", "locate"]) {
        Some(OperationKind::Find)
    } else if has(&["search", "grep"]) || phrase(&["look for"]) {
        Some(OperationKind::Search)
    } else if has(&["read", "show", "open", "cat", "display", "view"]) {
        Some(OperationKind::Read)
    } else {
        None
    }
}

/// Free-text fallback for output that names no known tool. The intent comes
/// from [`classify_text`] and the argument from the first path-like token.
/// Create and Edit are never inferred.
pub fn infer_call(text: &str) -> Option<ToolCall> {
    let kind = classify_text(text)?;
    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, ',' | '?' | '!' | ';' | '"' | '\'' | '`')))
        .filter(|w| !w.is_empty())
        .collect();
    let path_like = words
        .iter()
        .copied()
        .find(|w| w.contains('.') || w.contains('/'))
        .map(|w| w.trim_end_matches('.'));
    // Markers are tried in order, so "search for x" keys off "for".
    let after = |markers: &[&str]| {
        markers.iter().find_map(|m| {
            words
                .iter()
                .position(|w| w.eq_ignore_ascii_case(m))
                .map(|i| words[i + 1..].join(" "))
                .filter(|rest| !rest.is_empty())
        })
    };

    let input = match kind {
        OperationKind::Create | OperationKind::Edit => return None,
        OperationKind::List => path_like.unwrap_or("").to_string(),
        OperationKind::Read | OperationKind::Delete | OperationKind::History => {
            path_like?.to_string()
        }
        OperationKind::Find => path_like
            .map(str::to_string)
            .or_else(|| words.last().map(|w| w.to_string()))?,
        OperationKind::Search => after(&["for", "search", "grep"])?,
        OperationKind::CreateBranch => {
            let rest = after(&["called", "named", "branch"])?;
            rest.split_whitespace().next()?.to_string()
        }
    };
    log::debug!("Inferred {} {:?} from free text", kind, input);
    Some(ToolCall::new(kind.tool_name(), &input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_line() {
        let call = ToolCall::parse("create_file bye.py print('hi')").unwrap();
        assert_eq!(call.tool, "create_file");
        assert_eq!(call.input, "bye.py print('hi')");
        assert_eq!(call.kind().unwrap(), OperationKind::Create);

        let call = ToolCall::parse("list_files").unwrap();
        assert_eq!(call.input, "");
        assert!(ToolCall::parse("   ").is_none());
    }

    #[test]
    fn test_parse_react_block() {
        let text = "Thought: I should create the file\nAction: create_file\nAction Input: notes.md content: # Notes\nhello\nObservation: pending";
        let call = ToolCall::parse(text).unwrap();
        assert_eq!(call.kind().unwrap(), OperationKind::Create);
        assert_eq!(call.input, "notes.md content: # Notes\nhello");
    }

    #[test]
    fn test_unknown_tool() {
        let err = ToolCall::new("format_disk", "/").kind().unwrap_err();
        assert_eq!(err.kind(), "unknown_tool");
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(classify_text("edit README.md with new content: hi"), Some(OperationKind::Edit));
        assert_eq!(classify_text("create a file called bye.py"), Some(OperationKind::Create));
        assert_eq!(classify_text("please remove hello.py"), Some(OperationKind::Delete));
        assert_eq!(classify_text("show files in src"), Some(OperationKind::List));
        assert_eq!(classify_text("show me main.py"), Some(OperationKind::Read));
        assert_eq!(classify_text("find readme"), Some(OperationKind::Find));
        assert_eq!(classify_text("look for the login function"), Some(OperationKind::Search));
        assert_eq!(classify_text("get the history of app.py"), Some(OperationKind::History));
        assert_eq!(classify_text("create a branch called feature"), Some(OperationKind::CreateBranch));
        assert_eq!(classify_text("hello there"), None);
    }

    #[test]
    fn test_infer_call_from_free_text() {
        assert_eq!(
            infer_call("please show me README.md?"),
            Some(ToolCall::new("read_file", "README.md"))
        );
        assert_eq!(
            infer_call("remove the file src/old.py."),
            Some(ToolCall::new("delete_file", "src/old.py"))
        );
        assert_eq!(
            infer_call("search for login handler"),
            Some(ToolCall::new("search_files", "login handler"))
        );
        assert_eq!(
            infer_call("create a branch called feature/x from main"),
            Some(ToolCall::new("create_branch", "feature/x"))
        );
        assert_eq!(infer_call("list everything"), Some(ToolCall::new("list_files", "")));
        assert_eq!(infer_call("find readme"), Some(ToolCall::new("find_file", "readme")));
        assert_eq!(infer_call("create a file called bye.py"), None);
        assert_eq!(infer_call("read something"), None);
        assert_eq!(infer_call("hello there"), None);
    }

    #[test]
    fn test_catalog_covers_every_kind() {
        for kind in OperationKind::ALL {
            assert!(TOOLS.iter().any(|t| t.kind == kind), "{} missing", kind);
        }
    }
}
