// Repo-Scribe: The File Agent
// Per-conversation session that turns tool calls into dispatched file operations

use super::intent::{infer_call, ToolCall, TOOLS};
use super::Agent;
use crate::error::{AgentError, AgentResult};
use crate::ops::{
    extract, extract_branch, extract_single, CommitMessages, ContentRecovery, Dispatcher,
    ExtractMode, FileOperationRequest, OperationKind, OperationOutcome,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use repo_store::FileStore;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Knobs a session carries for its whole lifetime.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub content_recovery: ContentRecovery,
    /// Base for create_branch when the call names none
    pub default_base_branch: String,
    pub commit_messages: CommitMessages,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            content_recovery: ContentRecovery::default(),
            default_base_branch: "main".to_string(),
            commit_messages: CommitMessages::default(),
        }
    }
}

/// Returned by [`FileAgentSession::close`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub operations: usize,
    pub failures: usize,
}

/// Everything one conversation needs to run file operations: the store
/// handle and the dispatch options. Nothing is shared between sessions.
pub struct FileAgentSession {
    id: Uuid,
    opened_at: DateTime<Utc>,
    dispatcher: Dispatcher,
    options: SessionOptions,
    operations: AtomicUsize,
    failures: AtomicUsize,
}

impl FileAgentSession {
    pub fn open(store: Arc<dyn FileStore>, options: SessionOptions) -> Self {
        let id = Uuid::new_v4();
        log::info!(
            "Opened file agent session {} (content recovery: {})",
            id,
            options.content_recovery
        );
        Self {
            id,
            opened_at: Utc::now(),
            dispatcher: Dispatcher::new(store).with_messages(options.commit_messages.clone()),
            options,
            operations: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Build the validated request for `call` without touching the store.
    pub fn build_request(&self, call: &ToolCall) -> AgentResult<FileOperationRequest> {
        let input = call.input.as_str();
        match call.kind()? {
            OperationKind::List => FileOperationRequest::list(&extract_single(input)),
            OperationKind::Read => FileOperationRequest::read(&extract_single(input)),
            OperationKind::Delete => FileOperationRequest::delete(&extract_single(input)),
            OperationKind::History => FileOperationRequest::history(&extract_single(input)),
            OperationKind::Find => FileOperationRequest::find(&extract_single(input)),
            OperationKind::Search => FileOperationRequest::search(input),
            OperationKind::Create => {
                let args = extract(input, ExtractMode::Create, self.options.content_recovery)?;
                Ok(FileOperationRequest::create(&args.path, &args.content)?
                    .with_commit_message(args.commit_message))
            }
            OperationKind::Edit => {
                let args = extract(input, ExtractMode::Edit, self.options.content_recovery)?;
                Ok(FileOperationRequest::edit(&args.path, &args.content)?
                    .with_commit_message(args.commit_message))
            }
            OperationKind::CreateBranch => {
                let (name, base) = extract_branch(input, &self.options.default_base_branch)?;
                FileOperationRequest::create_branch(&name, &base)
            }
        }
    }

    pub async fn handle(&self, call: &ToolCall) -> AgentResult<OperationOutcome> {
        let request = match self.build_request(call) {
            Ok(request) => request,
            Err(e) => {
                self.record(false);
                return Err(e);
            }
        };
        self.execute(&request).await
    }

    /// Parse raw model output (a tool line or a ReAct block) and handle it.
    /// Text that names no known tool is classified by keyword instead.
    pub async fn handle_text(&self, text: &str) -> AgentResult<OperationOutcome> {
        match ToolCall::parse(text) {
            Some(call) if call.kind().is_err() => match infer_call(text) {
                Some(inferred) => self.handle(&inferred).await,
                None => self.handle(&call).await,
            },
            Some(call) => self.handle(&call).await,
            None => {
                self.record(false);
                Err(AgentError::parse(text, "no tool call found"))
            }
        }
    }

    pub async fn execute(&self, request: &FileOperationRequest) -> AgentResult<OperationOutcome> {
        let result = self.dispatcher.dispatch(request).await;
        if let Err(e) = &result {
            log::warn!("{} failed [{}]: {}", request.kind(), e.kind(), e);
        }
        self.record(result.is_ok());
        result
    }

    fn record(&self, ok: bool) {
        self.operations.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn close(self) -> SessionSummary {
        let summary = SessionSummary {
            id: self.id,
            opened_at: self.opened_at,
            closed_at: Utc::now(),
            operations: self.operations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        };
        log::info!(
            "Closed file agent session {} after {} operations ({} failed)",
            summary.id,
            summary.operations,
            summary.failures
        );
        summary
    }
}

static SYSTEM_PROMPT: Lazy<String> = Lazy::new(|| {
    let mut prompt = String::from(
        r#"You are the file agent for a GitHub repository. You change the repository only through tools.

Call exactly one tool per step, written as `<tool> <input>` on one line, or as a ReAct block:
Action: <tool>
Action Input: <input>

Input rules:
- create_file and edit_file take the path, a space, then the full file content.
- Single-path tools take the bare path with no quotes and no braces.
- Do not wrap arguments in JSON or dictionaries unless you emit valid JSON such as
  {"file_path": "a.py", "content": "print('hi')"}.
- create_file fails on an existing file; use edit_file to change it.

Tools:
"#,
    );
    for tool in TOOLS {
        prompt.push_str(&format!("- {} {}: {}\n", tool.name(), tool.input, tool.description));
    }
    prompt
});

impl Agent for FileAgentSession {
    fn name(&self) -> &str {
        "FileAgent"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT.as_str()
    }
}
