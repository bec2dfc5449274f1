// Repo-Scribe: Command Handlers
// Store selection, tool execution and output rendering for the CLI

use crate::agents::{Agent, FileAgentSession, ToolCall, TOOLS};
use crate::config::ScribeConfig;
use crate::error::{AgentError, AgentResult};
use crate::ops::OperationOutcome;
use anyhow::Context;
use github_store::GitHubClient;
use repo_store::{FileStore, MemoryFileStore};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

/// GitHub by default; an in-memory mirror of `seed_dir` for dry runs.
pub fn open_store(config: &ScribeConfig, seed_dir: Option<&Path>) -> anyhow::Result<Arc<dyn FileStore>> {
    if let Some(dir) = seed_dir {
        let store = MemoryFileStore::from_dir(dir)
            .with_context(|| format!("Failed to seed store from {}", dir.display()))?;
        log::info!("Using in-memory store with {} files", store.file_count());
        return Ok(Arc::new(store));
    }
    let client = GitHubClient::new(config.github_config()?).context("Failed to create GitHub client")?;
    log::info!("Using GitHub repository {}", client.repo());
    Ok(Arc::new(client))
}

pub fn render_outcome(outcome: &OperationOutcome, json: bool) -> anyhow::Result<String> {
    if json {
        let value = serde_json::json!({ "ok": true, "outcome": outcome });
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    Ok(outcome.to_string())
}

pub fn render_error(err: &AgentError, json: bool) -> String {
    if json {
        let value = serde_json::json!({
            "ok": false,
            "error": err.kind(),
            "message": err.to_string(),
            "candidates": err.candidates(),
        });
        return serde_json::to_string_pretty(&value).unwrap_or_else(|_| err.to_string());
    }
    let mut text = format!("error[{}]: {}", err.kind(), err);
    for candidate in err.candidates() {
        text.push_str(&format!("\n  - {}", candidate));
    }
    text
}

/// Run one tool call and print its result. Returns whether it succeeded.
pub async fn run_exec<W: Write>(
    session: &FileAgentSession,
    call: &ToolCall,
    json: bool,
    out: &mut W,
) -> anyhow::Result<bool> {
    write_result(session.handle(call).await, json, out)
}

fn write_result<W: Write>(
    result: AgentResult<OperationOutcome>,
    json: bool,
    out: &mut W,
) -> anyhow::Result<bool> {
    match result {
        Ok(outcome) => {
            writeln!(out, "{}", render_outcome(&outcome, json)?.trim_end())?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "{}", render_error(&e, json))?;
            Ok(false)
        }
    }
}

/// One tool call per line. A line starting with `Action:` opens a ReAct
/// block that runs until the next blank line. Lines naming no known tool
/// are classified by keyword. Returns the failure count.
pub async fn run_shell<R: BufRead, W: Write>(
    session: &FileAgentSession,
    input: R,
    json: bool,
    out: &mut W,
) -> anyhow::Result<usize> {
    let mut failures = 0;
    let mut block: Vec<String> = Vec::new();

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        if !block.is_empty() {
            if line.trim().is_empty() {
                failures += run_text(session, &block.join("\n"), json, out).await?;
                block.clear();
            } else {
                block.push(line);
            }
            continue;
        }
        if line.trim_start().starts_with("Action:") {
            block.push(line);
        } else if !line.trim().is_empty() {
            failures += run_text(session, &line, json, out).await?;
        }
    }
    if !block.is_empty() {
        failures += run_text(session, &block.join("\n"), json, out).await?;
    }
    Ok(failures)
}

async fn run_text<W: Write>(
    session: &FileAgentSession,
    text: &str,
    json: bool,
    out: &mut W,
) -> anyhow::Result<usize> {
    let ok = write_result(session.handle_text(text).await, json, out)?;
    Ok(usize::from(!ok))
}

/// Tool catalog plus the system prompt handed to the upstream model.
pub fn render_tools(session: &FileAgentSession, json: bool) -> anyhow::Result<String> {
    if json {
        let value = serde_json::json!({
            "tools": TOOLS.iter().map(|t| serde_json::json!({
                "name": t.name(),
                "input": t.input,
                "description": t.description,
            })).collect::<Vec<_>>(),
            "system_prompt": session.system_prompt(),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    let mut text = String::new();
    for tool in TOOLS {
        text.push_str(&format!("{:<18} {:<28} {}\n", tool.name(), tool.input, tool.description));
    }
    text.push('\n');
    text.push_str(session.system_prompt());
    Ok(text)
}
