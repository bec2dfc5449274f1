// Repo-Scribe: Main Entry Point
// Runs file-agent tool calls against GitHub or a local in-memory mirror

use anyhow::Context;
use clap::{Parser, Subcommand};
use repo_scribe::agents::{FileAgentSession, ToolCall};
use repo_scribe::config::{ScribeConfig, ENV_TOKEN};
use repo_scribe::handlers;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "repo-scribe", version, about = "File-mutation agent core for GitHub repositories")]
struct Cli {
    /// Settings file (defaults to <config_dir>/repo-scribe/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository as https://github.com/<owner>/<repo> or <owner>/<repo>
    #[arg(long, global = true)]
    repo: Option<String>,

    /// GitHub token
    #[arg(long, global = true, env = ENV_TOKEN, hide_env_values = true)]
    token: Option<String>,

    /// Branch to read from and commit to
    #[arg(long, global = true)]
    branch: Option<String>,

    /// Serve operations from an in-memory copy of this directory instead of GitHub
    #[arg(long, global = true)]
    seed_dir: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single tool call, e.g. `exec read_file src/main.py`
    Exec {
        tool: String,
        /// Raw tool input; joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },
    /// Read tool calls from stdin, one per line or as ReAct blocks
    Shell,
    /// Check the token and repository permissions
    Validate,
    /// Print the tool catalog and the agent system prompt
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("REPO_SCRIBE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ScribeConfig::load(cli.config.as_deref())?;
    if cli.repo.is_some() {
        config.repo_url = cli.repo.clone();
    }
    if cli.token.is_some() {
        config.github_token = cli.token.clone();
    }
    if cli.branch.is_some() {
        config.branch = cli.branch.clone();
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Validate => {
            let report = handlers::validate_setup(&config).await;
            if cli.json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                print_report(&mut out, &report)?;
            }
            if !report.success {
                std::process::exit(1);
            }
        }
        Command::Tools => {
            let session = open_session(&config, &cli.seed_dir)?;
            writeln!(out, "{}", handlers::render_tools(&session, cli.json)?.trim_end())?;
        }
        Command::Exec { tool, input } => {
            let session = open_session(&config, &cli.seed_dir)?;
            let call = ToolCall::new(&tool, &input.join(" "));
            let ok = handlers::run_exec(&session, &call, cli.json, &mut out).await?;
            session.close();
            if !ok {
                std::process::exit(1);
            }
        }
        Command::Shell => {
            let session = open_session(&config, &cli.seed_dir)?;
            let stdin = std::io::stdin();
            let failures = handlers::run_shell(&session, stdin.lock(), cli.json, &mut out)
                .await
                .context("Shell session failed")?;
            let summary = session.close();
            tracing::info!(
                "Session {} finished: {} operations, {} failed",
                summary.id,
                summary.operations,
                failures
            );
        }
    }
    Ok(())
}

fn open_session(config: &ScribeConfig, seed_dir: &Option<PathBuf>) -> anyhow::Result<FileAgentSession> {
    let store = handlers::open_store(config, seed_dir.as_deref())?;
    Ok(FileAgentSession::open(store, config.session_options()))
}

fn print_report<W: Write>(out: &mut W, report: &handlers::SetupReport) -> anyhow::Result<()> {
    let mark = |ok: bool| if ok { "ok" } else { "no" };
    writeln!(out, "token:      {}", mark(report.token_valid))?;
    if let Some(user) = &report.user {
        writeln!(out, "user:       {}", user)?;
    }
    if let Some(repo) = &report.repository {
        writeln!(out, "repository: {} ({})", repo.full_name, repo.default_branch)?;
    }
    if let Some(ops) = &report.operations {
        writeln!(out, "read:       {}", mark(ops.read_contents))?;
        writeln!(out, "write:      {}", mark(ops.write_access))?;
        writeln!(out, "branch:     {}", mark(ops.create_branch))?;
    }
    if let Some(error) = &report.error {
        writeln!(out, "error:      {}", error)?;
    }
    for rec in &report.recommendations {
        writeln!(out, "  - {}", rec)?;
    }
    Ok(())
}
