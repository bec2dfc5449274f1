// Repo-Scribe: CLI Handlers

pub mod exec;
pub mod validate;

pub use exec::{open_store, render_error, render_outcome, render_tools, run_exec, run_shell};
pub use validate::{validate_setup, OperationChecks, RepoAccess, SetupReport};
