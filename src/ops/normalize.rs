// Repo-Scribe: Path Normalizer
// Strips stray quoting and whitespace from model-produced paths

use crate::error::{AgentError, AgentResult};

const QUOTES: &[char] = &['"', '\''];

/// Tokens models emit in place of a path. Compared case-insensitively.
const DENYLIST: &[&str] = &["github", "github.com", "docs", "docs.github"];

/// Trim whitespace and surrounding quotes until nothing changes.
/// `None`, blank and quote-only input collapse to `""`.
pub fn normalize(raw: Option<&str>) -> String {
    let mut current = raw.unwrap_or("");
    loop {
        let next = current.trim().trim_matches(QUOTES);
        if next.len() == current.len() {
            return next.to_string();
        }
        current = next;
    }
}

/// Normalize a file path and reject values that cannot name a file.
pub fn normalize_path(raw: Option<&str>) -> AgentResult<String> {
    let path = normalize(raw);
    if is_denied(&path) {
        return Err(AgentError::InvalidPath(path));
    }
    Ok(path)
}

/// Directory variant used by List: blank, `/` and `.` all mean the root.
pub fn normalize_dir(raw: Option<&str>) -> AgentResult<String> {
    let dir = normalize(raw);
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        return Ok(String::new());
    }
    if is_denied(dir) {
        return Err(AgentError::InvalidPath(dir.to_string()));
    }
    Ok(dir.to_string())
}

fn is_denied(path: &str) -> bool {
    path.is_empty()
        || path == "{"
        || path == "}"
        || DENYLIST.iter().any(|d| path.eq_ignore_ascii_case(d))
}
