// Repo-Scribe: Case-Insensitive Resolver
// Maps a model-supplied path onto the real path in the remote tree

use super::listing::list_recursive;
use crate::error::{AgentError, AgentResult};
use repo_store::util::basename;
use repo_store::{FileStore, RemoteFileRecord};

/// Suggestions carried by an ambiguous-path failure.
pub const MAX_CANDIDATES: usize = 5;

/// Stems sharing at least this many leading characters (and an extension)
/// are treated as related names.
const SHARED_PREFIX_MIN: usize = 3;

/// Find the real path for `path`.
///
/// Resolution order: exact probe, case-insensitive full path, then
/// case-insensitive basename. The first match in listing order wins. If
/// nothing matches exactly, related basenames are offered as suggestions
/// through [`AgentError::AmbiguousPath`] and never picked automatically.
/// `Ok(None)` means no candidate exists at all.
pub async fn resolve(store: &dyn FileStore, path: &str) -> AgentResult<Option<String>> {
    resolve_with(store, path, true).await
}

/// Like [`resolve`], but a file with the same name in another directory is
/// only ever suggested. Edit and delete go through here so they never touch
/// a file the caller did not name.
pub async fn resolve_for_write(store: &dyn FileStore, path: &str) -> AgentResult<Option<String>> {
    resolve_with(store, path, false).await
}

async fn resolve_with(
    store: &dyn FileStore,
    path: &str,
    match_basename: bool,
) -> AgentResult<Option<String>> {
    match store.get(path).await {
        Ok(_) => return Ok(Some(path.to_string())),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(AgentError::from_store(path, e)),
    }

    let files = list_recursive(store).await?;
    let wanted = path.to_lowercase();

    if let Some(hit) = files.iter().find(|f| f.path.to_lowercase() == wanted) {
        log::info!("Resolved {} to {} (case-insensitive path)", path, hit.path);
        return Ok(Some(hit.path.clone()));
    }

    let wanted_name = basename(&wanted);
    let same_name: Vec<&RemoteFileRecord> = files
        .iter()
        .filter(|f| basename(&f.path).to_lowercase() == wanted_name)
        .collect();
    if let Some(hit) = same_name.first() {
        if match_basename {
            log::info!("Resolved {} to {} (case-insensitive name)", path, hit.path);
            return Ok(Some(hit.path.clone()));
        }
        return Err(AgentError::AmbiguousPath {
            path: path.to_string(),
            candidates: same_name
                .iter()
                .take(MAX_CANDIDATES)
                .map(|f| f.path.clone())
                .collect(),
        });
    }

    let candidates: Vec<String> = files
        .iter()
        .filter(|f| related_names(wanted_name, &basename(&f.path).to_lowercase()))
        .take(MAX_CANDIDATES)
        .map(|f| f.path.clone())
        .collect();

    if candidates.is_empty() {
        Ok(None)
    } else {
        Err(AgentError::AmbiguousPath {
            path: path.to_string(),
            candidates,
        })
    }
}

/// Substring family on lowercase basenames. Beyond plain containment in
/// either direction, separator-free stems (`gitrepo` ~ `git_repo`) and stems
/// with a shared leading run under the same extension count as related.
pub(crate) fn related_names(target: &str, candidate: &str) -> bool {
    if target.is_empty() || candidate.is_empty() {
        return false;
    }
    if candidate.contains(target) || target.contains(candidate) {
        return true;
    }

    let (target_stem, target_ext) = split_extension(target);
    let (candidate_stem, candidate_ext) = split_extension(candidate);
    let target_stem = squash(target_stem);
    let candidate_stem = squash(candidate_stem);
    if target_stem.is_empty() || candidate_stem.is_empty() {
        return false;
    }
    if candidate_stem.contains(&target_stem) || target_stem.contains(&candidate_stem) {
        return true;
    }

    target_ext == candidate_ext && shared_prefix(&target_stem, &candidate_stem) >= SHARED_PREFIX_MIN
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx + 1..]),
        _ => (name, ""),
    }
}

fn squash(stem: &str) -> String {
    stem.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn shared_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
