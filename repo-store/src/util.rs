use crate::error::{StoreError, StoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Last path segment. `"a/b/c.py"` -> `"c.py"`, `""` -> `""`.
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Content-addressed revision id: sha-256 over a git-style blob header.
pub fn content_revision(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", content.len()).as_bytes());
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Commit id derived from its parent, the touched path, the message and a
/// monotonically increasing sequence number.
pub fn commit_revision(parent: Option<&str>, path: &str, message: &str, seq: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(parent.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(path.as_bytes());
    hasher.update(b"|");
    hasher.update(message.as_bytes());
    hasher.update(b"|");
    hasher.update(seq.to_be_bytes());
    hex::encode(hasher.finalize())
}

pub fn encode_base64(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

/// Decode a blob body according to its declared encoding. Base64 payloads
/// are wrapped at 60 columns by GitHub, so whitespace is dropped first;
/// every other encoding is passed through untouched.
pub fn decode_content(content: &str, encoding: Option<&str>) -> StoreResult<String> {
    match encoding {
        Some(enc) if enc.eq_ignore_ascii_case("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD
                .decode(compact.as_bytes())
                .map_err(|e| StoreError::Decode(format!("invalid base64 content: {}", e)))?;
            String::from_utf8(bytes)
                .map_err(|e| StoreError::Decode(format!("content is not UTF-8: {}", e)))
        }
        _ => Ok(content.to_string()),
    }
}
