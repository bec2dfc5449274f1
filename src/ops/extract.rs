// Repo-Scribe: Argument Extractor
// Recovers (file_path, content) from loosely formatted model output
//
// Shapes are tried strictest first:
//   0. JSON object                {"file_path": "a.py", "content": "x=1"}
//   1. brace-key                  {file_path: 'a.py', content: 'x=1'
//   2. quoted dict                {'file_path': 'a.py', 'content': 'x=1'}
//   3. inline keyword             a.py content: x=1
//   4. bare brace                 {a.py: x=1}
//   5. plain                      a.py x=1

use super::normalize::{normalize, normalize_path};
use crate::error::{AgentError, AgentResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PATH_KEYS: &[&str] = &["file_path", "path", "filename", "file_name"];
const MESSAGE_KEYS: &[&str] = &["commit_message", "message"];

/// Fragments that mark a span as source code during recovery.
const CODE_TOKENS: &[&str] = &["def ", "import ", "print(", "return "];

/// Content shorter than this is treated as a parsing accident.
const MIN_CONTENT_CHARS: usize = 5;

const PLACEHOLDER_CONTENT: &str = "# Placeholder written by repo-scribe.\n# The requested content could not be recovered; replace this file body.\n";

static PATH_KEY_RE: Lazy<Regex> = Lazy::new(|| key_regex(PATH_KEYS));
static MESSAGE_KEY_RE: Lazy<Regex> = Lazy::new(|| key_regex(MESSAGE_KEYS));
static CONTENT_KEY_RE: Lazy<Regex> = Lazy::new(|| key_regex(&["content"]));
static NEW_CONTENT_KEY_RE: Lazy<Regex> = Lazy::new(|| key_regex(&["new_content"]));
static QUOTED_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"));
static CONTENT_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)content\s*:\s*([^,}]+)").expect("static regex"));

/// Matches `key:`, `'key':` or `"key":` where the key is not the tail of a
/// longer identifier.
fn key_regex(keys: &[&str]) -> Regex {
    let alternatives = keys.join("|");
    Regex::new(&format!(r#"(?:^|[^\w'"])['"]?(?:{})['"]?\s*:"#, alternatives))
        .expect("key pattern is built from static identifiers")
}

/// What happens when the extracted content looks like a parsing accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRecovery {
    /// Never run the recovery chain. Short content such as `x=1` is kept;
    /// empty content or a stray quote or brace is rejected.
    Strict,
    /// Run the recovery chain and keep the original content if it finds nothing usable.
    #[default]
    Recover,
    /// Like `Recover`, but Create falls back to a placeholder body.
    Synthesize,
}

impl FromStr for ContentRecovery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "recover" => Ok(Self::Recover),
            "synthesize" => Ok(Self::Synthesize),
            other => Err(format!(
                "unknown content recovery policy {:?} (expected strict, recover or synthesize)",
                other
            )),
        }
    }
}

impl fmt::Display for ContentRecovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Recover => "recover",
            Self::Synthesize => "synthesize",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Create,
    Edit,
}

impl ExtractMode {
    fn content_key(self) -> &'static Regex {
        match self {
            ExtractMode::Create => &CONTENT_KEY_RE,
            ExtractMode::Edit => &NEW_CONTENT_KEY_RE,
        }
    }

    fn other_content_key(self) -> &'static Regex {
        match self {
            ExtractMode::Create => &NEW_CONTENT_KEY_RE,
            ExtractMode::Edit => &CONTENT_KEY_RE,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            ExtractMode::Create => " content: ",
            ExtractMode::Edit => " new_content: ",
        }
    }

    fn json_keys(self) -> [&'static str; 2] {
        match self {
            ExtractMode::Create => ["content", "new_content"],
            ExtractMode::Edit => ["new_content", "content"],
        }
    }
}

/// Which grammar rule produced the arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShape {
    Json,
    BraceKey,
    QuotedDict,
    InlineKeyword,
    BareBrace,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArgs {
    pub path: String,
    pub content: String,
    pub commit_message: Option<String>,
    pub shape: InputShape,
    /// Set when the content came from the recovery chain instead of the shape.
    pub recovered: bool,
}

struct RawArgs {
    path: String,
    content: String,
    commit_message: Option<String>,
    shape: InputShape,
}

/// Extract `(path, content)` for Create or Edit.
pub fn extract(input: &str, mode: ExtractMode, policy: ContentRecovery) -> AgentResult<ExtractedArgs> {
    let raw = parse_shapes(input, mode)?;
    log::debug!("Parsed {:?} input as {:?}", mode, raw.shape);

    let path = normalize_path(Some(&raw.path))?;
    let content = clean_content(&raw.content);

    let mut args = ExtractedArgs {
        path,
        content,
        commit_message: raw.commit_message.map(|m| clean_content(&m)).filter(|m| !m.is_empty()),
        shape: raw.shape,
        recovered: false,
    };

    if !is_degenerate(&args.content) {
        return Ok(args);
    }

    if policy == ContentRecovery::Strict {
        return keep_content(input, args);
    }

    log::debug!("Content {:?} looks malformed, trying recovery", args.content);
    if let Some(recovered) = recover_content(input, &args.path) {
        args.content = recovered;
        args.recovered = true;
        return Ok(args);
    }

    if policy == ContentRecovery::Synthesize && mode == ExtractMode::Create {
        log::warn!("Writing placeholder content for {}", args.path);
        args.content = PLACEHOLDER_CONTENT.to_string();
        args.recovered = true;
        return Ok(args);
    }

    keep_content(input, args)
}

/// Short content is kept as written; only nothing or stray punctuation fails.
fn keep_content(input: &str, args: ExtractedArgs) -> AgentResult<ExtractedArgs> {
    if args.content.is_empty() || is_lone_punctuation(&args.content) {
        return Err(AgentError::parse(input, "no usable content found"));
    }
    Ok(args)
}

/// Single-argument tools: unwrap `{file_path: 'x'}` style wrappers, else take
/// the whole string. The result is normalized but not validated.
pub fn extract_single(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(path) = json_string(&map, PATH_KEYS) {
                return normalize(Some(&path));
            }
        }
        if let Some((path, _)) = keyed_value(trimmed, &PATH_KEY_RE, 0, false) {
            return normalize(Some(&path));
        }
        return normalize(Some(trimmed.trim_start_matches('{').trim_end_matches('}')));
    }
    normalize(Some(trimmed))
}

/// `"<new> [<base>]"`, base falling back to `default_base`.
pub fn extract_branch(input: &str, default_base: &str) -> AgentResult<(String, String)> {
    let mut parts = input.split_whitespace();
    let name = normalize(parts.next());
    if name.is_empty() {
        return Err(AgentError::parse(input, "create_branch requires a branch name"));
    }
    let base = match parts.next().map(|p| normalize(Some(p))) {
        Some(base) if !base.is_empty() => base,
        _ => default_base.to_string(),
    };
    Ok((name, base))
}

fn parse_shapes(input: &str, mode: ExtractMode) -> AgentResult<RawArgs> {
    let cleaned = input.trim();
    if cleaned.is_empty() {
        return Err(AgentError::parse(input, "empty input"));
    }

    if cleaned.starts_with('{') {
        if let Some(args) = parse_json(cleaned, mode) {
            return Ok(args);
        }
        if let Some(args) = parse_keyed(cleaned, mode) {
            return Ok(args);
        }
    }

    // `{a.py content: x}` carries no path key; the braces are only a wrapper.
    let inline = match cleaned.strip_prefix('{') {
        Some(inner) => inner.strip_suffix('}').unwrap_or(inner),
        None => cleaned,
    };
    if let Some((path, content)) = inline.split_once(mode.separator()) {
        return Ok(RawArgs {
            path: path.to_string(),
            content: content.to_string(),
            commit_message: None,
            shape: InputShape::InlineKeyword,
        });
    }

    if cleaned.len() > 1 && cleaned.starts_with('{') && cleaned.ends_with('}') {
        let inner = cleaned[1..cleaned.len() - 1].trim();
        return match inner.split_once(':') {
            Some((path, content)) => Ok(RawArgs {
                path: path.to_string(),
                content: content.to_string(),
                commit_message: None,
                shape: InputShape::BareBrace,
            }),
            None => Err(AgentError::parse(input, "brace-wrapped input has no path/content separator")),
        };
    }

    // An unbalanced brace is debris from a half-emitted dict.
    let plain = if cleaned.starts_with('{') {
        &cleaned[1..]
    } else if cleaned.ends_with('}') {
        &cleaned[..cleaned.len() - 1]
    } else {
        cleaned
    };
    let plain = plain.trim();
    match plain.split_once(char::is_whitespace) {
        Some((path, content)) => Ok(RawArgs {
            path: path.to_string(),
            content: content.trim_start().to_string(),
            commit_message: None,
            shape: InputShape::Plain,
        }),
        None => Err(AgentError::parse(input, "expected a file path followed by content")),
    }
}

fn parse_json(input: &str, mode: ExtractMode) -> Option<RawArgs> {
    let serde_json::Value::Object(map) = serde_json::from_str::<serde_json::Value>(input).ok()? else {
        return None;
    };
    let path = json_string(&map, PATH_KEYS)?;
    let content = json_string(&map, &mode.json_keys())?;
    Some(RawArgs {
        path,
        content,
        commit_message: json_string(&map, MESSAGE_KEYS),
        shape: InputShape::Json,
    })
}

fn json_string(map: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(|v| v.as_str()).map(str::to_string))
}

/// Brace-key and quoted-dict forms share one scanner; the shape is decided by
/// whether the path key itself is quoted.
fn parse_keyed(input: &str, mode: ExtractMode) -> Option<RawArgs> {
    let key_match = PATH_KEY_RE.find(input)?;
    let quoted_key = input[key_match.start()..key_match.end()].contains(|c: char| c == '\'' || c == '"');
    let (path, path_end) = keyed_value(input, &PATH_KEY_RE, 0, false)?;

    let (content, content_end) = keyed_value(input, mode.content_key(), path_end, true)
        .or_else(|| keyed_value(input, mode.content_key(), 0, true))
        .or_else(|| keyed_value(input, mode.other_content_key(), 0, true))?;

    let commit_message = keyed_value(input, &MESSAGE_KEY_RE, content_end, false)
        .or_else(|| keyed_value(&input[..key_match.start()], &MESSAGE_KEY_RE, 0, false))
        .map(|(m, _)| m);

    Some(RawArgs {
        path,
        content,
        commit_message,
        shape: if quoted_key {
            InputShape::QuotedDict
        } else {
            InputShape::BraceKey
        },
    })
}

/// Find `key` at or after `from` and read its value. Returns the value and
/// the byte offset just past it.
fn keyed_value(input: &str, key: &Regex, from: usize, trailing: bool) -> Option<(String, usize)> {
    let m = key.find_at(input, from)?;
    read_value(input, m.end(), trailing)
}

/// Read a quoted or bare value starting at `start`.
///
/// Quoted values honour backslash escapes. A quote only closes the value when
/// it is followed by `,`, `}` or the end of input, so `'print('hi')'`
/// survives intact. A missing closing quote runs to the end. Bare values stop
/// at `,` or `}` unless `trailing` is set, in which case they run to the end
/// of input minus a closing brace.
fn read_value(input: &str, start: usize, trailing: bool) -> Option<(String, usize)> {
    let rest = &input[start..];
    let offset = rest.len() - rest.trim_start().len();
    let rest = rest.trim_start();
    let value_start = start + offset;

    let mut chars = rest.char_indices();
    let quote = match rest.chars().next() {
        Some(q @ ('\'' | '"')) => {
            chars.next();
            q
        }
        Some(_) => {
            let end = if trailing {
                rest.trim_end().trim_end_matches('}').len()
            } else {
                rest.find(|c: char| matches!(c, ',' | '}' | '\n')).unwrap_or(rest.len())
            };
            let value = rest[..end].trim();
            return (!value.is_empty()).then(|| (value.to_string(), value_start + end));
        }
        None => return None,
    };

    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, e @ ('\\' | '\'' | '"'))) => value.push(e),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => value.push('\\'),
            }
            continue;
        }
        if c == quote {
            let after = rest[idx + c.len_utf8()..].trim_start();
            if after.is_empty() || after.starts_with(',') || after.starts_with('}') {
                return Some((value, value_start + idx + c.len_utf8()));
            }
        }
        value.push(c);
    }

    // Unterminated: keep everything, minus a dangling brace.
    let value = value.trim_end().trim_end_matches('}').trim_end().to_string();
    Some((value, input.len()))
}

/// Trim, then drop one matched pair of surrounding quotes.
fn clean_content(content: &str) -> String {
    let trimmed = content.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'\'' || first == b'"') {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}

fn is_lone_punctuation(content: &str) -> bool {
    matches!(content, "\\" | "'" | "\"" | "{" | "}")
}

fn is_degenerate(content: &str) -> bool {
    content.chars().count() < MIN_CONTENT_CHARS || is_lone_punctuation(content)
}

fn has_code_token(text: &str) -> bool {
    CODE_TOKENS.iter().any(|t| text.contains(t))
}

/// Recovery chain: text after the file name when the input looks like code,
/// then a quoted code span, then a `content:` span.
fn recover_content(input: &str, path: &str) -> Option<String> {
    if has_code_token(input) {
        let after_name = Regex::new(&format!(r"(?s){}\s+(.+)", regex::escape(path))).ok()?;
        if let Some(caps) = after_name.captures(input) {
            let candidate = clean_content(&caps[1]);
            if !is_degenerate(&candidate) {
                log::debug!("Recovered content following {}", path);
                return Some(candidate);
            }
        }

        for caps in QUOTED_SPAN_RE.captures_iter(input) {
            let span = caps[1].trim();
            if has_code_token(span) && !is_degenerate(span) {
                log::debug!("Recovered content from quoted span");
                return Some(span.to_string());
            }
        }
    }

    let caps = CONTENT_SPAN_RE.captures(input)?;
    let candidate = clean_content(&caps[1]);
    if is_degenerate(&candidate) {
        return None;
    }
    log::debug!("Recovered content from content: span");
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(input: &str) -> ExtractedArgs {
        extract(input, ExtractMode::Create, ContentRecovery::Recover).unwrap()
    }

    #[test]
    fn test_plain_form() {
        let args = create("bye.py print('hi')");
        assert_eq!(args.path, "bye.py");
        assert_eq!(args.content, "print('hi')");
        assert_eq!(args.shape, InputShape::Plain);
    }

    #[test]
    fn test_quoted_dict_form() {
        let args = create("{'file_path': 'a.py', 'content': 'x=1'}");
        assert_eq!(args.path, "a.py");
        assert_eq!(args.content, "x=1");
        assert_eq!(args.shape, InputShape::QuotedDict);
        assert!(!args.recovered);
    }

    #[test]
    fn test_inline_keyword_form() {
        let args = create("notes.md content: # Notes\nhello");
        assert_eq!(args.path, "notes.md");
        assert_eq!(args.content, "# Notes\nhello");
        assert_eq!(args.shape, InputShape::InlineKeyword);
    }

    #[test]
    fn test_json_form_prefers_mode_key() {
        let input = r##"{"file_path": "README.md", "new_content": "# Title", "content": "ignored!", "commit_message": "docs"}"##;
        let args = extract(input, ExtractMode::Edit, ContentRecovery::Strict).unwrap();
        assert_eq!(args.shape, InputShape::Json);
        assert_eq!(args.content, "# Title");
        assert_eq!(args.commit_message.as_deref(), Some("docs"));
    }

    #[test]
    fn test_brace_key_form_with_escapes() {
        let args = create(r"{file_path: 'bye.py', content: 'print(\'Hello, World!\')'}");
        assert_eq!(args.shape, InputShape::BraceKey);
        assert_eq!(args.path, "bye.py");
        assert_eq!(args.content, "print('Hello, World!')");
    }

    #[test]
    fn test_brace_key_form_tolerates_missing_brace_and_bare_content() {
        let args = create("{file_path: calc.py, content: def add(a, b): return a + b");
        assert_eq!(args.path, "calc.py");
        assert_eq!(args.content, "def add(a, b): return a + b");

        let args = create("{file_path: \"calc.py\", content: \"x = [1, 2]\"");
        assert_eq!(args.content, "x = [1, 2]");
    }

    #[test]
    fn test_inner_quotes_do_not_end_value() {
        let args = create("{'file_path': 'bye.py', 'content': 'print('hi there')'}");
        assert_eq!(args.content, "print('hi there')");
    }

    #[test]
    fn test_edit_keyword_and_unmatched_quotes() {
        let args = extract(
            "README.md new_content: \"Updated content\"",
            ExtractMode::Edit,
            ContentRecovery::Recover,
        )
        .unwrap();
        assert_eq!(args.path, "README.md");
        assert_eq!(args.content, "Updated content");

        // only one matched pair is removed
        let args = create("q.txt 'it's fine'");
        assert_eq!(args.content, "it's fine");
    }

    #[test]
    fn test_bare_brace_form() {
        let args = create("{hello.py: print('hello')}");
        assert_eq!(args.shape, InputShape::BareBrace);
        assert_eq!(args.path, "hello.py");
        assert_eq!(args.content, "print('hello')");
    }

    #[test]
    fn test_recovery_after_file_name() {
        let input = "{'file_path': 'calculator.py', 'content': '\"'} calculator.py def add(a, b): return a + b";
        let args = create(input);
        assert_eq!(args.path, "calculator.py");
        assert!(args.recovered);
        assert_eq!(args.content, "def add(a, b): return a + b");
    }

    #[test]
    fn test_strict_keeps_short_content_and_skips_recovery() {
        let strict = |input: &str| extract(input, ExtractMode::Create, ContentRecovery::Strict);

        let args = strict("{'file_path': 'a.py', 'content': 'x=1'}").unwrap();
        assert_eq!(args.path, "a.py");
        assert_eq!(args.content, "x=1");
        assert!(!args.recovered);

        let args = strict("a.py x=1").unwrap();
        assert_eq!(args.content, "x=1");

        let input = "{'file_path': 'calculator.py', 'content': '\"'} calculator.py def add(a, b): return a + b";
        assert_eq!(strict(input).unwrap_err().kind(), "argument_parse");
        assert_eq!(strict("a.py '").unwrap_err().kind(), "argument_parse");
    }

    #[test]
    fn test_inline_keyword_inside_braces() {
        let args = create("{a.py content: print('hello')}");
        assert_eq!(args.shape, InputShape::InlineKeyword);
        assert_eq!(args.path, "a.py");
        assert_eq!(args.content, "print('hello')");

        let args = create("{notes.md content: # Notes");
        assert_eq!(args.path, "notes.md");
        assert_eq!(args.content, "# Notes");

        let args = create("cfg.py content: d = {}");
        assert_eq!(args.content, "d = {}");
    }

    #[test]
    fn test_synthesis_is_opt_in_and_create_only() {
        let err = extract("a.py '", ExtractMode::Create, ContentRecovery::Recover).unwrap_err();
        assert_eq!(err.kind(), "argument_parse");

        let args = extract("a.py '", ExtractMode::Create, ContentRecovery::Synthesize).unwrap();
        assert!(args.recovered);
        assert_eq!(args.content, PLACEHOLDER_CONTENT);

        let err = extract("a.py '", ExtractMode::Edit, ContentRecovery::Synthesize).unwrap_err();
        assert_eq!(err.kind(), "argument_parse");
    }

    #[test]
    fn test_invalid_paths_and_missing_content() {
        assert_eq!(create_err("{ }"), "argument_parse");
        assert_eq!(create_err("github hello world"), "invalid_path");
        assert_eq!(create_err("lonely.py"), "argument_parse");
        assert_eq!(create_err("   "), "argument_parse");
    }

    fn create_err(input: &str) -> &'static str {
        extract(input, ExtractMode::Create, ContentRecovery::Recover)
            .unwrap_err()
            .kind()
    }

    #[test]
    fn test_extract_single() {
        assert_eq!(extract_single("  'README.md' "), "README.md");
        assert_eq!(extract_single("{file_path: 'hello.py'}"), "hello.py");
        assert_eq!(extract_single("{'file_path': \"hello.py\"}"), "hello.py");
        assert_eq!(extract_single(r#"{"path": "src/lib.rs"}"#), "src/lib.rs");
        assert_eq!(extract_single("{notes.md}"), "notes.md");
    }

    #[test]
    fn test_extract_branch() {
        assert_eq!(
            extract_branch("feature/login", "main").unwrap(),
            ("feature/login".to_string(), "main".to_string())
        );
        assert_eq!(
            extract_branch("'hotfix' 'release'", "main").unwrap(),
            ("hotfix".to_string(), "release".to_string())
        );
        assert!(extract_branch("  ", "main").is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Synthesize".parse::<ContentRecovery>().unwrap(), ContentRecovery::Synthesize);
        assert_eq!(ContentRecovery::default(), ContentRecovery::Recover);
        assert!("lenient".parse::<ContentRecovery>().is_err());
    }
}
