//! Reverse parser: Python task script → settings tree.
//!
//! ```text
//! source
//!   ├─ CONFIG_BLOCK      `config = {…}` up to the class header (or EOF)
//!   ├─ python_to_json    True/False/None, quotes, trailing commas
//!   ├─ serde_json        strict literal parse
//!   ├─ schema            defaults for missing fields, editing form of event ids
//!   └─ CLASS / banner / module assignments → task metadata
//! ```
//!
//! Only the dict literal is evaluated; the rest of the file is matched with
//! anchored patterns.  Any failure yields `None`.
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, error};

use crate::error::ParseError;
use crate::model::{Config, Task, FALLBACK_IDENTIFIER};
use crate::schema::reconcile_settings;
use crate::script::BANNER_SUFFIX;

/// Description used when the banner cannot be found.
pub const UNKNOWN_DESCRIPTION: &str = "Custom Task";

static CONFIG_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?sm)^config\s*=\s*(\{.*?\})\s*(?:^class\b|\z)").expect("valid regex")
});

static CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^class\s+(\w+)\s*\(").expect("valid regex"));

static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"#\s*=+\s*\n#\s+(.+?)\s+{}", regex::escape(BANNER_SUFFIX));
    Regex::new(&pattern).expect("valid regex")
});

static DATASET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^dataset_name\s*=\s*(.*?)\s*$").expect("valid regex"));

static INPUT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^input_path\s*=\s*(.*?)\s*$").expect("valid regex"));

/// Recover a task from Python source, or `None` when the file is not a
/// recognisable task script.  The reason is logged.
pub fn parse(source: &str) -> Option<Config> {
    match try_parse(source) {
        Ok(config) => Some(config),
        Err(err) => {
            error!(error = %err, "error parsing Python configuration");
            None
        }
    }
}

/// Fallible form of [`parse`].
pub fn try_parse(source: &str) -> Result<Config, ParseError> {
    let block = CONFIG_BLOCK
        .captures(source)
        .and_then(|caps| caps.get(1))
        .ok_or(ParseError::NoConfigBlock)?;

    let json = python_to_json(block.as_str());
    let Value::Object(flat) = serde_json::from_str::<Value>(&json)? else {
        return Err(ParseError::NotAMapping);
    };
    let settings = reconcile_settings(&flat);

    let class = CLASS
        .captures(source)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| FALLBACK_IDENTIFIER.to_string());
    let description = DESCRIPTION
        .captures(source)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());
    debug!(class = %class, steps = settings.len(), "parsed task script");

    let task = Task {
        mne_task: class.clone(),
        description,
        dataset_name: module_text(&DATASET_NAME, source),
        input_path: module_text(&INPUT_PATH, source),
        settings: Some(settings),
    };
    Ok(Config::new(class, task))
}

/// String value of a module-level assignment; `None` for `None`, for
/// anything that is not a string literal, or when the line is absent.
fn module_text(pattern: &Regex, source: &str) -> Option<String> {
    let caps = pattern.captures(source)?;
    match serde_json::from_str(&python_to_json(&caps[1])).ok()? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

// ── Lexical shim ─────────────────────────────────────────────────────────

/// Rewrite a Python literal into JSON text.
///
/// Outside string literals, `True`/`False`/`None` become `true`/`false`/
/// `null` and a comma directly before `}` or `]` is dropped.  Single-quoted
/// strings are re-quoted with `"`, so quotes and keywords inside strings are
/// never touched.  The result still has to pass a strict JSON parse;
/// anything Python-only (tuples, `1_000`, expressions) fails there.
///
/// ```
/// use exgcfg::parse::python_to_json;
/// assert_eq!(
///     python_to_json("{'a': True, 'b': [None, 'It\\'s'],}"),
///     r#"{"a": true, "b": [null, "It's"]}"#,
/// );
/// ```
pub fn python_to_json(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\'' => i = copy_string(&chars, i + 1, '\'', &mut out),
            '"' => i = copy_string(&chars, i + 1, '"', &mut out),
            ',' if closes_next(&chars, i + 1) => i += 1,
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Whether the next non-blank char at or after `from` closes a container.
fn closes_next(chars: &[char], from: usize) -> bool {
    chars[from..]
        .iter()
        .find(|c| !c.is_whitespace())
        .is_some_and(|c| *c == '}' || *c == ']')
}

/// Escape letters JSON and Python agree on.
const JSON_ESCAPES: &str = "\\/bfnrtu";

/// Copy a string literal body starting at `i` as a JSON string; returns the
/// index just past the closing `quote`.  An unterminated literal runs to the
/// end of input and is left for the JSON parser to reject.
fn copy_string(chars: &[char], mut i: usize, quote: char, out: &mut String) -> usize {
    out.push('"');
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                match chars.get(i + 1).copied() {
                    Some('\'') => out.push('\''),
                    Some('"') => out.push_str("\\\""),
                    Some(c) if JSON_ESCAPES.contains(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    // Python keeps unknown escapes literally.
                    Some(c) => {
                        out.push_str("\\\\");
                        out.push(c);
                    }
                    None => out.push_str("\\\\"),
                }
                i += 2;
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    i
}
