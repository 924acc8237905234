//! Forward generator: settings tree → Python task script.
//!
//! ```text
//! Config
//!   ├─ coerce::normalize_task     strings → numbers / lists, event ids → mapping
//!   ├─ python_literal             settings → Python dict literal
//!   ├─ class_name                 mne_task → class identifier
//!   ├─ epoching / classification  one code line each
//!   └─ substitute                 {{PLACEHOLDER}} → text, single pass
//! ```
//!
//! Generation is a pure function of the config and the template: the same
//! input always yields byte-identical output.  Dict keys are emitted in the
//! insertion order of the settings tree.
use regex::{Captures, Regex};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::LazyLock;
use tracing::debug;

use crate::coerce::normalize_task;
use crate::error::GenerateError;
use crate::model::{sanitize_identifier, Config, Task, FALLBACK_IDENTIFIER};
use crate::script::{self, PLACEHOLDERS, TASK_SCRIPT};
use crate::validate::CLASSIFICATION_METHODS;

/// Indentation unit of the dict literal.
const INDENT: &str = "    ";

/// Banner text used when the task has no description.
pub const DEFAULT_DESCRIPTION: &str = "EEG processing task";

pub const EPOCHS_DISABLED: &str = "# Epoching disabled via configuration";
pub const EPOCHS_EVENT_ID: &str = "self.create_eventid_epochs()  # Using event IDs";
pub const EPOCHS_FIXED_LENGTH: &str = "self.create_regular_epochs()  # Using fixed-length epochs";
pub const CLASSIFICATION_DISABLED: &str = "# Component classification disabled via configuration";
pub const CLASSIFICATION_UNKNOWN: &str = "# Unknown component classification method, skipped";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[A-Z_]+\}\}").expect("valid regex"));

/// Render the task as a complete Python source file using the built-in template.
pub fn generate(config: &Config) -> Result<String, GenerateError> {
    generate_with_template(config, TASK_SCRIPT)
}

/// Render the task into `template`.
///
/// Fails when `template` lacks any of [`script::PLACEHOLDERS`]; this is a
/// generator/template contract violation, never a user error.
pub fn generate_with_template(config: &Config, template: &str) -> Result<String, GenerateError> {
    if let Some(missing) = PLACEHOLDERS.iter().find(|p| !template.contains(*p)) {
        return Err(GenerateError::MissingPlaceholder(*missing));
    }

    let task = normalize_task(&config.task);
    let class = class_name(&task, &config.key);
    debug!(class = %class, key = %config.key, "rendering task script");

    let settings = Value::Object(task.settings.clone().unwrap_or_default());
    let dict = python_literal(&settings);
    let description = banner_text(&task.description);
    let dataset = python_literal(&optional_text(&task.dataset_name));
    let input = python_literal(&optional_text(&task.input_path));
    let epoching = epoching_code(&task);
    let classification = classification_code(&task);

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let token = &caps[0];
        match token {
            script::TASK_DESCRIPTION => description.clone(),
            script::CLASS_NAME => class.clone(),
            script::CONFIG_DICT => dict.clone(),
            script::EPOCHING_CODE => epoching.to_string(),
            script::COMPONENT_CLASSIFICATION_CODE => classification.to_string(),
            script::DATASET_NAME => dataset.clone(),
            script::INPUT_PATH => input.clone(),
            other => other.to_string(),
        }
    });
    Ok(rendered.into_owned())
}

// ── Identifiers ──────────────────────────────────────────────────────────

/// Python class name for a task.
///
/// Built from `mne_task` (falling back to the task key): sanitised to
/// `[A-Za-z0-9_]`, `_`-prefixed when it would start with a digit,
/// [`FALLBACK_IDENTIFIER`] when nothing is left, first letter capitalised.
pub fn class_name(task: &Task, key: &str) -> String {
    let source = if task.mne_task.trim().is_empty() { key } else { task.mne_task.as_str() };
    let mut name = sanitize_identifier(source);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if name.is_empty() {
        return FALLBACK_IDENTIFIER.to_string();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => name,
    }
}

/// Download file name: the lower-cased task key, `task.py` when there is none.
pub fn file_name(config: &Config) -> String {
    let key = sanitize_identifier(&config.key);
    if key.is_empty() {
        "task.py".to_string()
    } else {
        format!("{}.py", key.to_lowercase())
    }
}

fn banner_text(description: &str) -> String {
    let flat = description.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        flat
    }
}

fn optional_text(text: &Option<String>) -> Value {
    text.as_ref().map_or(Value::Null, |s| Value::String(s.clone()))
}

// ── Code lines ───────────────────────────────────────────────────────────

/// Epoching call for an already normalised task.
pub fn epoching_code(task: &Task) -> &'static str {
    if !task.step_enabled("epoch_settings") {
        return EPOCHS_DISABLED;
    }
    match task.setting("epoch_settings.event_id") {
        None | Some(Value::Null) => EPOCHS_FIXED_LENGTH,
        Some(Value::Object(map)) if map.is_empty() => EPOCHS_FIXED_LENGTH,
        Some(_) => EPOCHS_EVENT_ID,
    }
}

/// Component classification call, or a comment when it is off.
pub fn classification_code(task: &Task) -> String {
    if !task.step_enabled("component_rejection") {
        return CLASSIFICATION_DISABLED.to_string();
    }
    match task.setting("component_rejection.method").and_then(Value::as_str) {
        Some(method) if CLASSIFICATION_METHODS.contains(&method) => {
            format!("self.classify_ica_components(method=\"{method}\")")
        }
        _ => CLASSIFICATION_UNKNOWN.to_string(),
    }
}

// ── Python literals ──────────────────────────────────────────────────────

/// Render a value as a Python literal.
///
/// Objects are printed one `'key': value` pair per line, indented four
/// spaces per level; lists stay on one line.
///
/// ```
/// use exgcfg::generate::python_literal;
/// use serde_json::json;
/// assert_eq!(python_literal(&json!([1, null, true, "it's"])), r"[1, None, True, 'it\'s']");
/// assert_eq!(python_literal(&json!({})), "{}");
/// ```
pub fn python_literal(value: &Value) -> String {
    let mut out = String::new();
    write_literal(&mut out, value, 0);
    out
}

fn write_literal(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item, depth);
            }
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (i, (key, item)) in map.iter().enumerate() {
                push_indent(out, depth + 1);
                write_string(out, key);
                out.push_str(": ");
                write_literal(out, item, depth + 1);
                if i + 1 < map.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, depth);
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Single-quoted Python string.
fn write_string(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{custom, template};
    use serde_json::json;

    #[test]
    fn nested_objects_are_indented() {
        let v = json!({ "a": { "enabled": false, "value": [60, 120] }, "b": null });
        assert_eq!(
            python_literal(&v),
            "{\n    'a': {\n        'enabled': False,\n        'value': [60, 120]\n    },\n    'b': None\n}"
        );
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(python_literal(&json!("a'b\\c\nd")), r"'a\'b\\c\nd'");
    }

    #[test]
    fn floats_render_in_python_syntax() {
        assert_eq!(python_literal(&json!(125e-6)), "0.000125");
        assert_eq!(python_literal(&json!(-0.5)), "-0.5");
        assert_eq!(python_literal(&json!(2.0)), "2.0");
    }

    #[test]
    fn class_name_rules() {
        let mut task = custom().task;
        task.mne_task = "my task!".into();
        assert_eq!(class_name(&task, "k"), "My_task");
        task.mne_task = "1st run".into();
        assert_eq!(class_name(&task, "k"), "_1st_run");
        task.mne_task = "???".into();
        assert_eq!(class_name(&task, "k"), FALLBACK_IDENTIFIER);
        task.mne_task = "".into();
        assert_eq!(class_name(&task, "fromKey"), "FromKey");
    }

    #[test]
    fn file_name_is_lowercased_key() {
        assert_eq!(file_name(&template("RestingState").unwrap()), "restingstate.py");
        let mut cfg = custom();
        cfg.key = String::new();
        assert_eq!(file_name(&cfg), "task.py");
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let cfg = template("RestingState").unwrap();
        let broken = TASK_SCRIPT.replace(script::EPOCHING_CODE, "pass");
        assert_eq!(
            generate_with_template(&cfg, &broken),
            Err(GenerateError::MissingPlaceholder(script::EPOCHING_CODE))
        );
    }

    #[test]
    fn description_text_is_not_re_expanded() {
        let mut cfg = template("RestingState").unwrap();
        cfg.task.description = "odd {{CLASS_NAME}} text".into();
        let out = generate(&cfg).unwrap();
        assert!(out.contains("odd {{CLASS_NAME}} text EEG PREPROCESSING CONFIGURATION"));
        assert!(out.contains("class RestingState(Task):"));
    }

    #[test]
    fn classification_follows_method() {
        let mut cfg = template("RestingState").unwrap();
        assert!(generate(&cfg).unwrap().contains("self.classify_ica_components(method=\"iclabel\")"));
        cfg.task.settings.as_mut().unwrap()["component_rejection"]["method"] = json!("icvision");
        assert!(generate(&cfg).unwrap().contains("method=\"icvision\""));
        cfg.task.settings.as_mut().unwrap()["component_rejection"]["method"] = json!("magic");
        assert!(generate(&cfg).unwrap().contains(CLASSIFICATION_UNKNOWN));
        cfg.task.settings.as_mut().unwrap()["component_rejection"]["enabled"] = json!(false);
        assert!(generate(&cfg).unwrap().contains(CLASSIFICATION_DISABLED));
    }

    #[test]
    fn disabled_epoching_emits_comment() {
        let mut cfg = template("EventBased").unwrap();
        cfg.task.settings.as_mut().unwrap()["epoch_settings"]["enabled"] = json!(false);
        let out = generate(&cfg).unwrap();
        assert!(out.contains(EPOCHS_DISABLED));
        assert!(!out.contains("create_eventid_epochs"));
        // the payload stays in the dict even though the step is off
        assert!(out.contains("'DIN8': 1"));
    }

    #[test]
    fn deterministic() {
        let cfg = template("EventBased").unwrap();
        assert_eq!(generate(&cfg).unwrap(), generate(&cfg).unwrap());
    }
}
