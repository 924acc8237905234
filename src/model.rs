//! Settings tree model.
//!
//! A [`Config`] holds exactly one keyed [`Task`].  The task's scalar metadata
//! is typed; the step tree under `settings` is a dynamic, insertion-ordered
//! JSON value because fields legitimately hold the "wrong" type while they
//! are being edited (a number typed as `"250"`, a list typed as `"E1, E2"`).
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Step-keyed settings tree (`resample_step`, `filtering`, `ICA`, …).
pub type Settings = serde_json::Map<String, Value>;

/// Field path → human-readable message.
pub type ValidationErrors = BTreeMap<String, String>;

/// Identifier used when nothing usable is left after sanitisation.
pub const FALLBACK_IDENTIFIER: &str = "CustomTask";

/// One named configuration unit, the source of one generated Python file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier as typed by the user.  Also the generated class name
    /// after sanitisation.
    pub mne_task: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl Task {
    /// Look up a dotted path (`"epoch_settings.value.tmin"`) inside `settings`.
    pub fn setting(&self, path: &str) -> Option<&Value> {
        let settings = self.settings.as_ref()?;
        let mut parts = path.split('.');
        let mut current = settings.get(parts.next()?)?;
        for part in parts {
            current = child(current, part)?;
        }
        Some(current)
    }

    /// `true` when the step exists and its `enabled` flag is literally `true`.
    pub fn step_enabled(&self, step: &str) -> bool {
        self.setting(&format!("{step}.enabled")) == Some(&Value::Bool(true))
    }
}

/// The loaded task, together with the key it is addressed by in field paths
/// (`tasks.<key>.…`).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub key: String,
    pub task: Task,
}

impl Config {
    pub fn new(key: impl Into<String>, task: Task) -> Self {
        Self { key: key.into(), task }
    }

    /// Path prefix of every field of the task, e.g. `tasks.RestingState`.
    pub fn base_path(&self) -> String {
        format!("tasks.{}", self.key)
    }

    /// Path prefix of the step tree, e.g. `tasks.RestingState.settings`.
    pub fn settings_path(&self) -> String {
        format!("tasks.{}.settings", self.key)
    }
}

/// Serialises as `{"tasks": {"<key>": {…}}}`, the shape the wizard exchanges.
impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Tasks<'a>(&'a Config);

        impl Serialize for Tasks<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&self.0.key, &self.0.task)?;
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("tasks", &Tasks(self))?;
        map.end()
    }
}

/// Select one level below `value` by object key or array index.
pub(crate) fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Turn free text into a `[A-Za-z0-9_]` identifier.
///
/// Whitespace runs become a single `_`; every other character outside the
/// class is dropped.  May return an empty string.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }
    out
}
