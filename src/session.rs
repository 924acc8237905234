//! Wizard session: the loaded task plus the errors shown next to its fields.
//!
//! ```text
//! select_template / load_upload ─┐
//!                                ├─→ config ─ edit ─→ config'
//!                                │      └─ validate ─→ errors
//!                                └─ preview / download ─→ Python text
//! ```
//!
//! The session is the only place where failures turn into user-facing
//! messages.  Library operations below it either return a value or log.
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::generate::{file_name, generate};
use crate::model::{Config, ValidationErrors, FALLBACK_IDENTIFIER};
use crate::mutate::apply;
use crate::parse::parse;
use crate::path::Target;
use crate::templates;
use crate::validate::{validate, validate_parsed};

/// Error key for a failed preview render.
pub const PYTHON_GENERATION: &str = "pythonGeneration";
/// Error key for a failed download render.
pub const FILE_GENERATION: &str = "fileGeneration";

pub const REQUIRED: &str = "This field is required.";
pub const NO_TASK: &str = "No task configuration loaded.";
pub const PYTHON_MIME: &str = "text/x-python";

/// A rendered task file, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub contents: String,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    config: Option<Config>,
    errors: ValidationErrors,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Replace the loaded task and forget all recorded errors.
    pub fn load(&mut self, config: Config) {
        debug!(key = %config.key, "loading task");
        self.config = Some(config);
        self.errors.clear();
    }

    /// Start from a built-in template (or `CustomTask`). Unknown names leave
    /// the session as it was and return `false`.
    pub fn select_template(&mut self, name: &str) -> bool {
        let config = if name == FALLBACK_IDENTIFIER {
            Some(templates::custom())
        } else {
            templates::template(name)
        };
        match config {
            Some(config) => {
                self.load(config);
                true
            }
            None => {
                warn!(name, "unknown template");
                false
            }
        }
    }

    /// Load an uploaded task file.
    ///
    /// The extension is checked before anything is parsed; on any failure the
    /// currently loaded task is kept.
    pub fn load_upload(&mut self, file_name: &str, contents: &str) -> Result<(), UploadError> {
        if !file_name.to_ascii_lowercase().ends_with(".py") {
            return Err(UploadError::NotPython);
        }
        let config = parse(contents).ok_or(UploadError::Unparseable)?;
        let problems = validate_parsed(&config);
        if !problems.is_empty() {
            return Err(UploadError::Incomplete(problems));
        }
        info!(file_name, key = %config.key, "loaded task file");
        self.load(config);
        Ok(())
    }

    /// [`Session::load_upload`] for a file on disk.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        self.load_upload(&name, &contents)
            .with_context(|| format!("loading {}", path.display()))
    }

    /// Apply one field edit.
    ///
    /// The edited path's recorded error is cleared; a required task field
    /// that becomes empty is flagged immediately.  A rename moves recorded
    /// errors to the new task key.
    pub fn edit(&mut self, path: &str, value: Value) {
        let Some(config) = &self.config else {
            warn!(path, "edit with no task loaded");
            return;
        };
        self.errors.remove(path);
        let required = matches!(
            Target::parse(path, &config.key),
            Ok(Target::Task(field)) if field.is_required()
        );
        if required && is_blank(&value) {
            self.errors.insert(path.to_string(), REQUIRED.to_string());
        }
        let next = apply(config, path, value);
        if next.key != config.key {
            let old = format!("tasks.{}.", config.key);
            let new = format!("tasks.{}.", next.key);
            debug!(from = %config.key, to = %next.key, "re-keying recorded errors");
            self.errors = std::mem::take(&mut self.errors)
                .into_iter()
                .map(|(p, message)| {
                    let moved = p.strip_prefix(&old).map(|rest| format!("{new}{rest}"));
                    (moved.unwrap_or(p), message)
                })
                .collect();
        }
        self.config = Some(next);
    }

    /// Re-run the full validator. Returns `true` when there is nothing to fix.
    pub fn validate(&mut self) -> bool {
        self.errors = match &self.config {
            Some(config) => validate(config),
            None => ValidationErrors::new(),
        };
        self.errors.is_empty()
    }

    /// Python text for the preview pane, or `None` when the task is invalid
    /// or cannot be rendered (see [`PYTHON_GENERATION`]).
    pub fn preview(&mut self) -> Option<String> {
        self.render(PYTHON_GENERATION)
    }

    /// The task as a downloadable file (see [`FILE_GENERATION`]).
    pub fn download(&mut self) -> Option<Download> {
        let contents = self.render(FILE_GENERATION)?;
        let config = self.config.as_ref()?;
        Some(Download { file_name: file_name(config), mime: PYTHON_MIME, contents })
    }

    fn render(&mut self, error_key: &str) -> Option<String> {
        let Some(config) = &self.config else {
            self.errors.insert(error_key.to_string(), NO_TASK.to_string());
            return None;
        };
        let errors = validate(config);
        if !errors.is_empty() {
            debug!(count = errors.len(), "not rendering an invalid task");
            self.errors = errors;
            return None;
        }
        match generate(config) {
            Ok(text) => {
                self.errors.remove(error_key);
                Some(text)
            }
            Err(err) => {
                self.errors.insert(error_key.to_string(), err.to_string());
                None
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
