//! Error taxonomy.
//!
//! None of these cross the public operations as panics:
//!
//! * [`MutateError`]: logged, the caller gets the unmodified config back.
//! * [`GenerateError`]: returned from [`crate::generate()`]; only a template /
//!   generator contract mismatch produces one.
//! * [`ParseError`]: logged, [`crate::parse()`] returns `None`.
//! * [`UploadError`]: the single aggregate message shown for a rejected upload.

/// Why a single field edit was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutateError {
    #[error("empty path")]
    EmptyPath,

    #[error("path `{path}` does not address the loaded task")]
    UnknownTask { path: String },

    #[error("invalid path segment `{segment}` in path `{path}`")]
    MissingSegment { path: String, segment: String },

    #[error("segment `{segment}` in path `{path}` is not a container")]
    NotAContainer { path: String, segment: String },

    #[error("index {index} out of bounds (len {len}) for path `{path}`")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    #[error("field `{field}` expects a string, got {found}")]
    ExpectedString { field: String, found: String },
}

/// Generation failed because template and generator disagree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    #[error("template placeholder {0} is missing")]
    MissingPlaceholder(&'static str),
}

/// Internal reasons a Python source could not be turned back into a task.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("could not find config dictionary in Python file")]
    NoConfigBlock,

    #[error("failed to parse Python configuration dictionary: {0}")]
    Literal(#[from] serde_json::Error),

    #[error("config dictionary is not a mapping")]
    NotAMapping,
}

/// Aggregate, user-facing upload failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UploadError {
    #[error("Please select a Python configuration file (.py)")]
    NotPython,

    #[error("Unable to parse configuration file. Please ensure it's a valid Autoclean EEG task file.")]
    Unparseable,

    #[error("Invalid configuration: {}", .0.join(", "))]
    Incomplete(Vec<String>),
}
