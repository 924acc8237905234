//! Typed field paths.
//!
//! The wizard addresses every field with a dotted string such as
//! `tasks.RestingState.settings.filtering.value.l_freq`.  [`Target::parse`]
//! resolves such a string against the loaded task once, so the mutator works
//! on "which field" instead of re-splitting strings: the task's own scalar
//! fields are an enum, and only the dynamic step tree is addressed segment
//! by segment.
use crate::error::MutateError;

/// Scalar fields of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    /// `mne_task`; editing it may rename the task.
    Identifier,
    Description,
    DatasetName,
    InputPath,
}

impl TaskField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "mne_task" => Some(Self::Identifier),
            "description" => Some(Self::Description),
            "dataset_name" => Some(Self::DatasetName),
            "input_path" => Some(Self::InputPath),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Identifier => "mne_task",
            Self::Description => "description",
            Self::DatasetName => "dataset_name",
            Self::InputPath => "input_path",
        }
    }

    /// Fields the live "required" check applies to.
    pub fn is_required(self) -> bool {
        matches!(self, Self::Identifier | Self::Description)
    }
}

/// What a path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Task(TaskField),
    /// Segments below `settings`; empty means the whole step tree.
    Settings(Vec<String>),
}

impl Target {
    /// Resolve `path` against the task currently keyed `task_key`.
    pub fn parse(path: &str, task_key: &str) -> Result<Self, MutateError> {
        if path.is_empty() {
            return Err(MutateError::EmptyPath);
        }
        let parts: Vec<&str> = path.split('.').collect();
        if let Some(empty) = parts.iter().position(|p| p.is_empty()) {
            return Err(MutateError::MissingSegment {
                path: path.to_string(),
                segment: format!("<empty segment #{empty}>"),
            });
        }
        match parts.as_slice() {
            ["tasks", key, rest @ ..] if *key == task_key => match rest {
                [field] => TaskField::from_key(field).map(Target::Task).ok_or_else(|| {
                    MutateError::MissingSegment {
                        path: path.to_string(),
                        segment: field.to_string(),
                    }
                }),
                ["settings", below @ ..] => {
                    Ok(Target::Settings(below.iter().map(|s| s.to_string()).collect()))
                }
                [first, ..] => Err(MutateError::MissingSegment {
                    path: path.to_string(),
                    segment: first.to_string(),
                }),
                [] => Err(MutateError::MissingSegment {
                    path: path.to_string(),
                    segment: task_key.to_string(),
                }),
            },
            _ => Err(MutateError::UnknownTask { path: path.to_string() }),
        }
    }
}

/// Array index view of a segment.
pub fn as_index(segment: &str) -> Option<usize> {
    if segment.bytes().all(|b| b.is_ascii_digit()) {
        segment.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_fields_resolve() {
        assert_eq!(
            Target::parse("tasks.Rest.mne_task", "Rest"),
            Ok(Target::Task(TaskField::Identifier))
        );
        assert_eq!(
            Target::parse("tasks.Rest.description", "Rest"),
            Ok(Target::Task(TaskField::Description))
        );
    }

    #[test]
    fn settings_segments_are_kept_in_order() {
        assert_eq!(
            Target::parse("tasks.Rest.settings.epoch_settings.remove_baseline.window.0", "Rest"),
            Ok(Target::Settings(
                ["epoch_settings", "remove_baseline", "window", "0"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            ))
        );
    }

    #[test]
    fn other_task_key_is_rejected() {
        assert!(matches!(
            Target::parse("tasks.Other.mne_task", "Rest"),
            Err(MutateError::UnknownTask { .. })
        ));
        assert!(matches!(Target::parse("", "Rest"), Err(MutateError::EmptyPath)));
        assert!(matches!(
            Target::parse("tasks.Rest.settings..value", "Rest"),
            Err(MutateError::MissingSegment { .. })
        ));
        assert!(matches!(
            Target::parse("tasks.Rest.colour", "Rest"),
            Err(MutateError::MissingSegment { .. })
        ));
    }

    #[test]
    fn index_segments() {
        assert_eq!(as_index("1"), Some(1));
        assert_eq!(as_index("-1"), None);
        assert_eq!(as_index("+1"), None);
        assert_eq!(as_index("value"), None);
    }
}
