//! Path-based, copy-on-write mutation of a [`Config`].
//!
//! [`apply`] never touches its input and is all-or-nothing: any problem with
//! the path yields the original config back (logged, since it indicates a
//! bug in how the caller built the path, not bad user input).
//!
//! Intermediate containers are never invented, except for the few shapes in
//! [`MATERIALIZE`] that forms legitimately write into before they exist.
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::MutateError;
use crate::model::{sanitize_identifier, Config};
use crate::path::{as_index, TaskField, Target};

/// Default container for a missing `child` directly under `parent`.
#[derive(Debug, Clone, Copy)]
enum Container {
    Object,
    NullPair,
}

/// `(parent, child, container)` triples that may be created on the way down.
const MATERIALIZE: &[(&str, &str, Container)] = &[
    ("epoch_settings", "value", Container::Object),
    ("crop_step", "value", Container::Object),
    ("remove_baseline", "window", Container::NullPair),
    ("threshold_rejection", "volt_threshold", Container::Object),
];

fn materialize(parent: &str, child: &str) -> Option<Value> {
    MATERIALIZE
        .iter()
        .find(|(p, c, _)| *p == parent && *c == child)
        .map(|(_, _, kind)| match kind {
            Container::Object => Value::Object(Map::new()),
            Container::NullPair => Value::Array(vec![Value::Null, Value::Null]),
        })
}

/// Return `config` with the field at `path` set to `value`.
///
/// On any error the unmodified config is returned and the cause is logged.
pub fn apply(config: &Config, path: &str, value: Value) -> Config {
    match try_apply(config, path, value) {
        Ok(next) => next,
        Err(err) => {
            warn!(path, error = %err, "edit rejected, keeping previous config");
            config.clone()
        }
    }
}

/// Fallible form of [`apply`].
pub fn try_apply(config: &Config, path: &str, value: Value) -> Result<Config, MutateError> {
    match Target::parse(path, &config.key)? {
        Target::Task(TaskField::Identifier) => {
            let raw = expect_text(TaskField::Identifier, value)?;
            Ok(rename_task(config, &raw))
        }
        Target::Task(field @ TaskField::Description) => {
            let mut next = config.clone();
            next.task.description = expect_text(field, value)?;
            Ok(next)
        }
        Target::Task(field @ (TaskField::DatasetName | TaskField::InputPath)) => {
            let text = match value {
                Value::Null => None,
                other => Some(expect_text(field, other)?),
            };
            let mut next = config.clone();
            match field {
                TaskField::DatasetName => next.task.dataset_name = text,
                _ => next.task.input_path = text,
            }
            Ok(next)
        }
        Target::Settings(segments) => {
            let mut next = config.clone();
            let Some(settings) = next.task.settings.take() else {
                return Err(MutateError::MissingSegment {
                    path: path.to_string(),
                    segment: "settings".to_string(),
                });
            };
            let mut root = Value::Object(settings);
            if segments.is_empty() {
                if !value.is_object() {
                    return Err(MutateError::NotAContainer {
                        path: path.to_string(),
                        segment: "settings".to_string(),
                    });
                }
                root = value;
            } else {
                set_in(&mut root, &segments, value, path)?;
            }
            if let Value::Object(map) = root {
                next.task.settings = Some(map);
            }
            Ok(next)
        }
    }
}

/// Set the task identifier, renaming the task when the sanitised name changes.
///
/// The stored `mne_task` is always the raw input; only the key the task is
/// addressed by is sanitised.  A raw value that sanitises to nothing keeps
/// the current key.
pub fn rename_task(config: &Config, raw: &str) -> Config {
    let sanitized = sanitize_identifier(raw);
    let mut next = config.clone();
    next.task.mne_task = raw.to_string();
    if !sanitized.is_empty() && sanitized != config.key {
        debug!(from = %config.key, to = %sanitized, "renaming task");
        next.key = sanitized;
    }
    next
}

fn expect_text(field: TaskField, value: Value) -> Result<String, MutateError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Err(MutateError::ExpectedString {
            field: field.key().to_string(),
            found: type_name(&other).to_string(),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tree walk ────────────────────────────────────────────────────────────

fn set_in(
    root: &mut Value,
    segments: &[String],
    value: Value,
    path: &str,
) -> Result<(), MutateError> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(MutateError::EmptyPath);
    };

    let mut current = root;
    let mut parent = "settings";
    for segment in parents {
        current = descend(current, parent, segment, path)?;
        parent = segment.as_str();
    }

    match current {
        Value::Array(items) => {
            let Some(index) = as_index(last) else {
                return Err(MutateError::NotAContainer {
                    path: path.to_string(),
                    segment: parent.to_string(),
                });
            };
            let len = items.len();
            let slot = items.get_mut(index).ok_or_else(|| MutateError::IndexOutOfBounds {
                path: path.to_string(),
                index,
                len,
            })?;
            *slot = value;
        }
        Value::Object(map) => {
            map.insert(last.clone(), value);
        }
        _ => {
            return Err(MutateError::NotAContainer {
                path: path.to_string(),
                segment: parent.to_string(),
            })
        }
    }
    Ok(())
}

fn descend<'a>(
    container: &'a mut Value,
    parent: &str,
    segment: &str,
    path: &str,
) -> Result<&'a mut Value, MutateError> {
    let missing = || MutateError::MissingSegment {
        path: path.to_string(),
        segment: segment.to_string(),
    };
    let slot = match container {
        Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
        Value::Array(items) => {
            let index = as_index(segment).ok_or_else(missing)?;
            let len = items.len();
            items.get_mut(index).ok_or(MutateError::IndexOutOfBounds {
                path: path.to_string(),
                index,
                len,
            })?
        }
        _ => {
            return Err(MutateError::NotAContainer {
                path: path.to_string(),
                segment: parent.to_string(),
            })
        }
    };
    if slot.is_null() {
        *slot = materialize(parent, segment).ok_or_else(missing)?;
    }
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::template;
    use serde_json::json;

    fn rest() -> Config {
        template("RestingState").unwrap()
    }

    #[test]
    fn sets_leaf_and_leaves_input_alone() {
        let before = rest();
        let after = apply(&before, "tasks.RestingState.settings.resample_step.value", json!(500));
        assert_eq!(after.task.setting("resample_step.value"), Some(&json!(500)));
        assert_eq!(before, rest());
    }

    #[test]
    fn assigns_array_index_in_bounds_only() {
        let cfg = rest();
        let p = "tasks.RestingState.settings.epoch_settings.remove_baseline.window.0";
        let after = apply(&cfg, p, json!(-0.2));
        assert_eq!(
            after.task.setting("epoch_settings.remove_baseline.window"),
            Some(&json!([-0.2, 0]))
        );

        let p = "tasks.RestingState.settings.epoch_settings.remove_baseline.window.2";
        assert!(matches!(
            try_apply(&cfg, p, json!(1)),
            Err(MutateError::IndexOutOfBounds { index: 2, len: 2, .. })
        ));
        assert_eq!(apply(&cfg, p, json!(1)), cfg);
    }

    #[test]
    fn materializes_whitelisted_containers() {
        let mut cfg = rest();
        let epochs = cfg.task.settings.as_mut().unwrap()["epoch_settings"].as_object_mut().unwrap();
        epochs.remove("value");
        epochs["remove_baseline"].as_object_mut().unwrap().remove("window");
        epochs["threshold_rejection"] = json!({ "enabled": true });

        let cfg = apply(&cfg, "tasks.RestingState.settings.epoch_settings.value.tmin", json!(-2));
        assert_eq!(cfg.task.setting("epoch_settings.value"), Some(&json!({ "tmin": -2 })));

        let cfg = apply(
            &cfg,
            "tasks.RestingState.settings.epoch_settings.remove_baseline.window.1",
            json!(0),
        );
        assert_eq!(
            cfg.task.setting("epoch_settings.remove_baseline.window"),
            Some(&json!([null, 0]))
        );

        let cfg = apply(
            &cfg,
            "tasks.RestingState.settings.epoch_settings.threshold_rejection.volt_threshold.eeg",
            json!("150e-6"),
        );
        assert_eq!(
            cfg.task.setting("epoch_settings.threshold_rejection.volt_threshold.eeg"),
            Some(&json!("150e-6"))
        );
    }

    #[test]
    fn refuses_to_invent_other_containers() {
        let cfg = rest();
        let p = "tasks.RestingState.settings.new_step.value.x";
        assert!(matches!(try_apply(&cfg, p, json!(1)), Err(MutateError::MissingSegment { .. })));
        assert_eq!(apply(&cfg, p, json!(1)), cfg);
    }

    #[test]
    fn creates_missing_leaf_key() {
        let cfg = apply(
            &rest(),
            "tasks.RestingState.settings.ICA.value.temp_highpass_for_ica",
            json!(1.0),
        );
        assert_eq!(cfg.task.setting("ICA.value.temp_highpass_for_ica"), Some(&json!(1.0)));
    }

    #[test]
    fn scalar_in_the_middle_is_not_a_container() {
        let cfg = rest();
        let p = "tasks.RestingState.settings.resample_step.value.deep";
        assert!(matches!(try_apply(&cfg, p, json!(1)), Err(MutateError::NotAContainer { .. })));
    }

    #[test]
    fn identifier_edit_renames_but_keeps_raw_value() {
        let cfg = crate::templates::custom();
        let cfg = apply(&cfg, "tasks.CustomTask.mne_task", json!("My Task!"));
        assert_eq!(cfg.key, "My_Task");
        assert_eq!(cfg.task.mne_task, "My Task!");

        // Same sanitised name: value changes, key does not.
        let cfg = apply(&cfg, "tasks.My_Task.mne_task", json!("My_Task"));
        assert_eq!(cfg.key, "My_Task");
        assert_eq!(cfg.task.mne_task, "My_Task");

        // Nothing usable left: key stays.
        let cfg = apply(&cfg, "tasks.My_Task.mne_task", json!("!!"));
        assert_eq!(cfg.key, "My_Task");
        assert_eq!(cfg.task.mne_task, "!!");
    }

    #[test]
    fn non_text_identifier_is_rejected() {
        let cfg = rest();
        assert!(matches!(
            try_apply(&cfg, "tasks.RestingState.mne_task", json!(3)),
            Err(MutateError::ExpectedString { .. })
        ));
    }

    #[test]
    fn dataset_fields_accept_null() {
        let cfg = apply(&rest(), "tasks.RestingState.dataset_name", json!("rest_2024"));
        assert_eq!(cfg.task.dataset_name.as_deref(), Some("rest_2024"));
        let cfg = apply(&cfg, "tasks.RestingState.dataset_name", Value::Null);
        assert_eq!(cfg.task.dataset_name, None);
    }
}
