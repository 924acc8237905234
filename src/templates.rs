//! Built-in task templates.
//!
//! Every template is built fresh on each call, so callers always receive an
//! independent deep copy they may mutate freely.  All templates carry every
//! field of [`crate::schema`], which is what makes them survive a
//! generate → parse round-trip unchanged.
use serde_json::{json, Value};

use crate::model::{Config, Settings, Task, FALLBACK_IDENTIFIER};

/// Names accepted by [`template`], in presentation order.
pub const TEMPLATE_NAMES: &[&str] = &["RestingState", "EventBased"];

/// Look up a built-in template by name.
pub fn template(name: &str) -> Option<Config> {
    let task = match name {
        "RestingState" => resting_state(),
        "EventBased" => event_based(),
        _ => return None,
    };
    Some(Config::new(name, task))
}

/// Every built-in template, including the custom starting point.
pub fn all() -> Vec<Config> {
    TEMPLATE_NAMES
        .iter()
        .filter_map(|name| template(name))
        .chain(std::iter::once(custom()))
        .collect()
}

/// Starting point for a task built from scratch.
pub fn custom() -> Config {
    Config::new(
        FALLBACK_IDENTIFIER,
        Task {
            mne_task: FALLBACK_IDENTIFIER.to_string(),
            description: "Custom task configuration".to_string(),
            dataset_name: None,
            input_path: None,
            settings: Some(settings(
                json!({ "enabled": false, "value": [] }),
                json!({ "enabled": false, "value": [] }),
                json!({ "enabled": false, "value": { "start": 0, "end": null } }),
                json!(true),
                json!({ "tmin": -1, "tmax": 1 }),
                Value::Null,
            )),
        },
    )
}

fn resting_state() -> Task {
    Task {
        mne_task: "RestingState".to_string(),
        description: "Resting state EEG recording".to_string(),
        dataset_name: None,
        input_path: None,
        settings: Some(settings(
            json!({ "enabled": false, "value": [] }),
            json!({ "enabled": false, "value": [1, 32, 8, 14, 17, 21, 25, 125, 126, 127, 128] }),
            json!({ "enabled": false, "value": { "start": 0, "end": 60 } }),
            json!(true),
            json!({ "tmin": -1, "tmax": 1 }),
            Value::Null,
        )),
    }
}

fn event_based() -> Task {
    Task {
        mne_task: "EventBased".to_string(),
        description: "Event-based EEG paradigm with stimulus triggers".to_string(),
        dataset_name: None,
        input_path: None,
        settings: Some(settings(
            json!({
                "enabled": false,
                "value": [
                    "E17", "E38", "E43", "E44", "E48", "E49", "E113", "E114", "E119",
                    "E120", "E121", "E56", "E63", "E68", "E73", "E81", "E88", "E94",
                    "E99", "E107"
                ]
            }),
            json!({ "enabled": false, "value": [] }),
            json!({ "enabled": false, "value": { "start": 0, "end": 120 } }),
            json!(false),
            json!({ "tmin": -0.5, "tmax": 2.5 }),
            json!(["DIN8"]),
        )),
    }
}

/// The step tree shared by all templates; only the listed parts vary.
fn settings(
    drop_outerlayer: Value,
    eog_step: Value,
    crop_step: Value,
    reference_enabled: Value,
    epoch_window: Value,
    event_id: Value,
) -> Settings {
    let tree = json!({
        "resample_step": { "enabled": true, "value": 250 },
        "filtering": {
            "enabled": true,
            "value": {
                "l_freq": 1,
                "h_freq": 100,
                "notch_freqs": [60, 120],
                "notch_widths": 5
            }
        },
        "drop_outerlayer": drop_outerlayer,
        "eog_step": eog_step,
        "trim_step": { "enabled": true, "value": 4 },
        "crop_step": crop_step,
        "reference_step": { "enabled": reference_enabled, "value": "average" },
        "montage": { "enabled": true, "value": "GSN-HydroCel-129" },
        "ICA": {
            "enabled": true,
            "value": {
                "method": "infomax",
                "n_components": null,
                "fit_params": { "extended": true }
            }
        },
        "component_rejection": {
            "enabled": true,
            "method": "iclabel",
            "value": {
                "ic_flags_to_reject": ["muscle", "heart", "eog", "ch_noise", "line_noise"],
                "ic_rejection_threshold": 0.3,
                "ic_rejection_overrides": {},
                "psd_fmax": 50
            }
        },
        "epoch_settings": {
            "enabled": true,
            "value": epoch_window,
            "event_id": event_id,
            "remove_baseline": { "enabled": false, "window": [null, 0] },
            "threshold_rejection": { "enabled": false, "volt_threshold": { "eeg": 125e-6 } }
        }
    });
    match tree {
        Value::Object(map) => map,
        _ => Settings::new(),
    }
}
