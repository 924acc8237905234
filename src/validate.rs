//! Field-level validation.
//!
//! [`validate`] walks the loaded task and returns path → message for every
//! out-of-range or malformed value.  Checks are step-scoped: a step whose
//! `enabled` flag is not `true` is skipped entirely, as are nested sections
//! (`remove_baseline`, `threshold_rejection`) that are themselves disabled.
//!
//! Numeric fields are checked on their coerced value, so `"250"` is as good
//! as `250`; `"abc"` is reported here rather than silently dropped by the
//! generator.
//!
//! [`validate_parsed`] is a different, shallow gate used after an upload.
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::coerce::{as_number, coerce_list};
use crate::model::{Config, Task, ValidationErrors};

/// Comma/whitespace separated channel names.
static CHANNEL_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Za-z0-9_-]+[,\s]*)*$").expect("valid regex"));

/// Component classifiers the generator knows how to call.
pub const CLASSIFICATION_METHODS: &[&str] = &["iclabel", "icvision"];

/// Validate every enabled step of the loaded task.
pub fn validate(config: &Config) -> ValidationErrors {
    let mut check = Checker {
        task: &config.task,
        settings_path: config.settings_path(),
        errors: ValidationErrors::new(),
    };

    if config.task.mne_task.trim().is_empty() {
        check
            .errors
            .insert(format!("{}.mne_task", config.base_path()), "Task name is required.".into());
    }

    if config.task.settings.is_some() {
        check.resample();
        check.filtering();
        check.trim_and_crop();
        check.channel_lists();
        check.ica();
        check.component_rejection();
        check.legacy_iclabel();
        check.epochs();
    }
    check.errors
}

/// Shallow completeness check for a freshly parsed upload.
///
/// Returns the reasons the task is unusable; empty means it can be loaded.
pub fn validate_parsed(config: &Config) -> Vec<String> {
    let mut reasons = Vec::new();
    if config.task.mne_task.trim().is_empty() {
        reasons.push("Task name is missing".to_string());
    }
    if config.task.description.trim().is_empty() {
        reasons.push("Task description is missing".to_string());
    }
    if config.task.settings.is_none() {
        reasons.push("Task settings are missing".to_string());
    }
    reasons
}

struct Checker<'a> {
    task: &'a Task,
    settings_path: String,
    errors: ValidationErrors,
}

impl Checker<'_> {
    fn get(&self, rel: &str) -> Option<&Value> {
        self.task.setting(rel)
    }

    /// Present and not `null`.
    fn given(&self, rel: &str) -> Option<&Value> {
        self.get(rel).filter(|v| !v.is_null())
    }

    fn enabled(&self, rel: &str) -> bool {
        self.get(&format!("{rel}.enabled")) == Some(&Value::Bool(true))
    }

    fn fail(&mut self, rel: &str, msg: &str) {
        self.errors.insert(format!("{}.{rel}", self.settings_path), msg.to_string());
    }

    /// Optional number that must satisfy `ok` when present and non-null.
    fn optional_number(&mut self, rel: &str, ok: impl Fn(f64) -> bool, msg: &str) {
        if let Some(v) = self.given(rel) {
            if !as_number(v).is_some_and(&ok) {
                self.fail(rel, msg);
            }
        }
    }

    /// Required number that must satisfy `ok`.
    fn required_number(&mut self, rel: &str, ok: impl Fn(f64) -> bool, msg: &str) {
        if !self.get(rel).and_then(as_number).is_some_and(ok) {
            self.fail(rel, msg);
        }
    }

    // ── Steps ────────────────────────────────────────────────────────────

    fn resample(&mut self) {
        if self.enabled("resample_step") {
            self.required_number(
                "resample_step.value",
                |v| v > 0.0,
                "Resample value must be a positive number.",
            );
        }
    }

    fn filtering(&mut self) {
        if !self.enabled("filtering") || self.given("filtering.value").is_none() {
            return;
        }
        self.optional_number(
            "filtering.value.l_freq",
            |v| v >= 0.0,
            "Low frequency must be a positive number or null.",
        );
        self.optional_number(
            "filtering.value.h_freq",
            |v| v > 0.0,
            "High frequency must be a positive number or null.",
        );
        let low = self.given("filtering.value.l_freq").and_then(as_number);
        let high = self.given("filtering.value.h_freq").and_then(as_number);
        if let (Some(l), Some(h)) = (low, high) {
            if h <= l {
                self.fail(
                    "filtering.value.h_freq",
                    "High frequency must be greater than low frequency.",
                );
            }
        }
        self.optional_number(
            "filtering.value.notch_widths",
            |v| v > 0.0,
            "Notch width must be a positive number.",
        );
        if let Some(freqs) = self.given("filtering.value.notch_freqs") {
            let all_numbers = coerce_list(freqs).is_some_and(|list| {
                list.as_array()
                    .is_some_and(|items| items.iter().all(|i| as_number(i).is_some_and(|f| f > 0.0)))
            });
            if !all_numbers {
                self.fail(
                    "filtering.value.notch_freqs",
                    "Notch frequencies must be a comma-separated list of positive numbers.",
                );
            }
        }
    }

    fn trim_and_crop(&mut self) {
        if self.enabled("trim_step") {
            self.required_number(
                "trim_step.value",
                |v| v >= 0.0,
                "Trim value must be a non-negative number.",
            );
        }
        if self.enabled("crop_step") {
            self.optional_number(
                "crop_step.value.start",
                |v| v >= 0.0,
                "Crop start must be a non-negative number or null.",
            );
            self.optional_number(
                "crop_step.value.end",
                |v| v > 0.0,
                "Crop end must be a positive number or null.",
            );
            let start = self.given("crop_step.value.start").and_then(as_number);
            let end = self.given("crop_step.value.end").and_then(as_number);
            if let (Some(s), Some(e)) = (start, end) {
                if e <= s {
                    self.fail("crop_step.value.end", "Crop end must be greater than crop start.");
                }
            }
        }
    }

    fn channel_lists(&mut self) {
        if self.enabled("drop_outerlayer") {
            match self.get("drop_outerlayer.value") {
                Some(Value::String(s)) if !CHANNEL_LIST.is_match(s.trim()) => self.fail(
                    "drop_outerlayer.value",
                    "Enter comma-separated channel names (alphanumeric, _, - allowed).",
                ),
                Some(Value::Array(items)) if items.iter().any(|i| !i.is_string()) => {
                    self.fail("drop_outerlayer.value", "Invalid format for channel list.")
                }
                _ => {}
            }
        }
        if self.enabled("eog_step") {
            match self.get("eog_step.value") {
                Some(Value::String(s)) if !CHANNEL_LIST.is_match(s.trim()) => self.fail(
                    "eog_step.value",
                    "Enter comma-separated EOG channel indices or names (alphanumeric, _, - allowed).",
                ),
                Some(Value::Array(items))
                    if items.iter().any(|i| !(i.is_number() || i.is_string())) =>
                {
                    self.fail("eog_step.value", "Invalid format for EOG channel list.")
                }
                _ => {}
            }
        }
    }

    fn ica(&mut self) {
        if !self.enabled("ICA") || self.given("ICA.value").is_none() {
            return;
        }
        let method_ok = self
            .get("ICA.value.method")
            .and_then(Value::as_str)
            .is_some_and(|m| !m.trim().is_empty());
        if !method_ok {
            self.fail("ICA.value.method", "ICA method is required.");
        }
        self.optional_number(
            "ICA.value.n_components",
            |v| v > 0.0,
            "Number of ICA components must be a positive number or null for automatic.",
        );
        self.optional_number(
            "ICA.value.temp_highpass_for_ica",
            |v| v > 0.0,
            "Temporary highpass must be a positive number or null.",
        );
    }

    fn component_rejection(&mut self) {
        if !self.enabled("component_rejection") {
            return;
        }
        let method_ok = self
            .get("component_rejection.method")
            .and_then(Value::as_str)
            .is_some_and(|m| CLASSIFICATION_METHODS.contains(&m));
        if !method_ok {
            self.fail(
                "component_rejection.method",
                "Component classification method must be 'iclabel' or 'icvision'.",
            );
        }
        if self.given("component_rejection.value").is_none() {
            return;
        }
        self.required_number(
            "component_rejection.value.ic_rejection_threshold",
            unit_interval,
            "IC rejection threshold must be between 0 and 1.",
        );
        if let Some(overrides) = self.given("component_rejection.value.ic_rejection_overrides") {
            let ok = overrides.as_object().is_some_and(|map| {
                map.values().all(|v| v.as_f64().is_some_and(unit_interval))
            });
            if !ok {
                self.fail(
                    "component_rejection.value.ic_rejection_overrides",
                    "Override values must be between 0 and 1.",
                );
            }
        }
        self.optional_number(
            "component_rejection.value.psd_fmax",
            |v| v > 0.0,
            "PSD fmax must be a positive number.",
        );
    }

    fn legacy_iclabel(&mut self) {
        if self.enabled("ICLabel") && self.given("ICLabel.value").is_some() {
            self.optional_number(
                "ICLabel.value.ic_rejection_threshold",
                unit_interval,
                "IC rejection threshold must be between 0 and 1.",
            );
        }
    }

    fn epochs(&mut self) {
        if !self.enabled("epoch_settings") {
            return;
        }
        self.optional_number("epoch_settings.value.tmin", f64::is_finite, "Epoch tmin must be a number.");
        self.optional_number("epoch_settings.value.tmax", f64::is_finite, "Epoch tmax must be a number.");
        let tmin = self.given("epoch_settings.value.tmin").and_then(as_number);
        let tmax = self.given("epoch_settings.value.tmax").and_then(as_number);
        if let (Some(lo), Some(hi)) = (tmin, tmax) {
            if hi <= lo {
                self.fail("epoch_settings.value.tmax", "Epoch tmax must be greater than tmin.");
            }
        }

        match self.get("epoch_settings.event_id") {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                match serde_json::from_str::<Value>(s) {
                    Ok(Value::Object(_)) => {}
                    Ok(_) => self.fail(
                        "epoch_settings.event_id",
                        "Event ID must be a valid YAML/JSON dictionary string (e.g., {\"DIN8\": 1}).",
                    ),
                    Err(_) => self.fail(
                        "epoch_settings.event_id",
                        "Invalid Event ID format. Must be a valid YAML/JSON dictionary string.",
                    ),
                }
            }
            Some(Value::Array(items)) => {
                let ok = {
                    let mut seen = HashSet::new();
                    items.iter().all(|i| {
                        i.as_str().is_some_and(|s| !s.trim().is_empty() && seen.insert(s))
                    })
                };
                if !ok {
                    self.fail(
                        "epoch_settings.event_id",
                        "Event IDs must be distinct, non-empty marker names.",
                    );
                }
            }
            _ => {}
        }

        if self.enabled("epoch_settings.remove_baseline") {
            let ok = match self.get("epoch_settings.remove_baseline.window").and_then(coerce_list) {
                Some(Value::Array(items)) => {
                    items.len() == 2 && items.iter().all(|v| v.is_null() || v.is_number())
                }
                _ => false,
            };
            if !ok {
                self.fail(
                    "epoch_settings.remove_baseline.window",
                    "Baseline window must be an array of two numbers or null (e.g., [-0.1, 0] or [null, 0]).",
                );
            }
        }

        if self.enabled("epoch_settings.threshold_rejection") {
            let rel = "epoch_settings.threshold_rejection.volt_threshold.eeg";
            match self.get(rel) {
                None | Some(Value::Null) => {
                    self.fail(rel, "EEG Threshold must be a valid number (e.g., 150e-6).")
                }
                Some(Value::String(s)) if s.trim().is_empty() => {
                    self.fail(rel, "EEG Threshold must be a valid number (e.g., 150e-6).")
                }
                Some(v) => match as_number(v) {
                    None => self.fail(rel, "EEG Threshold must be a valid number (e.g., 150e-6)."),
                    Some(n) if n <= 0.0 => self.fail(rel, "EEG Threshold must be positive."),
                    Some(_) => {}
                },
            }
        }
    }
}

fn unit_interval(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}
