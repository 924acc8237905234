//! Type normalisation of the settings tree.
//!
//! While a task is being edited, list fields may hold `"E1, E2"` and numeric
//! fields may hold `"250"`.  [`normalize_task`] rewrites those into their real
//! types before generation, and is also the equivalence used to compare a
//! tree with what the reverse parser gives back.
//!
//! Policy for values that do not coerce: they are left exactly as they are.
//! Reporting them is the validator's job.
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::model::{Settings, Task};

/// Settings-relative paths whose values are lists.
pub const LIST_PATHS: &[&str] = &[
    "drop_outerlayer.value",
    "eog_step.value",
    "filtering.value.notch_freqs",
    "epoch_settings.remove_baseline.window",
    "component_rejection.value.ic_flags_to_reject",
];

/// Settings-relative paths whose values are numbers.
pub const NUMERIC_PATHS: &[&str] = &[
    "resample_step.value",
    "trim_step.value",
    "crop_step.value.start",
    "crop_step.value.end",
    "filtering.value.l_freq",
    "filtering.value.h_freq",
    "filtering.value.notch_widths",
    "ICA.value.n_components",
    "component_rejection.value.ic_rejection_threshold",
    "component_rejection.value.psd_fmax",
    "epoch_settings.value.tmin",
    "epoch_settings.value.tmax",
    "epoch_settings.threshold_rejection.volt_threshold.eeg",
];

pub const EVENT_ID_PATH: &str = "epoch_settings.event_id";

// ── Scalars ──────────────────────────────────────────────────────────────

/// Parse a whole token as a number.
///
/// Integers stay integers (`"250"` → `250`), everything else that reads as a
/// finite float becomes a float (`"150e-6"` → `0.00015`).  Partial matches
/// such as `"12abc"` are not numbers.
pub fn parse_number(token: &str) -> Option<Number> {
    let t = token.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(i) = t.parse::<i64>() {
        return Some(Number::from(i));
    }
    t.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Numeric view of a value that is either a number or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s).and_then(|n| n.as_f64()),
        _ => None,
    }
}

/// Coerce one list token: `null` (any case) → null, numbers → numbers,
/// anything else stays a string.
pub fn coerce_token(token: &str) -> Value {
    let t = token.trim();
    if t.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    match parse_number(t) {
        Some(n) => Value::Number(n),
        None => Value::String(t.to_string()),
    }
}

// ── Lists ────────────────────────────────────────────────────────────────

/// Split a comma-separated editing string into a typed list.
///
/// ```
/// use exgcfg::coerce::split_list;
/// use serde_json::json;
/// assert_eq!(split_list("1, 2, null, foo"), json!([1, 2, null, "foo"]));
/// assert_eq!(split_list("  "), json!([]));
/// ```
pub fn split_list(text: &str) -> Value {
    Value::Array(
        text.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(coerce_token)
            .collect(),
    )
}

/// Normalised form of a list-like field, or `None` when it is neither a
/// string nor an array (left untouched).
pub fn coerce_list(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => Some(split_list(s)),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => coerce_token(s),
                    other => other.clone(),
                })
                .collect(),
        )),
        _ => None,
    }
}

/// Normalised form of a numeric field, or `None` when it should be left as is.
pub fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => parse_number(s).map(Value::Number),
        _ => None,
    }
}

// ── Event ids ────────────────────────────────────────────────────────────

/// Convert the editing form of `event_id` into what the pipeline expects.
///
/// * `["DIN8", "DIN9"]` → `{"DIN8": 1, "DIN9": 2}`
/// * `[]`, `null`, blank string → `null` (fixed-length epoching)
/// * a JSON mapping string → that mapping
///
/// Anything else is returned unchanged.
pub fn event_id_mapping(value: &Value) -> Value {
    match value {
        Value::Array(items) if items.is_empty() => Value::Null,
        Value::Array(items) => {
            let mut map = Map::new();
            for (i, item) in items.iter().enumerate() {
                let marker = match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                map.insert(marker, Value::from(i as u64 + 1));
            }
            Value::Object(map)
        }
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => {
                debug!(event_id = %s, "event_id string is not a mapping, leaving as is");
                value.clone()
            }
        },
        other => other.clone(),
    }
}

/// Inverse of [`event_id_mapping`] for mappings it produced: the keys, when
/// the values are exactly `1, 2, …, n` in order.
pub fn markers_from_mapping(map: &Map<String, Value>) -> Option<Vec<String>> {
    if map.is_empty() {
        return None;
    }
    map.iter()
        .enumerate()
        .map(|(i, (marker, id))| (id.as_u64() == Some(i as u64 + 1)).then(|| marker.clone()))
        .collect()
}

// ── Tree passes ──────────────────────────────────────────────────────────

/// Apply every normalisation pass to a settings tree in place.
pub fn normalize_settings(settings: &mut Settings) {
    for path in LIST_PATHS {
        update(settings, path, coerce_list);
    }
    for path in NUMERIC_PATHS {
        update(settings, path, coerce_number);
    }
    update(settings, EVENT_ID_PATH, |v| Some(event_id_mapping(v)));
}

/// A normalised copy of `task`.
pub fn normalize_task(task: &Task) -> Task {
    let mut out = task.clone();
    if let Some(settings) = out.settings.as_mut() {
        normalize_settings(settings);
    }
    out
}

/// Replace the value at a settings-relative dotted path when `f` yields one.
/// Missing path segments are skipped silently.
fn update(settings: &mut Settings, path: &str, f: impl FnOnce(&Value) -> Option<Value>) {
    let mut parts = path.split('.');
    let Some(first) = parts.next() else { return };
    let Some(mut current) = settings.get_mut(first) else { return };
    for part in parts {
        current = match current {
            Value::Object(map) => match map.get_mut(part) {
                Some(next) => next,
                None => return,
            },
            _ => return,
        };
    }
    if current.is_null() {
        return;
    }
    if let Some(replacement) = f(current) {
        *current = replacement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_keep_integer_and_float_flavour() {
        assert_eq!(parse_number("250"), Some(Number::from(250)));
        assert_eq!(parse_number(" -1 "), Some(Number::from(-1)));
        assert_eq!(parse_number("150e-6").and_then(|n| n.as_f64()), Some(150e-6));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn list_string_is_split_and_typed() {
        assert_eq!(coerce_list(&json!("1, 2, null, foo")), Some(json!([1, 2, null, "foo"])));
        assert_eq!(coerce_list(&json!("E1,, E2 ,")), Some(json!(["E1", "E2"])));
        assert_eq!(coerce_list(&json!(["NULL", "3", 4])), Some(json!([null, 3, 4])));
        assert_eq!(coerce_list(&json!(5)), None);
    }

    #[test]
    fn numeric_string_is_replaced_only_when_it_parses() {
        assert_eq!(coerce_number(&json!("0.5")), Some(json!(0.5)));
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!(3)), None);
    }

    #[test]
    fn event_ids_become_one_based_mapping() {
        assert_eq!(event_id_mapping(&json!(["DIN8", "DIN9"])), json!({ "DIN8": 1, "DIN9": 2 }));
        assert_eq!(event_id_mapping(&json!([])), Value::Null);
        assert_eq!(event_id_mapping(&json!("  ")), Value::Null);
        assert_eq!(event_id_mapping(&json!(r#"{"a": 5}"#)), json!({ "a": 5 }));
        assert_eq!(event_id_mapping(&json!("[1]")), json!("[1]"));
    }

    #[test]
    fn markers_recovered_only_from_sequential_mapping() {
        let seq = json!({ "DIN8": 1, "DIN9": 2 });
        assert_eq!(
            markers_from_mapping(seq.as_object().unwrap()),
            Some(vec!["DIN8".to_string(), "DIN9".to_string()])
        );
        let custom = json!({ "DIN8": 4 });
        assert_eq!(markers_from_mapping(custom.as_object().unwrap()), None);
    }

    #[test]
    fn normalize_settings_touches_only_known_paths() {
        let mut s = json!({
            "resample_step": { "enabled": true, "value": "500" },
            "eog_step": { "enabled": true, "value": "1, 32" },
            "trim_step": { "enabled": true, "value": "four" },
            "montage": { "enabled": true, "value": "123" },
            "epoch_settings": { "enabled": true, "event_id": ["DIN8"] }
        })
        .as_object()
        .cloned()
        .unwrap();
        normalize_settings(&mut s);
        assert_eq!(s["resample_step"]["value"], json!(500));
        assert_eq!(s["eog_step"]["value"], json!([1, 32]));
        assert_eq!(s["trim_step"]["value"], json!("four"));
        assert_eq!(s["montage"]["value"], json!("123"));
        assert_eq!(s["epoch_settings"]["event_id"], json!({ "DIN8": 1 }));
    }
}
