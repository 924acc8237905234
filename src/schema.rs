//! Per-step shape table.
//!
//! Each known step is described as a record of typed fields with defaults.
//! The reverse parser uses it to rebuild a settings tree from a dict literal
//! of unknown quality: missing fields get their default, a wrongly typed
//! scalar is kept as written (disabled steps may hold raw editing text),
//! flags and records of the wrong type are replaced by their default, fields
//! the table does not know are kept verbatim, and steps the table does not
//! know pass through untouched.
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::coerce::markers_from_mapping;
use crate::model::Settings;

/// Expected type of one field, with its default.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Flag(bool),
    /// Number, never null.
    Number(Value),
    /// Number or `null`; defaults to `null`.
    OptNumber,
    Text(&'static str),
    /// Array; defaults to `[]`.
    List,
    /// Array or `null`; defaults to `null`.
    OptList,
    /// Two-slot baseline window; defaults to `[null, 0]`.
    Window,
    /// Object; defaults to `{}`.
    Mapping,
    /// Epoching event ids, see [`event_id_for_editing`].
    EventId,
    /// Anything at all, with the given default.
    Any(Value),
    Record(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: &'static str,
    pub kind: Kind,
}

fn field(key: &'static str, kind: Kind) -> Field {
    Field { key, kind }
}

impl Kind {
    pub fn default_value(&self) -> Value {
        match self {
            Kind::Flag(b) => Value::Bool(*b),
            Kind::Number(v) | Kind::Any(v) => v.clone(),
            Kind::OptNumber | Kind::OptList | Kind::EventId => Value::Null,
            Kind::Text(s) => Value::String(s.to_string()),
            Kind::List => json!([]),
            Kind::Window => json!([null, 0]),
            Kind::Mapping => json!({}),
            Kind::Record(fields) => Value::Object(
                fields.iter().map(|f| (f.key.to_string(), f.kind.default_value())).collect(),
            ),
        }
    }

    fn accepts(&self, v: &Value) -> bool {
        match self {
            Kind::Flag(_) => v.is_boolean(),
            Kind::Number(_) => v.is_number(),
            Kind::OptNumber => v.is_number() || v.is_null(),
            Kind::Text(_) => v.is_string(),
            Kind::List | Kind::Window => v.is_array(),
            Kind::OptList => v.is_array() || v.is_null(),
            Kind::Mapping | Kind::Record(_) => v.is_object(),
            Kind::EventId | Kind::Any(_) => true,
        }
    }

    /// Bring a parsed value into this shape.
    pub fn reconcile(&self, parsed: &Value) -> Value {
        if !self.accepts(parsed) {
            let scalar = matches!(parsed, Value::String(_) | Value::Number(_) | Value::Null);
            if scalar && !matches!(self, Kind::Flag(_) | Kind::Record(_)) {
                debug!(expected = ?self, found = %parsed, "keeping scalar of unexpected type");
                return parsed.clone();
            }
            debug!(expected = ?self, found = %parsed, "field has unexpected type, using default");
            return self.default_value();
        }
        match self {
            Kind::Record(fields) => reconcile_record(fields, parsed),
            Kind::EventId => event_id_for_editing(parsed),
            _ => parsed.clone(),
        }
    }
}

/// Fields of a known step, or `None` for steps this table does not cover.
pub fn step(name: &str) -> Option<Vec<Field>> {
    let enabled = || field("enabled", Kind::Flag(false));
    let fields = match name {
        "resample_step" => vec![enabled(), field("value", Kind::Number(json!(500)))],
        "filtering" => vec![
            enabled(),
            field(
                "value",
                Kind::Record(vec![
                    field("l_freq", Kind::OptNumber),
                    field("h_freq", Kind::OptNumber),
                    field("notch_freqs", Kind::OptList),
                    field("notch_widths", Kind::OptNumber),
                ]),
            ),
        ],
        "drop_outerlayer" | "eog_step" => vec![enabled(), field("value", Kind::List)],
        "trim_step" => vec![enabled(), field("value", Kind::Number(json!(0)))],
        "crop_step" => vec![
            enabled(),
            field(
                "value",
                Kind::Record(vec![field("start", Kind::OptNumber), field("end", Kind::OptNumber)]),
            ),
        ],
        "reference_step" => vec![enabled(), field("value", Kind::Any(json!("average")))],
        "montage" => vec![enabled(), field("value", Kind::Text(""))],
        "ICA" => vec![
            enabled(),
            field(
                "value",
                Kind::Record(vec![
                    field("method", Kind::Text("infomax")),
                    field("n_components", Kind::OptNumber),
                    field("fit_params", Kind::Record(vec![field("extended", Kind::Flag(false))])),
                ]),
            ),
        ],
        "component_rejection" => vec![
            enabled(),
            field("method", Kind::Text("iclabel")),
            field(
                "value",
                Kind::Record(vec![
                    field("ic_flags_to_reject", Kind::List),
                    field("ic_rejection_threshold", Kind::Number(json!(0.3))),
                    field("ic_rejection_overrides", Kind::Mapping),
                    field("psd_fmax", Kind::OptNumber),
                ]),
            ),
        ],
        "ICLabel" => vec![
            enabled(),
            field(
                "value",
                Kind::Record(vec![
                    field("ic_flags_to_reject", Kind::List),
                    field("ic_rejection_threshold", Kind::Number(json!(0.8))),
                ]),
            ),
        ],
        "epoch_settings" => vec![
            enabled(),
            field(
                "value",
                Kind::Record(vec![field("tmin", Kind::OptNumber), field("tmax", Kind::OptNumber)]),
            ),
            field("event_id", Kind::EventId),
            field(
                "remove_baseline",
                Kind::Record(vec![field("enabled", Kind::Flag(false)), field("window", Kind::Window)]),
            ),
            field(
                "threshold_rejection",
                Kind::Record(vec![
                    field("enabled", Kind::Flag(false)),
                    field(
                        "volt_threshold",
                        Kind::Record(vec![field("eeg", Kind::Any(Value::Null))]),
                    ),
                ]),
            ),
        ],
        _ => return None,
    };
    Some(fields)
}

/// Rebuild a whole settings tree, step by step, keeping the parsed order.
pub fn reconcile_settings(parsed: &Map<String, Value>) -> Settings {
    parsed
        .iter()
        .map(|(name, value)| {
            let rebuilt = match step(name) {
                Some(fields) => reconcile_record(&fields, value),
                None => value.clone(),
            };
            (name.clone(), rebuilt)
        })
        .collect()
}

/// Parsed keys first, in their order; then any missing known field.
fn reconcile_record(fields: &[Field], parsed: &Value) -> Value {
    let empty = Map::new();
    let parsed = parsed.as_object().unwrap_or(&empty);
    let mut out = Map::new();
    for (key, value) in parsed {
        let rebuilt = match fields.iter().find(|f| f.key == key) {
            Some(f) => f.kind.reconcile(value),
            None => value.clone(),
        };
        out.insert(key.clone(), rebuilt);
    }
    for f in fields {
        if !out.contains_key(f.key) {
            out.insert(f.key.to_string(), f.kind.default_value());
        }
    }
    Value::Object(out)
}

/// The editing form of a parsed `event_id`.
///
/// A mapping the generator produced from a marker list (`{'DIN8': 1,
/// 'DIN9': 2}`) becomes that list again; any other mapping is kept as its
/// JSON text; `null`, lists and strings are left alone.
pub fn event_id_for_editing(parsed: &Value) -> Value {
    match parsed {
        Value::Object(map) if map.is_empty() => Value::Null,
        Value::Object(map) => match markers_from_mapping(map) {
            Some(markers) => Value::Array(markers.into_iter().map(Value::String).collect()),
            None => Value::String(parsed.to_string()),
        },
        other => other.clone(),
    }
}
