mod common;
use common::{set, settings_path};
use exgcfg::{apply, templates, validate, validate_parsed, Config};
use pretty_assertions::assert_eq;
use serde_json::json;

fn rest() -> Config {
    templates::template("RestingState").unwrap()
}

#[test]
fn ic_rejection_threshold_must_be_a_fraction() {
    let cfg = rest();
    let key = settings_path(&cfg, "component_rejection.value.ic_rejection_threshold");

    let bad = set(&cfg, "component_rejection.value.ic_rejection_threshold", json!(1.5));
    assert_eq!(
        validate(&bad).get(&key).map(String::as_str),
        Some("IC rejection threshold must be between 0 and 1.")
    );

    let good = set(&cfg, "component_rejection.value.ic_rejection_threshold", json!(0.3));
    assert!(validate(&good).is_empty());
}

#[test]
fn high_pass_above_low_pass_is_flagged_on_h_freq() {
    let cfg = rest();
    let inverted = set(&cfg, "filtering.value.l_freq", json!(100));
    let inverted = set(&inverted, "filtering.value.h_freq", json!(50));
    let errors = validate(&inverted);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.get(&settings_path(&cfg, "filtering.value.h_freq")).map(String::as_str),
        Some("High frequency must be greater than low frequency.")
    );

    let fine = set(&cfg, "filtering.value.l_freq", json!(50));
    let fine = set(&fine, "filtering.value.h_freq", json!(100));
    assert!(validate(&fine).is_empty());

    let open_ended = set(&inverted, "filtering.value.h_freq", json!(null));
    assert!(validate(&open_ended).is_empty());
}

#[test]
fn task_name_is_required() {
    let cfg = apply(&rest(), "tasks.RestingState.mne_task", json!(""));
    assert_eq!(
        validate(&cfg).get("tasks.RestingState.mne_task").map(String::as_str),
        Some("Task name is required.")
    );
}

#[test]
fn unknown_classification_method() {
    let cfg = set(&rest(), "component_rejection.method", json!("manual"));
    assert!(validate(&cfg).contains_key(&settings_path(&cfg, "component_rejection.method")));
    let off = set(&cfg, "component_rejection.enabled", json!(false));
    assert!(validate(&off).is_empty());
}

#[test]
fn overrides_and_optional_numbers() {
    let cfg = rest();
    let cfg = set(&cfg, "component_rejection.value.ic_rejection_overrides", json!({ "muscle": 0.9 }));
    assert!(validate(&cfg).is_empty());
    let cfg = set(&cfg, "component_rejection.value.ic_rejection_overrides.eog", json!(2));
    assert!(validate(&cfg)
        .contains_key(&settings_path(&cfg, "component_rejection.value.ic_rejection_overrides")));

    let cfg = set(&rest(), "ICA.value.n_components", json!("15"));
    assert!(validate(&cfg).is_empty());
    let cfg = set(&cfg, "ICA.value.n_components", json!(0));
    assert!(validate(&cfg).contains_key(&settings_path(&cfg, "ICA.value.n_components")));
}

#[test]
fn crop_and_epoch_windows() {
    let cfg = set(&rest(), "crop_step.enabled", json!(true));
    assert!(validate(&cfg).is_empty());
    let cfg = set(&cfg, "crop_step.value.end", json!(0));
    assert!(validate(&cfg).contains_key(&settings_path(&cfg, "crop_step.value.end")));

    let cfg = set(&rest(), "epoch_settings.value.tmin", json!(2));
    assert_eq!(
        validate(&cfg).get(&settings_path(&cfg, "epoch_settings.value.tmax")).map(String::as_str),
        Some("Epoch tmax must be greater than tmin.")
    );
}

#[test]
fn legacy_iclabel_step() {
    let mut cfg = rest();
    cfg.task.settings.as_mut().unwrap().insert(
        "ICLabel".into(),
        json!({ "enabled": true, "value": { "ic_flags_to_reject": ["eog"], "ic_rejection_threshold": 1.2 } }),
    );
    assert!(validate(&cfg).contains_key(&settings_path(&cfg, "ICLabel.value.ic_rejection_threshold")));
}

#[test]
fn parsed_gate_accepts_templates() {
    for cfg in templates::all() {
        assert!(validate_parsed(&cfg).is_empty(), "{}", cfg.key);
    }
}
