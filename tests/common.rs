/// Shared helpers for the integration tests.
use exgcfg::{apply, generate, normalize_task, parse, Config};
use serde_json::Value;

#[allow(unused)]
/// Edit a settings field by its path below `settings`.
pub fn set(cfg: &Config, rel: &str, value: Value) -> Config {
    apply(cfg, &format!("{}.{rel}", cfg.settings_path()), value)
}

#[allow(unused)]
/// Full path of a settings field, as the validator reports it.
pub fn settings_path(cfg: &Config, rel: &str) -> String {
    format!("{}.{rel}", cfg.settings_path())
}

#[allow(unused)]
/// `cfg` with its task passed through generator normalisation.
pub fn normalized(cfg: &Config) -> Config {
    Config::new(cfg.key.clone(), normalize_task(&cfg.task))
}

#[allow(unused)]
/// Generate, then parse the result back.
pub fn roundtrip(cfg: &Config) -> Config {
    let source = generate(cfg).expect("generation failed");
    parse(&source).unwrap_or_else(|| panic!("generated source did not parse:\n{source}"))
}

#[allow(unused)]
/// Numeric settings field as `f64`.
pub fn number(cfg: &Config, rel: &str) -> f64 {
    cfg.task
        .setting(rel)
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("{rel} is not a number"))
}
