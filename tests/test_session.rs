mod common;
use common::roundtrip;
use exgcfg::session::{FILE_GENERATION, PYTHON_MIME, REQUIRED};
use exgcfg::{generate, templates, Session, UploadError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;

fn event_based() -> Session {
    let mut session = Session::new();
    assert!(session.select_template("EventBased"));
    session
}

#[test]
fn non_python_upload_is_rejected_before_parsing() {
    let mut session = event_based();
    let before = session.config().cloned();
    let source = generate(&templates::template("RestingState").unwrap()).unwrap();

    assert_eq!(session.load_upload("config.txt", &source), Err(UploadError::NotPython));
    assert_eq!(session.config().cloned(), before);
    assert_eq!(
        UploadError::NotPython.to_string(),
        "Please select a Python configuration file (.py)"
    );
}

#[test]
fn unparseable_upload_keeps_current_task() {
    let mut session = event_based();
    let before = session.config().cloned();
    assert_eq!(
        session.load_upload("task.py", "print('not a task')"),
        Err(UploadError::Unparseable)
    );
    assert_eq!(session.config().cloned(), before);
}

#[test]
fn incomplete_upload_lists_the_gaps() {
    let mut session = event_based();
    let before = session.config().cloned();
    // A banner with nothing but whitespace where the description goes.
    let src = "# =====\n#  \t EEG PREPROCESSING CONFIGURATION\nconfig = {}\n\nclass A(Task):\n    pass\n";
    let err = session.load_upload("a.py", src).unwrap_err();
    assert_eq!(err, UploadError::Incomplete(vec!["Task description is missing".into()]));
    assert_eq!(err.to_string(), "Invalid configuration: Task description is missing");
    assert_eq!(session.config().cloned(), before);
}

#[test]
fn download_then_upload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = event_based();
    session.edit("tasks.EventBased.settings.epoch_settings.event_id", json!(["DIN8", "DIN9"]));

    let file = session.download().unwrap();
    assert_eq!(file.mime, PYTHON_MIME);
    assert_eq!(file.file_name, "eventbased.py");
    let path = dir.path().join(&file.file_name);
    fs::write(&path, &file.contents).unwrap();

    let mut other = Session::new();
    other.load_path(&path).unwrap();
    assert_eq!(other.config(), session.config());
    assert!(other.validate());
}

#[test]
fn load_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new();
    let err = session.load_path(&dir.path().join("absent.py")).unwrap_err();
    assert!(err.to_string().starts_with("reading "));
    assert!(session.config().is_none());
}

#[test]
fn required_field_liveness() {
    let mut session = event_based();
    session.edit("tasks.EventBased.mne_task", json!(""));
    assert_eq!(
        session.errors().get("tasks.EventBased.mne_task").map(String::as_str),
        Some(REQUIRED)
    );
    assert!(session.download().is_none());
    assert!(!session.errors().contains_key(FILE_GENERATION));

    session.edit("tasks.EventBased.mne_task", json!("Oddball"));
    assert_eq!(session.config().unwrap().key, "Oddball");
    assert!(session.download().is_some());
    assert!(session.errors().is_empty());
}

#[test]
fn preview_matches_generator() {
    let mut session = event_based();
    let cfg = session.config().cloned().unwrap();
    assert_eq!(session.preview(), Some(generate(&cfg).unwrap()));
    assert_eq!(roundtrip(&cfg), cfg);
}
