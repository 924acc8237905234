//! # exgcfg: autoclean EEG task files in Rust
//!
//! `exgcfg` is the core of an EEG preprocessing configuration wizard: it
//! edits a task's settings tree, validates it, renders it as an
//! [autoclean](https://github.com/cincibrainlab/autoclean_pipeline) Python
//! task file, and reads such a file back into a settings tree.
//!
//! ## Data flow
//!
//! ```text
//! templates::template("RestingState")      parse(source)  ← uploaded .py
//!   │                                           │
//!   └──────────────→ Config ←───────────────────┘
//!                      │
//!   ├─ apply(cfg, path, value)   copy-on-write edit, renames on mne_task
//!   ├─ validate(cfg)             path → message, enabled steps only
//!   ├─ normalize_task(task)      "1, 2" → [1, 2], "250" → 250, markers → ids
//!   └─ generate(cfg)             Python dict literal + task class
//!        │
//!        └─→ String   (restingstate.py)
//! ```
//!
//! Generated files parse back to the same tree: for every built-in template
//! `parse(&generate(&t)?)` yields `t` again.
//!
//! ## Quick start
//!
//! ```
//! use exgcfg::{apply, generate, parse, template, validate};
//! use serde_json::json;
//!
//! let cfg = template("EventBased").unwrap();
//! let path = format!("{}.resample_step.value", cfg.settings_path());
//! let cfg = apply(&cfg, &path, json!("500"));
//! assert!(validate(&cfg).is_empty());
//!
//! let source = generate(&cfg).unwrap();
//! assert!(source.contains("'value': 500"));
//!
//! let back = parse(&source).unwrap();
//! assert_eq!(back.task.setting("resample_step.value"), Some(&json!(500)));
//! ```
//!
//! ## Sessions
//!
//! [`Session`] wraps the same operations the way the wizard uses them:
//! live "required" checks on edit, upload gating, and the error keys the
//! preview and download panes read.

pub mod coerce;
pub mod error;
pub mod generate;
pub mod model;
pub mod mutate;
pub mod parse;
pub mod path;
pub mod schema;
pub mod script;
pub mod session;
pub mod templates;
pub mod validate;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// The operations a front end needs, available as `exgcfg::foo` without
// knowing the module layout.

// model
pub use model::{sanitize_identifier, Config, Settings, Task, ValidationErrors};

// errors
pub use error::{GenerateError, MutateError, ParseError, UploadError};

// mutator
pub use mutate::{apply, rename_task, try_apply};
pub use path::{Target, TaskField};

// validator
pub use validate::{validate, validate_parsed};

// generator / parser
pub use coerce::normalize_task;
pub use generate::{class_name, file_name, generate, generate_with_template, python_literal};
pub use parse::{parse, python_to_json};

// wizard
pub use session::{Download, Session};
pub use templates::{template, TEMPLATE_NAMES};
