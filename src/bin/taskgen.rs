/// taskgen: create, inspect, check and edit autoclean EEG task files.
///
///   taskgen templates
///   taskgen new RestingState --output tasks/
///   taskgen show tasks/restingstate.py
///   taskgen check tasks/restingstate.py
///   taskgen set tasks/restingstate.py filtering.value.l_freq 0.5 --output tasks/restingstate.py
///
/// Logs go to stderr; `-v` / `-vv` or `RUST_LOG` raise the level.
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use exgcfg::{templates, try_apply, Config, Session, TaskField};

#[derive(Parser, Debug)]
#[command(name = "taskgen", about = "Autoclean EEG task file generator")]
struct Args {
    /// More log output (repeat for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in templates.
    Templates,

    /// Render a built-in template.
    New {
        /// Template name (see `taskgen templates`).
        template: String,

        /// Directory to write `<task>.py` into; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the task reconstructed from a file as JSON.
    Show { file: PathBuf },

    /// Validate a task file; exits non-zero when anything needs fixing.
    Check { file: PathBuf },

    /// Change one field and re-emit the file.
    Set {
        file: PathBuf,

        /// Field path, either full (`tasks.Rest.settings.trim_step.value`)
        /// or relative to the task (`trim_step.value`, `description`).
        path: String,

        /// New value as JSON; anything that is not valid JSON is taken as a string.
        value: String,

        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    match args.command {
        Command::Templates => {
            for cfg in templates::all() {
                println!("{:<14} {}", cfg.key, cfg.task.description);
            }
        }
        Command::New { template, output } => {
            let mut session = Session::new();
            if !session.select_template(&template) {
                bail!("unknown template `{template}` (try `taskgen templates`)");
            }
            emit(&mut session, output.as_deref(), true)?;
        }
        Command::Show { file } => {
            let session = open(&file)?;
            let cfg = loaded(&session)?;
            println!("{}", serde_json::to_string_pretty(cfg)?);
        }
        Command::Check { file } => {
            let mut session = open(&file)?;
            if !session.validate() {
                report(&session);
                bail!("{} has {} problem(s)", file.display(), session.errors().len());
            }
            println!("{}: ok", file.display());
        }
        Command::Set { file, path, value, output } => {
            let mut session = open(&file)?;
            let cfg = loaded(&session)?;
            let path = full_path(cfg, &path);
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let next = try_apply(cfg, &path, value).with_context(|| format!("setting {path}"))?;
            session.load(next);
            emit(&mut session, output.as_deref(), false)?;
        }
    }
    Ok(())
}

fn open(file: &Path) -> Result<Session> {
    let mut session = Session::new();
    session.load_path(file)?;
    Ok(session)
}

fn loaded(session: &Session) -> Result<&Config> {
    session.config().context("no task loaded")
}

/// Expand a task-relative path to a full one.
fn full_path(cfg: &Config, path: &str) -> String {
    if path.starts_with("tasks.") {
        path.to_string()
    } else if TaskField::from_key(path).is_some() {
        format!("{}.{path}", cfg.base_path())
    } else {
        format!("{}.{path}", cfg.settings_path())
    }
}

/// Render the loaded task. `output` is a directory when `into_dir`, a file otherwise.
fn emit(session: &mut Session, output: Option<&Path>, into_dir: bool) -> Result<()> {
    let Some(download) = session.download() else {
        report(session);
        bail!("task was not rendered");
    };
    match output {
        Some(out) => {
            let target = if into_dir { out.join(&download.file_name) } else { out.to_path_buf() };
            std::fs::write(&target, &download.contents)
                .with_context(|| format!("writing {}", target.display()))?;
            info!(path = %target.display(), "written");
            eprintln!("Written → {}", target.display());
        }
        None => std::io::stdout().write_all(download.contents.as_bytes())?,
    }
    Ok(())
}

fn report(session: &Session) {
    for (path, message) in session.errors() {
        eprintln!("{path}: {message}");
    }
}
