use super::open_session;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_document::helpers::check_integrity;
use folio_document::DocumentSession;
use folio_editing::Edit;
use folio_model::Selection;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, instrument};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Snapshot file (JSON)
    pub snapshot: PathBuf,

    /// Edit script: a JSON list of `{selection, verb, args}` steps
    pub script: PathBuf,

    /// Write the resulting snapshot here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One scripted edit. `selection` replaces the session selection before
/// the verb runs; without it the verb continues from the previous step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub selection: Option<Selection>,
    pub verb: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Step {
    pub fn edit(&self) -> Result<Edit> {
        let mut command = json!({ "verb": self.verb });
        // unit verbs (break, indent, ...) take no args at all
        if !self.args.is_null() {
            command["args"] = self.args.clone();
        }
        serde_json::from_value(command).with_context(|| format!("invalid '{}' step", self.verb))
    }
}

pub fn parse_script(source: &str) -> Result<Vec<Step>> {
    Ok(serde_json::from_str(source)?)
}

/// Run every step in its own transaction; the first failing step aborts
/// the replay
#[instrument(skip(session, steps), fields(steps = steps.len()))]
pub fn run_steps(session: &mut DocumentSession, steps: &[Step]) -> Result<()> {
    for (i, step) in steps.iter().enumerate() {
        if let Some(selection) = &step.selection {
            session.set_selection(selection.clone())?;
        }
        let edit = step.edit()?;
        debug!(step = i + 1, verb = edit.name(), "replaying");
        session
            .transaction(|tx| edit.apply(tx))
            .with_context(|| format!("step {} ({}) failed", i + 1, step.verb))?;
    }
    Ok(())
}

pub fn replay(args: ReplayArgs, config: &Config) -> Result<()> {
    let mut session = open_session(&args.snapshot, config)?;
    let source = fs::read_to_string(&args.script).with_context(|| format!("cannot read {}", args.script.display()))?;
    let steps = parse_script(&source)?;

    run_steps(&mut session, &steps)?;

    let issues = check_integrity(session.document());
    for issue in &issues {
        eprintln!("{} {}", "warning:".yellow().bold(), issue);
    }

    let snapshot = session.document().snapshot().to_json()?;
    match &args.output {
        Some(path) => {
            fs::write(path, snapshot)?;
            eprintln!("{} {} steps → {}", "✓".green(), steps.len(), path.display());
        }
        None => println!("{}", snapshot),
    }
    Ok(())
}
