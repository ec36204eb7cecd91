use super::open_session;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_document::helpers::check_integrity;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Snapshot file (JSON)
    pub snapshot: PathBuf,
}

/// Load a snapshot and report broken structure. Returns the number of
/// problems found.
pub fn check(args: CheckArgs, config: &Config) -> Result<usize> {
    let session = open_session(&args.snapshot, config)?;
    let doc = session.document();
    let issues = check_integrity(doc);

    if issues.is_empty() {
        println!(
            "{} {} ({} nodes)",
            "✓".green(),
            args.snapshot.display(),
            doc.len()
        );
        return Ok(0);
    }

    println!("{}", args.snapshot.display());
    for issue in &issues {
        println!("  {} {}", "error".red().bold(), issue);
    }
    println!();
    println!("   {} {}", "Problems:".red(), issues.len());
    Ok(issues.len())
}
