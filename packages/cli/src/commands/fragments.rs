use super::open_session;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_fragmenter::{fragment_property, render_markup};
use folio_model::{text, Path};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FragmentsArgs {
    /// Snapshot file (JSON)
    pub snapshot: PathBuf,

    /// Node holding the text
    pub node_id: String,

    /// Text property to fragment
    #[arg(short, long, default_value = "content")]
    pub property: String,

    /// Output format (markup, json)
    #[arg(short, long, default_value = "markup")]
    pub format: String,
}

pub fn fragments(args: FragmentsArgs, config: &Config) -> Result<()> {
    let session = open_session(&args.snapshot, config)?;
    let doc = session.document();
    let path = Path::new(args.node_id.clone(), args.property.clone());

    let content = doc.get_text(&path).with_context(|| format!("{} has no text", path))?;
    let fragmentation = fragment_property(doc, &path)?;

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&fragmentation)?),
        "markup" => {
            println!("{}", path.to_string().bright_white());
            println!("  {}", render_markup(content, &fragmentation));
            println!();
            for segment in fragmentation.segments() {
                println!(
                    "  {:>4}..{:<4} {:?} {}",
                    segment.start,
                    segment.end,
                    text::slice(content, segment.start, segment.end),
                    segment.annotations.join(" > ").dimmed()
                );
            }
            println!();
            println!("   Pieces: {}", fragmentation.pieces().len());
        }
        other => anyhow::bail!("unknown format '{}'. Use: markup or json", other),
    }
    Ok(())
}
