mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, fragments, replay, CheckArgs, FragmentsArgs, ReplayArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Folio CLI - inspect and edit structured rich-text documents
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a snapshot for structural problems
    Check(CheckArgs),

    /// Print the render fragments of a text property
    Fragments(FragmentsArgs),

    /// Apply an edit script to a snapshot and print the result
    Replay(ReplayArgs),
}

fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(args) => {
            if check(args, config)? > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Fragments(args) => fragments(args, config),
        Command::Replay(args) => replay(args, config),
    }
}

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };
    let config = match Config::load(&cwd) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} invalid {}: {}", "Error:".red().bold(), config::DEFAULT_CONFIG_NAME, err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())))
        .init();

    if let Err(err) = run(cli, &config) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
