//! Holdfast CLI - balance configurations, play seeded matches and step through replays.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Holdfast - a deterministic territory-capture rules engine
#[derive(Parser, Debug)]
#[command(name = "holdfast")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Balance a raw JSON configuration and print the result
    Balance {
        /// Raw configuration (JSON, missing fields take defaults)
        #[arg(required = true)]
        config: PathBuf,

        /// Output format: json or wire (hex bytes)
        #[arg(short, long, default_value = "json")]
        format: cli::BalanceFormat,
    },

    /// Play a seeded match with random legal actions
    Autoplay {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Turn limit before the match is declared a draw (default: 200)
        #[arg(short, long, default_value = "200")]
        turns: u32,

        /// Write a replay log into this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Raw configuration (JSON); the stock match if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Step through a replay log
    Replay {
        /// Log file
        #[arg(required = true)]
        log: PathBuf,

        /// Walk from the last entry back to the first
        #[arg(short, long)]
        backward: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Balance { config, format } => cli::balance::execute(&config, format),

        Commands::Autoplay {
            seed,
            turns,
            log_dir,
            config,
            format,
        } => cli::autoplay::execute(seed, turns, log_dir.as_deref(), config.as_deref(), format),

        Commands::Replay { log, backward } => cli::replay::execute(&log, backward),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
