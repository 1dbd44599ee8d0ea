//! Reverie CLI - Reflection insight engine
//!
//! Usage:
//!   reverie analyze --file journal.json       Full insight artifact
//!   reverie topics                            Rising/stable/fading topics
//!   reverie timeline --now 2026-03-15T21:30:00Z   Deterministic replay

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let reflections = commands::load_reflections(&cli.file)?;
    let now = commands::resolve_now(cli.now.as_deref())?;

    match cli.command {
        Commands::Analyze { json } => {
            commands::cmd_analyze(&reflections, cli.window_days, now, json)
        }
        Commands::Topics { json } => commands::cmd_topics(&reflections, now, json),
        Commands::Clusters { json } => commands::cmd_clusters(&reflections, now, json),
        Commands::Streaks { json } => commands::cmd_streaks(&reflections, now, json),
        Commands::Timeline { json } => commands::cmd_timeline(&reflections, now, json),
        Commands::Distribution { json } => {
            commands::cmd_distribution(&reflections, cli.window_days, now, json)
        }
    }
}
