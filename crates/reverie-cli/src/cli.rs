//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Reverie - Evidence-backed insights over your reflections
#[derive(Parser)]
#[command(name = "reverie")]
#[command(about = "Turn a journal snapshot into evidence-backed insight cards", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Reflection snapshot file (JSON array of entries)
    #[arg(long, default_value = "reflections.json", global = true)]
    pub file: PathBuf,

    /// Analysis window in days, counted back from now
    #[arg(long, default_value = "90", global = true)]
    pub window_days: i64,

    /// Fix the computation time (RFC 3339, e.g. 2026-03-15T21:30:00Z)
    ///
    /// Defaults to the current time. The same snapshot with the same --now
    /// always produces the same output.
    #[arg(long, global = true)]
    pub now: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every detector and print the full insight artifact
    Analyze {
        /// Print the artifact as JSON instead of a report
        #[arg(long)]
        json: bool,
    },

    /// Show rising, stable, and fading topics
    Topics {
        /// Print the drift buckets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show clusters of lexically-overlapping entries
    Clusters {
        /// Print the cluster cards as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the peak writing hour and day streaks
    Streaks {
        /// Print the streak card as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show timeline events (firsts, silences, pace shifts)
    Timeline {
        /// Print the events as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the statistical shape of the writing cadence
    Distribution {
        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },
}
