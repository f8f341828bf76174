use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Guardian referral and pioneer points: sample vault holdings, score,
/// persist, and serve the results.
#[derive(Parser)]
#[command(name = "guardian-points", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the sampling instants of a reporting day
    Timestamps {
        /// Reporting day (YYYY-MM-DD); defaults to yesterday (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Compute, rank, and persist guardian and referral points
    Guardians {
        /// JSON list of {"guardian", "referrer_code", "referrals": [...]}
        file: PathBuf,

        /// Path to the points config JSON file
        #[arg(long, default_value = "points.json")]
        config: PathBuf,

        /// Reporting day (YYYY-MM-DD); defaults to yesterday (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Compute and print without persisting
        #[arg(long)]
        dry_run: bool,
    },

    /// Compute and persist pioneer points
    Pioneers {
        /// JSON list of user addresses
        file: PathBuf,

        /// Path to the points config JSON file
        #[arg(long, default_value = "points.json")]
        config: PathBuf,

        /// Reporting day (YYYY-MM-DD); defaults to yesterday (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Compute and print without persisting
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the read-only query API
    Serve {
        /// Path to the points config JSON file
        #[arg(long, default_value = "points.json")]
        config: PathBuf,

        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value = "3000")]
        port: u16,
    },
}
