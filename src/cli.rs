use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Parser)]
#[command(name = "reqstash", about = "Content-addressed disk cache for HTTP responses")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Cache root directory, overriding the configured one.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Log output format, overriding the configured one.
    #[arg(long, value_enum)]
    pub log: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the entry count and cache location as JSON.
    Stats,
    /// Remove every cached entry.
    Wipe,
    /// Remove entries that have not been used for the given number of seconds.
    Evict {
        #[arg(long)]
        older_than_secs: u64,
    },
    /// Evict periodically until interrupted.
    Sweep {
        /// Seconds between sweeps.
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
        /// Entries unused for longer than this many seconds are evicted.
        #[arg(long, default_value_t = 7 * 24 * 3600)]
        max_age_secs: u64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}
