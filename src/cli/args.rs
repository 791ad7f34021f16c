use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::constants::DEFAULT_DATABASE_FILE;

#[derive(Parser)]
#[command(name = "wx-ingestor")]
#[command(about = "Concurrent weather-station observation ingestor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a directory of station files, then compute yearly statistics
    Ingest {
        #[arg(short, long, help = "Directory of per-station observation files")]
        input_dir: PathBuf,

        #[arg(short, long, default_value = DEFAULT_DATABASE_FILE)]
        database: PathBuf,

        #[arg(
            long,
            default_value_t = num_cpus::get(),
            help = "Concurrency width of the ingestion pool"
        )]
        max_workers: usize,

        #[arg(long, default_value = "false", help = "Skip the aggregation pass")]
        no_aggregate: bool,

        #[arg(long, default_value = "false", help = "Suppress the progress bar")]
        quiet: bool,
    },

    /// Recompute yearly statistics from stored observations
    Aggregate {
        #[arg(short, long, default_value = DEFAULT_DATABASE_FILE)]
        database: PathBuf,
    },

    /// List stored observations as JSON lines
    Observations {
        #[arg(short, long, default_value = DEFAULT_DATABASE_FILE)]
        database: PathBuf,

        #[arg(long, help = "Filter by date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Filter by station ID")]
        station: Option<String>,

        #[arg(long, help = "Page number (1-indexed)")]
        page: Option<i64>,

        #[arg(long, help = "Rows per page")]
        page_size: Option<i64>,
    },

    /// List yearly statistics as JSON lines
    Stats {
        #[arg(short, long, default_value = DEFAULT_DATABASE_FILE)]
        database: PathBuf,

        #[arg(long, help = "Filter by year")]
        year: Option<i32>,

        #[arg(long, help = "Filter by station ID")]
        station: Option<String>,

        #[arg(long, help = "Page number (1-indexed)")]
        page: Option<i64>,

        #[arg(long, help = "Rows per page")]
        page_size: Option<i64>,
    },
}
