use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::PipelineDefaults;

/// Breadcrumb depth histogram over a large line-oriented dump.
#[derive(Clone, Debug, Parser)]
#[command(name = "crumbstat")]
#[command(
    about = "Count breadcrumb depths in a large text dump; prints the average depth and a histogram."
)]
pub struct Cli {
    /// File to process; `-` reads stdin.
    #[arg(value_name = "PATH", default_value = PipelineDefaults::INPUT_PATH)]
    pub path: PathBuf,

    /// Match worker threads. Default: available parallelism.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Lines per batch.
    #[arg(long, short = 'p')]
    pub packet_size: Option<usize>,

    /// Batches allocated for the run (bounds memory).
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// Capacity of the reader → worker channel.
    #[arg(long)]
    pub queue_depth: Option<usize>,

    /// Tag regex with the breadcrumb in capture group 1, or `topic` for the default.
    #[arg(long)]
    pub pattern: Option<String>,

    /// Breadcrumb segment separator.
    #[arg(long)]
    pub separator: Option<String>,

    /// Print the report as JSON.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Verbose output (debug logs and a progress counter).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Config file. Default: `.crumbstat.toml` in the working directory, if present.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}
