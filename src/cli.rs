use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::ingest::DEFAULT_CHUNK_SIZE;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    /// Arrow-annotated leak paths through the logger (set RUST_LOG=info)
    Text,
    /// Suspect reports as a JSON array on stdout
    Json,
}

/// Find leak suspects in heap snapshot record streams
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Snapshot files, optionally zstd compressed (`.zst`)
    #[arg(required = true)]
    pub paths: Vec<String>,

    #[arg(short, long, default_value_t = 20.0)]
    pub threshold_percent: f64,

    #[arg(short = 'd', long, default_value_t = 20)]
    pub max_depth: usize,

    #[arg(short = 'r', long, default_value_t = 0.5)]
    pub big_drop_ratio: f64,

    #[arg(long, default_value_t = 10)]
    pub max_paths: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Bytes read from a snapshot per chunk
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

impl Args {
    pub fn config(&self) -> Config {
        Config::default()
            .with_threshold_percent(self.threshold_percent)
            .with_max_depth(self.max_depth)
            .with_big_drop_ratio(self.big_drop_ratio)
            .with_max_paths(self.max_paths)
    }
}
