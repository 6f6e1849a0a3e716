use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Parallel line counter: per-language code, comment and blank line totals.
#[derive(Clone, Parser)]
#[command(name = "locpipe")]
#[command(about = "Count lines of code under a directory; use --files for per-file records.")]
pub struct Cli {
    /// Directory to count. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Write one JSON record per file to this path instead of the summary ("-" for stdout).
    #[arg(long, value_name = "DEST")]
    pub files: Option<PathBuf>,

    /// Workers per pool. Default: available parallelism.
    #[arg(long, short = 't', value_parser = clap::value_parser!(usize))]
    pub threads: Option<usize>,

    /// Skip files larger than this many bytes (0 = no limit).
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub max_file_size: Option<u64>,

    /// Walk the tree on one thread (walkdir) instead of with the parallel ignore walker.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub serial_walk: Option<bool>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Exclude patterns (gitignore syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Print the summary as JSON.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub json: Option<bool>,

    /// Verbose output: debug logging, skipped-file list, progress counter.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
