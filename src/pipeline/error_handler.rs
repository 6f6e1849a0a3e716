//! Out-of-band error reporting. No per-file error stops the pipeline: the stage drops the unit,
//! sends a [`PipelineError`] on the error channel, and moves on. Dropped units are not retried.

use crossbeam_channel::{Receiver, Sender};
use std::path::PathBuf;
use thiserror::Error;

use crate::Opts;
use crate::engine::ClassifyError;

/// Why an entry or unit was dropped.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Entry or subtree could not be visited during the walk.
    #[error("cannot traverse {}: {msg}", display_or_unknown(.path))]
    Traversal { path: Option<PathBuf>, msg: String },
    /// Root ignore file could not be parsed; the predicate degraded to matching nothing.
    #[error("cannot load ignore file {}: {msg}", .path.display())]
    IgnoreLoad { path: PathBuf, msg: String },
    /// File content could not be loaded (vanished, unreadable).
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File is over the configured size limit.
    #[error("{} is {size} bytes, over the {limit} byte limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    /// Classifier refused the content.
    #[error("cannot classify {}: {source}", .path.display())]
    Classification {
        path: PathBuf,
        #[source]
        source: ClassifyError,
    },
}

impl PipelineError {
    /// Path the error refers to, when known.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            PipelineError::Traversal { path, .. } => path.as_deref(),
            PipelineError::IgnoreLoad { path, .. }
            | PipelineError::Read { path, .. }
            | PipelineError::TooLarge { path, .. }
            | PipelineError::Classification { path, .. } => Some(path),
        }
    }

    /// Short stage label for summaries.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Traversal { .. } | PipelineError::IgnoreLoad { .. } => "walk",
            PipelineError::Read { .. } | PipelineError::TooLarge { .. } => "read",
            PipelineError::Classification { .. } => "classify",
        }
    }
}

fn display_or_unknown(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown path>".to_string())
}

/// Sending half of the error channel. Unbounded: stages must never block on error reporting,
/// and nothing drains it until the run is over.
pub type ErrorTx = Sender<PipelineError>;

/// Send an error without caring whether anyone is listening.
pub fn report(errors: &ErrorTx, err: PipelineError) {
    log::debug!("{}", err);
    let _ = errors.send(err);
}

/// Drain everything reported so far. Call after every stage has been joined.
pub fn collect_errors(error_rx: &Receiver<PipelineError>) -> Vec<PipelineError> {
    error_rx.try_iter().collect()
}

/// Log a summary of dropped entries (each one individually when verbose).
pub fn log_skipped(opts: &Opts, skipped: &[PipelineError]) {
    if skipped.is_empty() {
        return;
    }
    let count_of = |stage: &str| skipped.iter().filter(|e| e.stage() == stage).count();
    log::warn!(
        "Skipped {} entries ({} walk, {} read, {} classify)",
        skipped.len(),
        count_of("walk"),
        count_of("read"),
        count_of("classify")
    );
    if opts.verbose {
        for err in skipped {
            eprintln!("  skipped: {}", err);
        }
    }
}
