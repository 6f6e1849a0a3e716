//! locpipe: bounded, multi-stage concurrent line counter.
//!
//! Walker → relay → reader pool → relay → classifier pool → sink, every hop a bounded channel.

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{Classifier, ClassifyError, LineClassifier};
pub use pipeline::{PipelineError, QueueCaps};

use log::debug;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Result alias used by public locpipe API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Count every recognized file under `root` with the default [`LineClassifier`].
///
/// Per-file problems never fail the run; they are returned in [`RunReport::skipped`].
/// `opts.output` is ignored here; use [`write_file_records`] for per-file output.
pub fn count_dir(root: &Path, opts: &Opts) -> Result<RunReport<Summary>> {
    count_dir_with(root, opts, Arc::new(LineClassifier), &CancelFlag::new())
}

/// [`count_dir`] with a caller-supplied classifier and cancellation flag.
pub fn count_dir_with(
    root: &Path,
    opts: &Opts,
    classifier: Arc<dyn Classifier>,
    cancel: &CancelFlag,
) -> Result<RunReport<Summary>> {
    log_config(opts);
    pipeline::collect_summary(root, opts, classifier, cancel)
}

/// Write one JSON line ([`FileRecord`]) per counted file to `writer`. Returns the record count.
pub fn write_file_records<W: Write>(
    root: &Path,
    opts: &Opts,
    writer: &mut W,
) -> Result<RunReport<usize>> {
    log_config(opts);
    pipeline::stream_file_records(
        root,
        opts,
        Arc::new(LineClassifier),
        &CancelFlag::new(),
        writer,
    )
}

fn log_config(opts: &Opts) {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
}
