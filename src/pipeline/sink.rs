//! Result sink: the last stage, run on the caller's thread. Draining the counted queue to
//! closure is what "the pipeline is done" means.

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use log::debug;
use std::io::Write;
use std::path::Path;

use crate::engine::progress::{ProgressBar, finish_bar, update_progress_bar};
use crate::engine::tools::record_path;
use crate::{CountedJob, FileRecord, Summary};

/// Aggregate mode: fold every counted job into a [`Summary`] until the queue closes.
pub fn drain_aggregate(rx: Receiver<CountedJob>, progress: Option<&ProgressBar>) -> Summary {
    let mut summary = Summary::default();
    let mut received = 0_usize;
    for counted in rx.iter() {
        summary.add(&counted);
        received += 1;
        if let Some(bar) = progress {
            update_progress_bar(bar, 1);
        }
    }
    if let Some(bar) = progress {
        finish_bar(bar);
    }
    debug!("sink: channel closed, {} files aggregated", received);
    summary
}

/// Per-file mode: write one JSON line per counted job, in arrival order, until the queue closes.
/// Paths are written relative to `root`. Returns the number of records written.
///
/// On a write error the remaining jobs are still drained (so upstream stages can finish) and the
/// error is returned afterwards.
pub fn drain_per_file<W: Write>(
    rx: Receiver<CountedJob>,
    root: &Path,
    writer: &mut W,
    progress: Option<&ProgressBar>,
) -> Result<usize> {
    let mut written = 0_usize;
    let mut first_error: Option<anyhow::Error> = None;
    for counted in rx.iter() {
        if first_error.is_some() {
            continue;
        }
        match write_record(writer, &to_record(&counted, root)) {
            Ok(()) => {
                written += 1;
                if let Some(bar) = progress {
                    update_progress_bar(bar, 1);
                }
            }
            Err(e) => first_error = Some(e),
        }
    }
    if let Some(bar) = progress {
        finish_bar(bar);
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    writer.flush().context("flush per-file output")?;
    debug!("sink: channel closed, {} records written", written);
    Ok(written)
}

/// Per-file record for a counted job.
pub fn to_record(counted: &CountedJob, root: &Path) -> FileRecord {
    FileRecord {
        path: record_path(counted.job.path(), root),
        language: counted.job.language(),
        extension: counted.job.extension().to_string(),
        bytes: counted.bytes,
        counts: counted.counts,
    }
}

fn write_record<W: Write>(writer: &mut W, record: &FileRecord) -> Result<()> {
    serde_json::to_writer(&mut *writer, record).context("serialize file record")?;
    writer.write_all(b"\n").context("write per-file output")?;
    Ok(())
}
