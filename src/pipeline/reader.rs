use crossbeam_channel::{Receiver, Sender};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::pipeline::PipelineError;
use crate::pipeline::error_handler::{ErrorTx, report};
use crate::pipeline::pool::WorkerPool;
use crate::utils::config::ReadConsts;
use crate::{CancelFlag, Content, FileJob, LoadedJob};

/// Spawn the reader pool: load each job's content and forward it. Unreadable or over-size files
/// are reported on `error_tx` and dropped.
pub fn spawn_reader_pool(
    rx: Receiver<FileJob>,
    tx: Sender<LoadedJob>,
    num_threads: usize,
    max_file_size: u64,
    error_tx: &ErrorTx,
    cancel: &CancelFlag,
) -> WorkerPool {
    let error_tx = error_tx.clone();
    WorkerPool::spawn("reader", num_threads, rx, tx, cancel, move |job| {
        load_job(job, max_file_size, &error_tx)
    })
}

/// Read one job's content. `None` (after reporting) when the file cannot be loaded.
pub fn load_job(job: FileJob, max_file_size: u64, error_tx: &ErrorTx) -> Option<LoadedJob> {
    match read_content(job.path(), max_file_size) {
        Ok(content) => Some(LoadedJob { job, content }),
        Err(err) => {
            report(error_tx, err);
            None
        }
    }
}

/// Read a whole file. Memory-maps files above [`ReadConsts::MMAP_THRESHOLD`], buffers the rest.
/// `max_file_size == 0` means no limit.
pub fn read_content(path: &Path, max_file_size: u64) -> Result<Content, PipelineError> {
    let read_err = |source: std::io::Error| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_err)?;
    let size = file.metadata().map_err(read_err)?.len();
    if max_file_size > 0 && size > max_file_size {
        return Err(PipelineError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_file_size,
        });
    }

    if size > ReadConsts::MMAP_THRESHOLD {
        // Safety: the map is read-only and lives only as long as the job. A file truncated by
        // another process while mapped is outside what we guard against.
        let map = unsafe { Mmap::map(&file) }.map_err(read_err)?;
        return Ok(Content::Mapped(map));
    }

    let mut buf = Vec::with_capacity(size as usize);
    file.read_to_end(&mut buf).map_err(read_err)?;
    Ok(Content::Buffered(buf))
}
