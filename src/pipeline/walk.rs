//! Directory walker: turns a directory tree into [`FileJob`]s on the discovered queue.
//! Excluded and ignored directories are pruned before descent; errors are reported and skipped.

use crossbeam_channel::Sender;
use ignore::{WalkBuilder, WalkState};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crate::FileJob;
use crate::engine::IgnorePredicate;
use crate::engine::languages;
use crate::engine::tools::is_os_hidden_file;
use crate::pipeline::PipelineError;
use crate::pipeline::error_handler::report;

use super::context::PipelineContext;

/// One result from a directory walk: a regular file, some other entry, or an error.
pub enum WalkOutcome {
    File(PathBuf),
    Other,
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert an `ignore` walk result into [`WalkOutcome`].
pub fn to_outcome_ignore(r: Result<ignore::DirEntry, ignore::Error>) -> WalkOutcome {
    match r {
        Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => {
            WalkOutcome::File(entry.into_path())
        }
        Ok(_) => WalkOutcome::Other,
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: ignore_error_path(&err),
        },
    }
}

fn ignore_error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::Loop { child, .. } => Some(child.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            ignore_error_path(err)
        }
        _ => None,
    }
}

/// Convert a walkdir result into [`WalkOutcome`].
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> WalkOutcome {
    match r {
        Ok(entry) if entry.file_type().is_file() => WalkOutcome::File(entry.into_path()),
        Ok(_) => WalkOutcome::Other,
        Err(err) => WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        },
    }
}

fn walkdir_iter(ctx: &PipelineContext) -> Box<dyn Iterator<Item = WalkOutcome>> {
    use walkdir::WalkDir;
    let ignore = Arc::clone(&ctx.ignore);
    Box::new(
        WalkDir::new(&ctx.root)
            .follow_links(ctx.follow_links)
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0 || !(e.file_type().is_dir() && ignore.skip_dir(e.path()))
            })
            .map(to_outcome_walkdir),
    )
}

/// Spawn the walker. Returns the number of jobs it sent once the walk is over.
pub fn spawn_walk_thread(
    discovered_tx: Sender<FileJob>,
    ctx: PipelineContext,
    parallel_walk: bool,
) -> JoinHandle<usize> {
    thread::spawn(move || match parallel_walk {
        true => run_parallel_walk(discovered_tx, ctx, rayon::current_num_threads()),
        false => {
            let iter = walkdir_iter(&ctx);
            run_walk_loop(discovered_tx, ctx, iter)
        }
    })
}

/// What happened to one walk outcome.
enum Forwarded {
    Sent,
    Dropped,
    Disconnected,
}

/// Turn one outcome into a job and send it, or report it. Blocks while the queue is full.
fn forward_outcome(
    outcome: WalkOutcome,
    discovered_tx: &Sender<FileJob>,
    ctx: &PipelineContext,
) -> Forwarded {
    match outcome {
        WalkOutcome::File(path) => match job_for_path(path, &ctx.ignore) {
            Some(job) => match discovered_tx.send(job) {
                Ok(()) => Forwarded::Sent,
                Err(_) => Forwarded::Disconnected,
            },
            None => Forwarded::Dropped,
        },
        WalkOutcome::Other => Forwarded::Dropped,
        WalkOutcome::Err { msg, path } => {
            report(&ctx.error_tx, PipelineError::Traversal { path, msg });
            Forwarded::Dropped
        }
    }
}

/// Run the walk loop: consume `iter`, turn surviving files into jobs and send them on
/// `discovered_tx`, report errors on the error channel. Stops early on cancellation or when the
/// downstream queue is gone. Dropping `discovered_tx` on return is what closes the pipeline.
/// Returns the number of jobs sent.
pub fn run_walk_loop<I>(discovered_tx: Sender<FileJob>, ctx: PipelineContext, iter: I) -> usize
where
    I: Iterator<Item = WalkOutcome>,
{
    let mut count = 0_usize;
    for outcome in iter {
        if ctx.cancel.is_cancelled() {
            debug!("walk: cancelled after {} files", count);
            break;
        }
        match forward_outcome(outcome, &discovered_tx, &ctx) {
            Forwarded::Sent => count += 1,
            Forwarded::Dropped => {}
            Forwarded::Disconnected => break,
        }
    }
    debug!("walk: done, {} files discovered", count);
    drop(discovered_tx);
    count
}

/// Parallel walk on `threads` directory readers. Each reader sends its own jobs, so a full
/// queue stalls the readers themselves and no directory is read ahead of the pipeline.
pub fn run_parallel_walk(
    discovered_tx: Sender<FileJob>,
    ctx: PipelineContext,
    threads: usize,
) -> usize {
    let count = AtomicUsize::new(0);
    let predicate = Arc::clone(&ctx.ignore);
    let mut builder = WalkBuilder::new(&ctx.root);
    builder
        .standard_filters(false)
        .follow_links(ctx.follow_links)
        .threads(threads)
        .filter_entry(move |e| {
            e.depth() == 0
                || !(e.file_type().is_some_and(|ft| ft.is_dir()) && predicate.skip_dir(e.path()))
        });

    builder.build_parallel().run(|| {
        let tx = discovered_tx.clone();
        let ctx = &ctx;
        let count = &count;
        Box::new(move |result: Result<ignore::DirEntry, ignore::Error>| {
            if ctx.cancel.is_cancelled() {
                return WalkState::Quit;
            }
            match forward_outcome(to_outcome_ignore(result), &tx, ctx) {
                Forwarded::Sent => {
                    count.fetch_add(1, Ordering::Relaxed);
                    WalkState::Continue
                }
                Forwarded::Dropped => WalkState::Continue,
                Forwarded::Disconnected => WalkState::Quit,
            }
        })
    });

    let count = count.into_inner();
    if ctx.cancel.is_cancelled() {
        debug!("walk: cancelled after {} files", count);
    }
    debug!("walk: done, {} files discovered", count);
    drop(discovered_tx);
    count
}

/// Job for a regular file, or `None` when it has no known language, is OS junk, or is ignored.
/// Dropped files are not errors.
pub fn job_for_path(path: PathBuf, ignore: &IgnorePredicate) -> Option<FileJob> {
    let name = path.file_name()?.to_str()?;
    let (extension, language) = languages::detect(name)?;
    if is_os_hidden_file(&path) || ignore.skip_file(&path) {
        return None;
    }
    Some(FileJob::new(path, extension, language))
}
