use anyhow::Result;
use log::{debug, info};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::Classifier;
use crate::engine::progress::counter_if;
use crate::engine::tools::check_root_and_canonicalize;
use crate::pipeline::{self, PipelineHandles, PipelineTuning, PipelineWorkers, WorkerPool};
use crate::{CancelFlag, Opts, RunReport, Summary};

/// Start every stage except the sink. Returns the counted-job receiver for the caller to drain
/// and the handles to join afterwards.
///
/// Walk → discovered → relay → read jobs → readers → loaded → relay → classify jobs →
/// classifiers → counted.
pub fn run_pipeline(
    root: &Path,
    opts: &Opts,
    classifier: Arc<dyn Classifier>,
    cancel: &CancelFlag,
) -> Result<PipelineHandles> {
    let root = check_root_and_canonicalize(root)?;
    let tuning = PipelineTuning::from_opts(opts);
    info!(
        "Detected parallelism: {} threads ({} readers, {} classifiers)",
        rayon::current_num_threads(),
        tuning.reader_threads,
        tuning.num_threads
    );
    if tuning.parallel_walk {
        debug!("Walking in parallel (ignore walker)");
    } else {
        debug!("Walking serially (walkdir)");
    }
    debug!("Queue capacities: {:?}", tuning.queue_caps);

    let channels = pipeline::create_pipeline_channels(&root, opts, tuning.queue_caps, cancel);

    let walk_handle =
        pipeline::spawn_walk_thread(channels.discovered_tx, channels.ctx, tuning.parallel_walk);
    let discovered_relay =
        pipeline::spawn_relay(channels.discovered_rx, channels.read_tx, "discovered");
    let reader_pool = pipeline::spawn_reader_pool(
        channels.read_rx,
        channels.loaded_tx,
        tuning.reader_threads,
        opts.max_file_size,
        &channels.error_tx,
        cancel,
    );
    let loaded_relay = pipeline::spawn_relay(channels.loaded_rx, channels.classify_tx, "loaded");
    let classifier_pool = pipeline::spawn_classifier_pool(
        channels.classify_rx,
        channels.counted_tx,
        tuning.num_threads,
        classifier,
        &channels.error_tx,
        cancel,
    );

    Ok(PipelineHandles {
        root,
        counted_rx: channels.counted_rx,
        workers: PipelineWorkers {
            walk_handle,
            relay_handles: vec![discovered_relay, loaded_relay],
            reader_pool,
            classifier_pool,
            error_rx: channels.error_rx,
            tuning,
            cancel: cancel.clone(),
        },
    })
}

impl PipelineWorkers {
    /// Join every upstream stage (call after the sink has drained) and package the run report.
    pub fn finish<T>(self, output: T) -> Result<RunReport<T>> {
        let discovered = shutdown_pipeline_handles(
            self.walk_handle,
            self.relay_handles,
            self.reader_pool,
            self.classifier_pool,
        )?;
        Ok(RunReport {
            output,
            skipped: pipeline::collect_errors(&self.error_rx),
            discovered,
            num_threads: self.tuning.num_threads,
            cancelled: self.cancel.is_cancelled(),
        })
    }
}

/// Join walk, relays, and both pools. Returns the walker's file count.
pub fn shutdown_pipeline_handles(
    walk_handle: JoinHandle<usize>,
    relay_handles: Vec<JoinHandle<usize>>,
    reader_pool: WorkerPool,
    classifier_pool: WorkerPool,
) -> Result<usize> {
    let discovered = walk_handle
        .join()
        .map_err(|_| anyhow::anyhow!("walk thread panicked"))?;
    for h in relay_handles {
        h.join()
            .map_err(|_| anyhow::anyhow!("relay thread panicked"))?;
    }
    reader_pool.join()?;
    classifier_pool.join()?;
    Ok(discovered)
}

/// Aggregate mode: run the pipeline and fold every counted file into a [`Summary`].
pub fn collect_summary(
    root: &Path,
    opts: &Opts,
    classifier: Arc<dyn Classifier>,
    cancel: &CancelFlag,
) -> Result<RunReport<Summary>> {
    let PipelineHandles {
        counted_rx,
        workers,
        ..
    } = run_pipeline(root, opts, classifier, cancel)?;

    let progress = counter_if(opts.verbose, "Counting");
    let summary = pipeline::drain_aggregate(counted_rx, progress.as_ref());
    workers.finish(summary)
}

/// Per-file mode: run the pipeline and write one JSON record per counted file to `writer`.
/// Returns the record count. All stages are joined even when writing fails.
pub fn stream_file_records<W: Write>(
    root: &Path,
    opts: &Opts,
    classifier: Arc<dyn Classifier>,
    cancel: &CancelFlag,
    writer: &mut W,
) -> Result<RunReport<usize>> {
    let PipelineHandles {
        root,
        counted_rx,
        workers,
    } = run_pipeline(root, opts, classifier, cancel)?;

    let progress = counter_if(opts.verbose, "Counting");
    let written = pipeline::drain_per_file(counted_rx, &root, writer, progress.as_ref());
    let report = workers.finish(())?;
    let written = written?;
    Ok(RunReport {
        output: written,
        skipped: report.skipped,
        discovered: report.discovered,
        num_threads: report.num_threads,
        cancelled: report.cancelled,
    })
}
