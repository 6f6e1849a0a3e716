//! Pipeline context and tuning: shared data passed into the walk thread, queue sizing, and the
//! channels that connect the stages.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::engine::IgnorePredicate;
use crate::pipeline::PipelineError;
use crate::pipeline::pool::WorkerPool;
use crate::utils::config::{QueueFactors, WorkerThreadLimits};
use crate::utils::fd_limit::cap_readers;
use crate::{CancelFlag, CountedJob, FileJob, LoadedJob, Opts};

/// Capacities of the five bounded queues, walker to sink.
/// A full queue blocks its producer; that is the only backpressure in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueCaps {
    /// Walker → relay.
    pub discovered: usize,
    /// Relay → reader pool.
    pub read_jobs: usize,
    /// Reader pool → relay.
    pub loaded: usize,
    /// Relay → classifier pool.
    pub classify_jobs: usize,
    /// Classifier pool → sink.
    pub counted: usize,
}

impl QueueCaps {
    /// Capacities proportional to the worker count (see [`QueueFactors`]).
    pub fn for_threads(num_threads: usize) -> Self {
        let scaled = |factor: usize| {
            num_threads
                .max(1)
                .saturating_mul(factor)
                .min(QueueFactors::MAX)
        };
        Self {
            discovered: scaled(QueueFactors::DISCOVERED),
            read_jobs: scaled(QueueFactors::READ_JOBS),
            loaded: scaled(QueueFactors::LOADED),
            classify_jobs: scaled(QueueFactors::CLASSIFY_JOBS),
            counted: scaled(QueueFactors::COUNTED),
        }
    }

    /// Same capacity for every queue (useful for tests that want tight backpressure).
    pub fn uniform(cap: usize) -> Self {
        Self {
            discovered: cap,
            read_jobs: cap,
            loaded: cap,
            classify_jobs: cap,
            counted: cap,
        }
    }
}

/// Tuning for one run: pool sizes, walk mode, queue capacities.
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    /// Workers in the classifier pool (detected parallelism or override).
    pub num_threads: usize,
    /// Workers in the reader pool (same, capped by the FD limit).
    pub reader_threads: usize,
    pub parallel_walk: bool,
    pub queue_caps: QueueCaps,
}

impl PipelineTuning {
    pub fn from_opts(opts: &Opts) -> Self {
        let num_threads = WorkerThreadLimits::current().clamp(opts.num_threads);
        Self {
            num_threads,
            reader_threads: cap_readers(num_threads),
            parallel_walk: opts.parallel_walk,
            queue_caps: opts
                .queue_caps
                .unwrap_or_else(|| QueueCaps::for_threads(num_threads)),
        }
    }
}

/// Shared context for the walk thread: root, ignore predicate, link policy, error channel.
pub struct PipelineContext {
    pub root: PathBuf,
    pub ignore: Arc<IgnorePredicate>,
    pub follow_links: bool,
    pub cancel: CancelFlag,
    pub error_tx: Sender<PipelineError>,
}

/// The five queues plus the error channel. Each stage takes the halves it needs by value;
/// a queue closes when every sender has been dropped.
pub struct PipelineChannels {
    pub discovered_tx: Sender<FileJob>,
    pub discovered_rx: Receiver<FileJob>,
    pub read_tx: Sender<FileJob>,
    pub read_rx: Receiver<FileJob>,
    pub loaded_tx: Sender<LoadedJob>,
    pub loaded_rx: Receiver<LoadedJob>,
    pub classify_tx: Sender<LoadedJob>,
    pub classify_rx: Receiver<LoadedJob>,
    pub counted_tx: Sender<CountedJob>,
    pub counted_rx: Receiver<CountedJob>,
    pub error_tx: Sender<PipelineError>,
    pub error_rx: Receiver<PipelineError>,
    pub ctx: PipelineContext,
}

pub fn create_pipeline_channels(
    root: &Path,
    opts: &Opts,
    caps: QueueCaps,
    cancel: &CancelFlag,
) -> PipelineChannels {
    let (discovered_tx, discovered_rx) = bounded::<FileJob>(caps.discovered);
    let (read_tx, read_rx) = bounded::<FileJob>(caps.read_jobs);
    let (loaded_tx, loaded_rx) = bounded::<LoadedJob>(caps.loaded);
    let (classify_tx, classify_rx) = bounded::<LoadedJob>(caps.classify_jobs);
    let (counted_tx, counted_rx) = bounded::<CountedJob>(caps.counted);
    let (error_tx, error_rx) = unbounded::<PipelineError>();

    let mut ignore = IgnorePredicate::load(root, &opts.exclude, &error_tx);
    if let Some(dest) = opts.output.destination_file() {
        ignore = ignore.excluding_file(dest);
    }

    let ctx = PipelineContext {
        root: root.to_path_buf(),
        ignore: Arc::new(ignore),
        follow_links: opts.follow_links,
        cancel: cancel.clone(),
        error_tx: error_tx.clone(),
    };

    PipelineChannels {
        discovered_tx,
        discovered_rx,
        read_tx,
        read_rx,
        loaded_tx,
        loaded_rx,
        classify_tx,
        classify_rx,
        counted_tx,
        counted_rx,
        error_tx,
        error_rx,
        ctx,
    }
}

/// Handles returned by [`run_pipeline`](crate::pipeline::run_pipeline): the sink drains
/// `counted_rx`, then [`PipelineWorkers::finish`] joins everything upstream.
pub struct PipelineHandles {
    /// Canonical walk root.
    pub root: PathBuf,
    pub counted_rx: Receiver<CountedJob>,
    pub workers: PipelineWorkers,
}

/// Every upstream stage's completion handle, plus the error channel.
pub struct PipelineWorkers {
    pub walk_handle: JoinHandle<usize>,
    pub relay_handles: Vec<JoinHandle<usize>>,
    pub reader_pool: WorkerPool,
    pub classifier_pool: WorkerPool,
    pub error_rx: Receiver<PipelineError>,
    pub tuning: PipelineTuning,
    pub cancel: CancelFlag,
}
