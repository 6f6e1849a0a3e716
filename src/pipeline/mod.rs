//! Pipeline stages: walk, relay, reader pool, classifier pool, sink, and the wiring between them.

pub mod classify;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod pool;
pub mod reader;
pub mod relay;
pub mod sink;
pub mod walk;

pub use classify::{classify_job, spawn_classifier_pool};
pub use context::{
    PipelineChannels, PipelineContext, PipelineHandles, PipelineTuning, PipelineWorkers, QueueCaps,
    create_pipeline_channels,
};
pub use error_handler::{PipelineError, collect_errors, log_skipped};
pub use orchestrator::{
    collect_summary, run_pipeline, shutdown_pipeline_handles, stream_file_records,
};
pub use pool::WorkerPool;
pub use reader::{load_job, read_content, spawn_reader_pool};
pub use relay::{relay_loop, spawn_relay};
pub use sink::{drain_aggregate, drain_per_file, to_record};
pub use walk::{WalkOutcome, job_for_path, run_parallel_walk, run_walk_loop, spawn_walk_thread};
