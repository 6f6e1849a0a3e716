use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;

use crate::engine::Classifier;
use crate::pipeline::PipelineError;
use crate::pipeline::error_handler::{ErrorTx, report};
use crate::pipeline::pool::WorkerPool;
use crate::{CancelFlag, CountedJob, LoadedJob};

/// Spawn the classifier pool: count each loaded job and forward the counts. Content the
/// classifier refuses is reported on `error_tx` and dropped.
pub fn spawn_classifier_pool(
    rx: Receiver<LoadedJob>,
    tx: Sender<CountedJob>,
    num_threads: usize,
    classifier: Arc<dyn Classifier>,
    error_tx: &ErrorTx,
    cancel: &CancelFlag,
) -> WorkerPool {
    let error_tx = error_tx.clone();
    WorkerPool::spawn("classifier", num_threads, rx, tx, cancel, move |loaded| {
        classify_job(loaded, classifier.as_ref(), &error_tx)
    })
}

/// Count one job. The content is released here; only the counts travel on.
pub fn classify_job(
    loaded: LoadedJob,
    classifier: &dyn Classifier,
    error_tx: &ErrorTx,
) -> Option<CountedJob> {
    let LoadedJob { job, content } = loaded;
    match classifier.classify(&content, job.language()) {
        Ok(counts) => Some(CountedJob {
            bytes: content.len() as u64,
            job,
            counts,
        }),
        Err(source) => {
            report(
                error_tx,
                PipelineError::Classification {
                    path: job.path().to_path_buf(),
                    source,
                },
            );
            None
        }
    }
}
