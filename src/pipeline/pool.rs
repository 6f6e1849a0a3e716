//! Fixed-size worker pool draining one queue into another.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::CancelFlag;

/// Completion handle for a pool. Every worker owns a clone of the output sender and the pool
/// keeps none, so the output queue closes exactly when the last worker has exited. [`join`]
/// waits for that.
///
/// [`join`]: WorkerPool::join
pub struct WorkerPool {
    name: &'static str,
    handles: Vec<JoinHandle<usize>>,
}

impl WorkerPool {
    /// Spawn `size` workers. Each takes a unit from `rx`, applies `work`, and sends the result on
    /// `tx`; a `None` result drops the unit (the work function reports why). Workers stop when
    /// `rx` is closed and drained, when `tx` has no receivers left, or when `cancel` is raised.
    pub fn spawn<I, O, F>(
        name: &'static str,
        size: usize,
        rx: Receiver<I>,
        tx: Sender<O>,
        cancel: &CancelFlag,
        work: F,
    ) -> Self
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Option<O> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let handles = (0..size.max(1))
            .map(|_| {
                let rx = rx.clone();
                let tx = tx.clone();
                let cancel = cancel.clone();
                let work = Arc::clone(&work);
                thread::spawn(move || worker_loop(rx, tx, &cancel, work.as_ref()))
            })
            .collect();
        // Workers hold the only senders from here on.
        drop(tx);
        Self { name, handles }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker. Returns the number of units the pool forwarded.
    pub fn join(self) -> Result<usize> {
        let mut forwarded = 0;
        for h in self.handles {
            forwarded += h
                .join()
                .map_err(|_| anyhow::anyhow!("{} worker panicked", self.name))?;
        }
        debug!("{} pool: joined, {} units forwarded", self.name, forwarded);
        Ok(forwarded)
    }
}

fn worker_loop<I, O, F>(rx: Receiver<I>, tx: Sender<O>, cancel: &CancelFlag, work: &F) -> usize
where
    F: Fn(I) -> Option<O>,
{
    let mut forwarded = 0_usize;
    for unit in rx.iter() {
        if cancel.is_cancelled() {
            break;
        }
        let Some(out) = work(unit) else {
            continue;
        };
        if tx.send(out).is_err() {
            break;
        }
        forwarded += 1;
    }
    drop(tx);
    forwarded
}
