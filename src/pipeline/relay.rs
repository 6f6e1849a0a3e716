//! Relay stage: forwards units from one queue to another unchanged.
//!
//! Sits between two queues of different capacity so a fast producer's queue can drain into a
//! smaller consumer queue without either growing past its bound.

use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::thread::{self, JoinHandle};

/// Forward everything from `rx` to `tx` in arrival order. Returns when `rx` is closed and drained
/// (then `tx` is dropped, closing the output) or when every receiver of `tx` is gone.
/// Returns the number of units forwarded.
pub fn relay_loop<T>(rx: Receiver<T>, tx: Sender<T>, name: &str) -> usize {
    let mut forwarded = 0_usize;
    for unit in rx.iter() {
        if tx.send(unit).is_err() {
            debug!("relay {}: downstream closed after {} units", name, forwarded);
            break;
        }
        forwarded += 1;
    }
    drop(tx);
    forwarded
}

/// Spawn a relay thread. Takes both queue halves by value so the output closes with the thread.
pub fn spawn_relay<T: Send + 'static>(
    rx: Receiver<T>,
    tx: Sender<T>,
    name: &'static str,
) -> JoinHandle<usize> {
    thread::spawn(move || relay_loop(rx, tx, name))
}
