//! Shared helpers for parallel processing.

use log::debug;

use crate::utils::config::WorkerThreadLimits;

/// Worker count for a run: the requested value, else available parallelism.
pub fn resolve_worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(n) => {
            debug!("Using {} match workers (requested)", n);
            n
        }
        None => {
            let n = WorkerThreadLimits::current().all_threads;
            debug!("Using {} match workers (available parallelism)", n);
            n
        }
    }
}
