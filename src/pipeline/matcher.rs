use crossbeam_channel::{Receiver, Sender};
use log::info;
use std::thread::{self, JoinHandle};

use crate::FrequencyMap;
use crate::engine::extractor::Extractor;

use super::pool::{Batch, BufferPool};

/// Per-batch (or per-worker) scan counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanCounts {
    /// Lines looked at.
    pub processed: u64,
    /// Lines whose breadcrumb was counted.
    pub matched: u64,
}

impl ScanCounts {
    pub fn add(&mut self, other: ScanCounts) {
        self.processed += other.processed;
        self.matched += other.matched;
    }
}

/// Scan the valid lines of `batch` in order and count each breadcrumb's depth into `freq`.
/// Slots past the batch's valid length are never looked at.
pub fn scan_batch(batch: &Batch, extractor: &Extractor, freq: &mut FrequencyMap) -> ScanCounts {
    let mut counts = ScanCounts::default();
    for line in batch.lines() {
        counts.processed += 1;
        if let Some(depth) = extractor.depth(line) {
            freq.record(depth);
            counts.matched += 1;
        }
    }
    counts
}

/// Single match worker: pull batches until the channel is closed and drained, returning each to the
/// pool once scanned; then send the local map on `partial_tx`.
fn match_worker_loop(
    worker_id: usize,
    batch_rx: Receiver<Batch>,
    partial_tx: Sender<FrequencyMap>,
    pool: BufferPool,
    extractor: Extractor,
) -> ScanCounts {
    let mut freq = FrequencyMap::new();
    let mut counts = ScanCounts::default();
    while let Ok(batch) = batch_rx.recv() {
        counts.add(scan_batch(&batch, &extractor, &mut freq));
        pool.release(batch);
    }
    info!("worker {}: processed lines {}", worker_id, counts.processed);
    info!("worker {}: breadcrumbs found {}", worker_id, counts.matched);
    let _ = partial_tx.send(freq);
    drop(partial_tx);
    counts
}

/// Spawn `num_workers` match workers sharing `batch_rx`. Caller must drop its own `partial_tx`
/// after this so the partial channel closes once the last worker exits.
pub fn spawn_match_workers(
    batch_rx: Receiver<Batch>,
    partial_tx: &Sender<FrequencyMap>,
    pool: &BufferPool,
    extractor: &Extractor,
    num_workers: usize,
) -> Vec<JoinHandle<ScanCounts>> {
    (0..num_workers)
        .map(|worker_id| {
            let batch_rx = batch_rx.clone();
            let partial_tx = partial_tx.clone();
            let pool = pool.clone();
            let extractor = extractor.clone();
            thread::spawn(move || {
                match_worker_loop(worker_id, batch_rx, partial_tx, pool, extractor)
            })
        })
        .collect()
}
