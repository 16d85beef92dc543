//! Fan-in: fold per-worker maps into the one global map. Single-threaded so the global map needs no lock.

use crossbeam_channel::{Receiver, Sender};
use log::info;
use std::thread::{self, JoinHandle};

use crate::{FrequencyMap, Tally};

/// Fold every map received on `partial_rx` until the channel closes.
pub fn fold_partials(partial_rx: &Receiver<FrequencyMap>) -> Tally {
    let mut tally = Tally::default();
    while let Ok(partial) = partial_rx.recv() {
        tally.total += tally.freq.merge(&partial);
        tally.partials += 1;
    }
    tally
}

/// Spawn the aggregator. It sends exactly one [`Tally`] on `result_tx` once every worker has finished.
pub fn spawn_aggregator(
    partial_rx: Receiver<FrequencyMap>,
    result_tx: Sender<Tally>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let tally = fold_partials(&partial_rx);
        info!("counted total: {}", tally.total);
        let _ = result_tx.send(tally);
    })
}
