//! Pipeline tuning and wiring: channel set, pool and the handles returned to the coordinator.

use anyhow::{Result, bail};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::thread::JoinHandle;

use crate::engine::parallel::resolve_worker_count;
use crate::utils::config::PipelineDefaults;
use crate::{FrequencyMap, Opts, Tally};

use super::error_handler::SourceError;
use super::matcher::ScanCounts;
use super::pool::{Batch, BufferPool};
use super::reader::ReaderStats;

/// Sizes for one run. Passed into the pipeline explicitly; nothing here is process-global.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineTuning {
    pub num_workers: usize,
    /// Lines per batch.
    pub packet_size: usize,
    /// Batches allocated for the whole run.
    pub pool_size: usize,
    /// Reader → worker channel capacity.
    pub queue_depth: usize,
}

impl PipelineTuning {
    /// Resolve from opts, falling back to [`PipelineDefaults`]. Every size must be at least 1.
    pub fn from_opts(opts: &Opts) -> Result<Self> {
        let tuning = Self {
            num_workers: resolve_worker_count(opts.num_threads),
            packet_size: opts.packet_size.unwrap_or(PipelineDefaults::PACKET_SIZE),
            pool_size: opts.pool_size.unwrap_or(PipelineDefaults::POOL_SIZE),
            queue_depth: opts.queue_depth.unwrap_or(PipelineDefaults::QUEUE_DEPTH),
        };
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("workers", self.num_workers),
            ("packet size", self.packet_size),
            ("pool size", self.pool_size),
            ("queue depth", self.queue_depth),
        ] {
            if v == 0 {
                bail!("{} must be at least 1", name);
            }
        }
        Ok(())
    }
}

/// Channels and the pool for one run. Reader gets batch_tx; workers get batch_rx and partial_tx;
/// aggregator gets partial_rx and result_tx; the coordinator keeps result_rx.
pub struct PipelineChannels {
    pub batch_tx: Sender<Batch>,
    pub batch_rx: Receiver<Batch>,
    pub partial_tx: Sender<FrequencyMap>,
    pub partial_rx: Receiver<FrequencyMap>,
    pub result_tx: Sender<Tally>,
    pub result_rx: Receiver<Tally>,
    pub pool: BufferPool,
}

pub fn create_pipeline_channels(tuning: &PipelineTuning) -> PipelineChannels {
    let (batch_tx, batch_rx) = bounded::<Batch>(tuning.queue_depth);
    // One map per worker, so sends never block.
    let (partial_tx, partial_rx) = bounded::<FrequencyMap>(tuning.num_workers);
    let (result_tx, result_rx) = bounded::<Tally>(1);
    let pool = BufferPool::new(tuning.pool_size, tuning.packet_size);

    PipelineChannels {
        batch_tx,
        batch_rx,
        partial_tx,
        partial_rx,
        result_tx,
        result_rx,
        pool,
    }
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): receive the tally and join when done.
pub struct PipelineHandles {
    pub result_rx: Receiver<Tally>,
    pub reader_handle: JoinHandle<Result<ReaderStats, SourceError>>,
    pub worker_handles: Vec<JoinHandle<ScanCounts>>,
    pub aggregator_handle: JoinHandle<()>,
    pub pool: BufferPool,
    pub tuning: PipelineTuning,
}
