use anyhow::Result;
use log::{debug, warn};

use crate::engine::extractor::Extractor;
use crate::engine::report::build_report;
use crate::pipeline;
use crate::{Opts, Report, RunStats, Tally};

use super::reader::{ReaderContext, Source};

/// Start reader → workers → aggregator. Returns handles; caller waits on `result_rx` and must join
/// every handle (see [`collect_tally`]).
pub fn run_pipeline(
    source: Source,
    opts: &Opts,
    on_batch: Option<Box<dyn Fn(usize) + Send>>,
) -> Result<pipeline::PipelineHandles> {
    let tuning = pipeline::PipelineTuning::from_opts(opts)?;
    // Compile before spawning anything so a bad pattern never leaves threads behind.
    let extractor = Extractor::compile(&opts.pattern, opts.separator.as_deref())?;
    debug!("pipeline: {:?}, source {:?}", tuning, source);

    let channels = pipeline::create_pipeline_channels(&tuning);

    let reader_handle = pipeline::spawn_reader_thread(
        channels.batch_tx,
        ReaderContext {
            source,
            pool: channels.pool.clone(),
            cancel: opts.cancel.clone(),
            on_batch,
        },
    );

    let worker_handles = pipeline::spawn_match_workers(
        channels.batch_rx,
        &channels.partial_tx,
        &channels.pool,
        &extractor,
        tuning.num_workers,
    );

    // Dropping the last sender closes the channel so the aggregator sees every worker finish.
    drop(channels.partial_tx);

    let aggregator_handle = pipeline::spawn_aggregator(channels.partial_rx, channels.result_tx);

    Ok(pipeline::PipelineHandles {
        result_rx: channels.result_rx,
        reader_handle,
        worker_handles,
        aggregator_handle,
        pool: channels.pool,
        tuning,
    })
}

/// Wait for the aggregator's tally, join every stage, then resolve the outcome at one point:
/// a source error preempts the tally; a panicked stage is an error; otherwise (tally, stats).
pub fn collect_tally(handles: pipeline::PipelineHandles) -> Result<(Tally, RunStats)> {
    let pipeline::PipelineHandles {
        result_rx,
        reader_handle,
        worker_handles,
        aggregator_handle,
        pool,
        tuning,
    } = handles;

    // Arrives only after the batch channel closed and every worker sent its map.
    let tally = result_rx.recv().ok();
    debug!("main: result channel delivered, joining stages");

    let reader_outcome = pipeline::join_stage(reader_handle, "reader")?;
    let mut scanned = pipeline::ScanCounts::default();
    for h in worker_handles {
        scanned.add(pipeline::join_stage(h, "worker")?);
    }
    pipeline::join_stage(aggregator_handle, "aggregator")?;

    let free = pool.free_count();
    if free != pool.capacity() {
        warn!(
            "buffer pool holds {} of {} batches after shutdown",
            free,
            pool.capacity()
        );
    }

    let (reader_stats, tally) = pipeline::resolve_outcome(reader_outcome, tally)?;
    let stats = RunStats {
        lines_read: reader_stats.lines,
        batches_published: reader_stats.batches,
        lines_scanned: scanned.processed,
        workers: tuning.num_workers,
        packet_size: tuning.packet_size,
        pool_size: tuning.pool_size,
        free_batches_at_exit: free,
        peak_outstanding: pool.peak_outstanding(),
    };
    Ok((tally, stats))
}

/// Main orchestrator: run the whole pipeline over `source` and build the report.
/// Source → batch channel → workers (match) → partial channel → aggregator → report.
pub fn collect_report(
    source: Source,
    opts: &Opts,
    on_batch: Option<Box<dyn Fn(usize) + Send>>,
) -> Result<Report> {
    let handles = run_pipeline(source, opts, on_batch)?;
    let (tally, stats) = collect_tally(handles)?;
    Ok(build_report(tally, stats))
}
