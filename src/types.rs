//! Public and internal types for the crumbstat API and pipeline.

use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::engine::extractor::TagPattern;

/// Structural nesting level of a breadcrumb: number of separator-delimited segments.
pub type Depth = u32;

/// Depth → occurrence count. Keys are unique; iteration order is unspecified.
///
/// Each worker owns one for its lifetime; the aggregator owns the global one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyMap(HashMap<Depth, u64>);

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence at `depth`.
    pub fn record(&mut self, depth: Depth) {
        *self.0.entry(depth).or_insert(0) += 1;
    }

    /// Add `count` occurrences at `depth`.
    pub fn add(&mut self, depth: Depth, count: u64) {
        *self.0.entry(depth).or_insert(0) += count;
    }

    /// Fold `other` into `self` by summing counters per depth. Returns the number of occurrences added.
    pub fn merge(&mut self, other: &FrequencyMap) -> u64 {
        let mut added = 0_u64;
        for (&depth, &count) in &other.0 {
            self.add(depth, count);
            added += count;
        }
        added
    }

    pub fn get(&self, depth: Depth) -> u64 {
        self.0.get(&depth).copied().unwrap_or(0)
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct depths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Depth, u64> {
        self.0.iter()
    }
}

impl FromIterator<(Depth, u64)> for FrequencyMap {
    fn from_iter<I: IntoIterator<Item = (Depth, u64)>>(iter: I) -> Self {
        let mut map = FrequencyMap::new();
        for (depth, count) in iter {
            map.add(depth, count);
        }
        map
    }
}

impl<'a> IntoIterator for &'a FrequencyMap {
    type Item = (&'a Depth, &'a u64);
    type IntoIter = hash_map::Iter<'a, Depth, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Aggregator output: the global map plus diagnostics gathered while folding.
#[derive(Clone, Debug, Default)]
pub struct Tally {
    pub freq: FrequencyMap,
    /// Grand total of matched occurrences.
    pub total: u64,
    /// Number of partial maps folded (one per worker).
    pub partials: usize,
}

/// One histogram row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HistogramRow {
    pub depth: Depth,
    pub count: u64,
}

/// Counters describing one pipeline run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunStats {
    /// Non-empty lines packed into batches.
    pub lines_read: u64,
    /// Batches published by the reader (full or partial).
    pub batches_published: u64,
    /// Lines scanned by the workers. Equals `lines_read` on a complete run.
    pub lines_scanned: u64,
    pub workers: usize,
    pub packet_size: usize,
    pub pool_size: usize,
    /// Free batches once every stage has exited. Equals `pool_size` on a healthy run.
    pub free_batches_at_exit: usize,
    /// Most batches held outside the pool at once.
    pub peak_outstanding: usize,
}

/// Final result of a run: the histogram, its weighted average and run counters.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    /// `None` when no breadcrumb matched.
    pub average_depth: Option<f64>,
    pub total: u64,
    pub histogram: Vec<HistogramRow>,
    #[serde(skip)]
    pub freq: FrequencyMap,
    pub stats: RunStats,
}

/// Lib-only options for [`crumb_file`](crate::crumb_file) and [`crumb_reader`](crate::crumb_reader).
#[derive(Clone, Debug, Default)]
pub struct CrumbOpts {
    /// Worker thread count. When None, uses rayon's view of available parallelism.
    pub num_threads: Option<usize>,
    /// Lines per batch. When None, [`PipelineDefaults::PACKET_SIZE`](crate::utils::PipelineDefaults::PACKET_SIZE).
    pub packet_size: Option<usize>,
    /// Batches in the pool. When None, [`PipelineDefaults::POOL_SIZE`](crate::utils::PipelineDefaults::POOL_SIZE).
    pub pool_size: Option<usize>,
    /// Batch channel capacity. When None, [`PipelineDefaults::QUEUE_DEPTH`](crate::utils::PipelineDefaults::QUEUE_DEPTH).
    pub queue_depth: Option<usize>,
    /// Which tag pattern to match.
    pub pattern: TagPattern,
    /// Breadcrumb segment separator. When None, `/`.
    pub separator: Option<String>,
    /// Set to true from another thread to stop reading; the run then fails as cancelled.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl From<&CrumbOpts> for Opts {
    fn from(o: &CrumbOpts) -> Self {
        Opts {
            num_threads: o.num_threads,
            packet_size: o.packet_size,
            pool_size: o.pool_size,
            queue_depth: o.queue_depth,
            pattern: o.pattern.clone(),
            separator: o.separator.clone(),
            verbose: false,
            json: false,
            cancel: o.cancel.clone(),
        }
    }
}

/// Full options (CLI). Use [`CrumbOpts`] for lib.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    pub num_threads: Option<usize>,
    pub packet_size: Option<usize>,
    pub pool_size: Option<usize>,
    pub queue_depth: Option<usize>,
    pub pattern: TagPattern,
    pub separator: Option<String>,
    /// Debug logging and progress counter.
    pub verbose: bool,
    /// Print the report as JSON instead of text.
    pub json: bool,
    pub cancel: Option<Arc<AtomicBool>>,
}
