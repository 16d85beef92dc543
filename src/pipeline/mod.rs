//! Pipeline components: buffer pool, source reader, match workers, aggregator, coordinator.

pub mod aggregator;
pub mod context;
pub mod error_handler;
pub mod matcher;
pub mod orchestrator;
pub mod pool;
pub mod reader;

pub use aggregator::{fold_partials, spawn_aggregator};
pub use context::{PipelineChannels, PipelineHandles, PipelineTuning, create_pipeline_channels};
pub use error_handler::{SourceError, join_stage, resolve_outcome};
pub use matcher::{ScanCounts, scan_batch, spawn_match_workers};
pub use orchestrator::{collect_report, collect_tally, run_pipeline};
pub use pool::{Batch, BufferPool};
pub use reader::{ReaderContext, ReaderStats, Source, run_reader_loop, spawn_reader_thread};
