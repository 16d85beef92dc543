use anyhow::Result;
use std::path::PathBuf;
use std::thread::JoinHandle;
use thiserror::Error;

use crate::Tally;

use super::reader::ReaderStats;

/// Failure of the source reader. The only fallible stage: workers and aggregator can't fail on their own.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open breadcrumb source {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read breadcrumb source after line {line}: {source}")]
    Read {
        line: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("reading cancelled after line {line}")]
    Cancelled { line: u64 },
}

/// Join a pipeline thread, turning a panic into an error naming the stage.
pub fn join_stage<T>(handle: JoinHandle<T>, stage: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("{} thread panicked", stage))
}

/// Single merge point for the reader outcome and the aggregator result.
/// A source error always wins: a tally built from a truncated input is discarded.
pub fn resolve_outcome(
    reader: std::result::Result<ReaderStats, SourceError>,
    tally: Option<Tally>,
) -> Result<(ReaderStats, Tally)> {
    let stats = match reader {
        Ok(stats) => stats,
        Err(err) => {
            if let Some(t) = tally {
                log::debug!(
                    "discarding partial tally ({} matches) after source error",
                    t.total
                );
            }
            return Err(err.into());
        }
    };
    let tally = tally.ok_or_else(|| anyhow::anyhow!("aggregator exited without a result"))?;
    Ok((stats, tally))
}
