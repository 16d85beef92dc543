//! Source reader: streams lines from the input into pooled batches and publishes full ones.

use crossbeam_channel::{SendError, Sender};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use super::error_handler::SourceError;
use super::pool::{Batch, BufferPool};

/// Where lines come from. Opened on the reader thread so open failures travel the same path as read failures.
pub enum Source {
    Path(PathBuf),
    Stdin,
    Reader(Box<dyn BufRead + Send>),
}

impl Source {
    /// `-` means stdin; anything else is a file path.
    pub fn from_arg(arg: &Path) -> Self {
        if arg.as_os_str() == "-" {
            Source::Stdin
        } else {
            Source::Path(arg.to_path_buf())
        }
    }

    fn open(self) -> Result<Box<dyn BufRead + Send>, SourceError> {
        match self {
            Source::Path(path) => match File::open(&path) {
                Ok(f) => Ok(Box::new(BufReader::new(f))),
                Err(source) => Err(SourceError::Open { path, source }),
            },
            Source::Stdin => Ok(Box::new(BufReader::new(std::io::stdin()))),
            Source::Reader(r) => Ok(r),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Stdin => f.write_str("<stdin>"),
            Source::Reader(_) => f.write_str("<reader>"),
        }
    }
}

/// What the reader produced on success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Non-empty lines packed into batches.
    pub lines: u64,
    /// Batches sent downstream.
    pub batches: u64,
}

/// Everything the reader thread owns besides its sender.
pub struct ReaderContext {
    pub source: Source,
    pub pool: BufferPool,
    pub cancel: Option<Arc<AtomicBool>>,
    /// Called with the line count of each published batch.
    pub on_batch: Option<Box<dyn Fn(usize) + Send>>,
}

/// Spawn the reader. The batch channel closes when the thread returns, on success or failure.
pub fn spawn_reader_thread(
    batch_tx: Sender<Batch>,
    ctx: ReaderContext,
) -> JoinHandle<Result<ReaderStats, SourceError>> {
    thread::spawn(move || {
        let ReaderContext {
            source,
            pool,
            cancel,
            on_batch,
        } = ctx;
        log::debug!("reader: opening {:?}", source);
        let input = source.open()?;
        run_reader_loop(input, batch_tx, &pool, cancel.as_deref(), on_batch.as_deref())
    })
}

/// Fill batches from `input` and send each full batch on `batch_tx`; send the trailing partial batch at EOF.
///
/// Lines are read straight into the batch slots, so steady state allocates nothing. Empty lines are skipped.
/// On a read error or cancellation the held batch goes back to the pool before returning.
/// Consumes `batch_tx`: returning drops the last sender and closes the channel.
pub fn run_reader_loop<R: BufRead>(
    mut input: R,
    batch_tx: Sender<Batch>,
    pool: &BufferPool,
    cancel: Option<&AtomicBool>,
    on_batch: Option<&(dyn Fn(usize) + Send)>,
) -> Result<ReaderStats, SourceError> {
    let mut stats = ReaderStats::default();
    let mut line_no = 0_u64;
    let mut batch = pool.acquire();

    loop {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            pool.release(batch);
            log::debug!("reader: cancelled after line {}", line_no);
            return Err(SourceError::Cancelled { line: line_no });
        }
        let Some(slot) = batch.next_slot() else {
            unreachable!("batches are published as soon as they fill");
        };
        match input.read_line(slot) {
            Ok(0) => break,
            Ok(_) => {
                line_no += 1;
                trim_line_ending(slot);
                if slot.is_empty() {
                    continue;
                }
                batch.commit();
                stats.lines += 1;
                if batch.is_full() {
                    if publish(batch, &batch_tx, pool, &mut stats, on_batch).is_none() {
                        return Ok(stats);
                    }
                    // Blocks while every batch is downstream: this is the reader's backpressure.
                    batch = pool.acquire();
                }
            }
            Err(source) => {
                pool.release(batch);
                return Err(SourceError::Read {
                    line: line_no,
                    source,
                });
            }
        }
    }

    if batch.is_empty() {
        pool.release(batch);
    } else {
        let _ = publish(batch, &batch_tx, pool, &mut stats, on_batch);
    }
    log::debug!(
        "reader: done, {} lines in {} batches",
        stats.lines,
        stats.batches
    );
    Ok(stats)
}

/// Send `batch` downstream. Returns None if every worker is gone; the batch is then returned to the pool.
fn publish(
    batch: Batch,
    batch_tx: &Sender<Batch>,
    pool: &BufferPool,
    stats: &mut ReaderStats,
    on_batch: Option<&(dyn Fn(usize) + Send)>,
) -> Option<()> {
    let n = batch.len();
    match batch_tx.send(batch) {
        Ok(()) => {
            stats.batches += 1;
            if let Some(f) = on_batch {
                f(n);
            }
            Some(())
        }
        Err(SendError(batch)) => {
            log::warn!("reader: no workers left to receive batches; stopping early");
            pool.release(batch);
            None
        }
    }
}

/// Strip one trailing `\n` or `\r\n`.
pub fn trim_line_ending(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}
