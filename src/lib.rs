//! Crumbstat: streaming breadcrumb-depth histogram over large line-oriented dumps

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::extractor::TagPattern;
pub use pipeline::{Source, SourceError};

use log::debug;
use std::io::BufRead;
use std::path::Path;

/// Result alias used by public crumbstat API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Run the pipeline over any [`Source`] with `opts` and return the report.
///
/// A source failure (open, read, cancel) is returned as an error wrapping [`SourceError`]; no partial
/// report is produced in that case.
pub fn crumb_source(source: Source, opts: &CrumbOpts) -> Result<Report> {
    let opts = Opts::from(opts);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    pipeline::collect_report(source, &opts, None)
}

/// Histogram the breadcrumbs in the file at `path`.
///
/// ```ignore
/// let opts = crumbstat::CrumbOpts { num_threads: Some(4), ..Default::default() };
/// let report = crumbstat::crumb_file(Path::new("structure.rdf.u8"), &opts)?;
/// println!("{:?}", report.average_depth);
/// ```
pub fn crumb_file(path: &Path, opts: &CrumbOpts) -> Result<Report> {
    crumb_source(Source::Path(path.to_path_buf()), opts)
}

/// Histogram the breadcrumbs read from `reader` (e.g. an in-memory buffer or a decompressor).
pub fn crumb_reader<R>(reader: R, opts: &CrumbOpts) -> Result<Report>
where
    R: BufRead + Send + 'static,
{
    crumb_source(Source::Reader(Box::new(reader)), opts)
}
