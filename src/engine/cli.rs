//! CLI command handler: resolve options (defaults < config file < flags), run, print.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::engine::extractor::TagPattern;
use crate::engine::progress::{finish_progress, setup_progress};
use crate::engine::report::{render_json, render_text};
use crate::pipeline::{Source, collect_report};
use crate::utils::{
    CrumbstatToml, apply_file_to_opts, load_config_file, load_crumbstat_toml, setup_logging,
};

/// Merge file config and CLI flags into Opts. Flags win over the file.
pub fn build_opts(cli: &Cli, file: Option<&CrumbstatToml>) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = file {
        apply_file_to_opts(file, &mut opts);
    }
    if cli.workers.is_some() {
        opts.num_threads = cli.workers;
    }
    if cli.packet_size.is_some() {
        opts.packet_size = cli.packet_size;
    }
    if cli.pool_size.is_some() {
        opts.pool_size = cli.pool_size;
    }
    if cli.queue_depth.is_some() {
        opts.queue_depth = cli.queue_depth;
    }
    if let Some(ref p) = cli.pattern {
        opts.pattern = TagPattern::from_option(Some(p));
    }
    if cli.separator.is_some() {
        opts.separator = cli.separator.clone();
    }
    if let Some(json) = cli.json {
        opts.json = json;
    }
    if let Some(verbose) = cli.verbose {
        opts.verbose = verbose;
    }
    opts
}

/// Run the pipeline over `cli.path` and print the report to stdout.
pub fn handle_run(cli: &Cli) -> Result<()> {
    // An explicit --config must load; the implicit dotfile is only warned about.
    let (file, dotfile_err) = match &cli.config {
        Some(path) => (Some(load_config_file(path)?), None),
        None => match load_crumbstat_toml(Path::new(".")) {
            Ok(file) => (file, None),
            Err(e) => (None, Some(e)),
        },
    };
    let mut opts = build_opts(cli, file.as_ref());
    setup_logging(opts.verbose);
    if let Some(e) = dotfile_err {
        warn!("ignoring config {:#}", e);
    }

    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;
    opts.cancel = Some(cancel_requested);

    debug!("Reading breadcrumbs from {}", cli.path.display());
    let (bar, on_batch) = setup_progress(opts.verbose);
    let report = collect_report(Source::from_arg(&cli.path), &opts, on_batch);
    finish_progress(&bar);
    let report = report?;

    debug!(
        "{} lines in {} batches, {} workers, pool {}/{} free at exit (peak {} out)",
        report.stats.lines_read,
        report.stats.batches_published,
        report.stats.workers,
        report.stats.free_batches_at_exit,
        report.stats.pool_size,
        report.stats.peak_outstanding
    );

    if opts.json {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}
