//! Crumbstat CLI: breadcrumb depth histogram for a line-oriented dump.

use anyhow::Result;
use clap::Parser;
use crumbstat::engine::arg_parser::Cli;
use crumbstat::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
