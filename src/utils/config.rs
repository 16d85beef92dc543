//! Application configuration constants.
//! Tuning and defaults in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Dotfile looked up in the working directory when no `--config` is given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Pipeline ----

/// Defaults for the batch pipeline. Every value can be overridden by opts, config file or CLI.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Lines per batch.
    pub const PACKET_SIZE: usize = 5000;
    /// Batches allocated up front; the only batches that ever exist during a run.
    pub const POOL_SIZE: usize = 10;
    /// Capacity of the reader → worker batch channel.
    pub const QUEUE_DEPTH: usize = 10;
    /// Breadcrumb segment separator.
    pub const SEPARATOR: &'static str = "/";
    /// Input path when none is given on the command line.
    pub const INPUT_PATH: &'static str = "./structure.rdf.u8";
}

// ---- Worker threads ----

/// Worker thread count resolution.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
}

impl WorkerThreadLimits {
    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads().max(1),
        }
    }
}

// ---- Progress ----

/// Progress counter tuning.
pub struct ProgressConsts;

impl ProgressConsts {
    pub const COUNTER_DESC: &'static str = "Reading";
    pub const COUNTER_UNIT: &'static str = " lines";
}
