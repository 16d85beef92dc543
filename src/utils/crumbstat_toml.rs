//! Load `.crumbstat.toml` (CLI only). Lib does not use this; the consuming program injects config via CrumbOpts.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::engine::extractor::TagPattern;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct CrumbstatToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    packet_size: Option<usize>,
    pool_size: Option<usize>,
    queue_depth: Option<usize>,
    workers: Option<usize>,
    pattern: Option<String>,
    separator: Option<String>,
    json: Option<bool>,
    verbose: Option<bool>,
}

/// Parse config text.
pub fn parse_crumbstat_toml(s: &str) -> Result<CrumbstatToml> {
    toml::from_str(s).context("parse config")
}

/// Load an explicitly requested config file. Missing or malformed is an error.
pub fn load_config_file(path: &Path) -> Result<CrumbstatToml> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse_crumbstat_toml(&s).with_context(|| format!("config {}", path.display()))
}

/// Load `.crumbstat.toml` from `dir` if present. Ok(None) if the file is missing or unreadable;
/// Err if it exists but doesn't parse (callers warn and carry on, since the file is implicit).
pub fn load_crumbstat_toml(dir: &Path) -> Result<Option<CrumbstatToml>> {
    let path = dir.join(PackagePaths::get().config_filename());
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    parse_crumbstat_toml(&s)
        .map(Some)
        .with_context(|| format!("{}", path.display()))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $opts:expr, $idx_field:ident => $opts_field:ident) => {
        if let Some(v) = $idx.$idx_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only set fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &CrumbstatToml, opts: &mut Opts) {
    let s = &file.settings;
    if s.packet_size.is_some() {
        opts.packet_size = s.packet_size;
    }
    if s.pool_size.is_some() {
        opts.pool_size = s.pool_size;
    }
    if s.queue_depth.is_some() {
        opts.queue_depth = s.queue_depth;
    }
    if s.workers.is_some() {
        opts.num_threads = s.workers;
    }
    if let Some(ref p) = s.pattern {
        opts.pattern = TagPattern::from_option(Some(p));
    }
    if s.separator.is_some() {
        opts.separator = s.separator.clone();
    }
    apply_file_opt!(s, opts, json => json);
    apply_file_opt!(s, opts, verbose => verbose);
}
