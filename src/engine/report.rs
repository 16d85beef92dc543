//! Reporting: weighted average depth and the depth-sorted histogram. Pure; no I/O.

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::{FrequencyMap, HistogramRow, Report, RunStats, Tally};

/// `Σ(depth·count) / Σ(count)`, or None for an empty map.
pub fn average_depth(freq: &FrequencyMap) -> Option<f64> {
    let mut sum_total = 0_f64;
    let mut sum_weighted = 0_f64;
    for (&depth, &count) in freq {
        sum_total += count as f64;
        sum_weighted += f64::from(depth) * count as f64;
    }
    if sum_total == 0.0 {
        return None;
    }
    Some(sum_weighted / sum_total)
}

/// Rows sorted ascending by depth.
pub fn histogram(freq: &FrequencyMap) -> Vec<HistogramRow> {
    let mut rows: Vec<HistogramRow> = freq
        .iter()
        .map(|(&depth, &count)| HistogramRow { depth, count })
        .collect();
    rows.sort_unstable_by_key(|r| r.depth);
    rows
}

/// Build the final report from the aggregator's tally.
pub fn build_report(tally: Tally, stats: RunStats) -> Report {
    Report {
        average_depth: average_depth(&tally.freq),
        total: tally.total,
        histogram: histogram(&tally.freq),
        freq: tally.freq,
        stats,
    }
}

/// Plain-text report: average line, then one `Length` line per depth.
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    match report.average_depth {
        Some(avg) => {
            let _ = writeln!(out, "Average len: {:.2}", avg);
        }
        None => {
            out.push_str("Average len: n/a (no breadcrumbs found)\n");
        }
    }
    for row in &report.histogram {
        let _ = writeln!(out, "Length {:2}: {:8}", row.depth, row.count);
    }
    out
}

/// Pretty JSON report.
pub fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize report")
}
