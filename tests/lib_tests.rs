use clap::Parser;
use crumbstat::engine::{
    Cli, Extractor, TagPattern, average_depth, breadcrumb_depth, build_opts, build_report,
    histogram, render_json, render_text,
};
use crumbstat::pipeline::{BufferPool, Source, scan_batch};
use crumbstat::utils::{apply_file_to_opts, parse_crumbstat_toml};
use crumbstat::{FrequencyMap, HistogramRow, Opts, RunStats, Tally};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn topic_line(crumb: &str) -> String {
    format!("<Topic r:id=\"{}\">", crumb)
}

fn freq(pairs: &[(u32, u64)]) -> FrequencyMap {
    pairs.iter().copied().collect()
}

// --- breadcrumb_depth / Extractor ---

#[test]
fn test_breadcrumb_depth_counts_segments() {
    assert_eq!(breadcrumb_depth("Top", "/"), 1);
    assert_eq!(breadcrumb_depth("Top/Arts/Movies", "/"), 3);
    assert_eq!(breadcrumb_depth("a//b", "/"), 3);
}

#[test]
fn test_breadcrumb_depth_empty_is_one_segment() {
    assert_eq!(breadcrumb_depth("", "/"), 1);
}

#[test]
fn test_extractor_topic_matches() {
    let ex = Extractor::compile(&TagPattern::Topic, None).unwrap();
    assert_eq!(ex.depth(&topic_line("Top/Arts/Movies")), Some(3));
    assert_eq!(ex.extract(&topic_line("Top/Arts")), Some("Top/Arts"));
}

#[test]
fn test_extractor_topic_allows_surrounding_whitespace() {
    let ex = Extractor::compile(&TagPattern::Topic, None).unwrap();
    assert_eq!(ex.depth("   <Topic   r:id=\"Top/Arts\">  "), Some(2));
    assert_eq!(ex.depth("\t<Topic r:id=\"\">"), Some(1));
}

#[test]
fn test_extractor_topic_rejects_other_lines() {
    let ex = Extractor::compile(&TagPattern::Topic, None).unwrap();
    assert_eq!(ex.depth("<Title>Arts</Title>"), None);
    assert_eq!(ex.depth("<Topic r:id=\"Top/Arts\"> trailing"), None);
    // Tags split over two lines are never matched.
    assert_eq!(ex.depth("<Topic"), None);
    assert_eq!(ex.depth("r:id=\"Top/Arts\">"), None);
}

#[test]
fn test_extractor_custom_pattern_and_separator() {
    let pattern = TagPattern::Custom(r"^path=(\S+)$".to_string());
    let ex = Extractor::compile(&pattern, Some(".")).unwrap();
    assert_eq!(ex.depth("path=a.b.c"), Some(3));
    assert_eq!(ex.depth("other=a.b.c"), None);
    assert_eq!(ex.separator(), ".");
}

#[test]
fn test_extractor_rejects_pattern_without_group() {
    let pattern = TagPattern::Custom("^<Topic".to_string());
    assert!(Extractor::compile(&pattern, None).is_err());
}

#[test]
fn test_extractor_rejects_bad_regex() {
    let pattern = TagPattern::Custom("(unclosed".to_string());
    assert!(Extractor::compile(&pattern, None).is_err());
}

#[test]
fn test_extractor_rejects_empty_separator() {
    assert!(Extractor::compile(&TagPattern::Topic, Some("")).is_err());
}

#[test]
fn test_tag_pattern_from_option() {
    assert_eq!(TagPattern::from_option(None), TagPattern::Topic);
    assert_eq!(TagPattern::from_option(Some("topic")), TagPattern::Topic);
    assert_eq!(
        TagPattern::from_option(Some("^x=(.*)$")),
        TagPattern::Custom("^x=(.*)$".to_string())
    );
}

// --- FrequencyMap ---

#[test]
fn test_frequency_map_record_and_total() {
    let mut m = FrequencyMap::new();
    m.record(2);
    m.record(2);
    m.record(5);
    assert_eq!(m.get(2), 2);
    assert_eq!(m.get(5), 1);
    assert_eq!(m.get(9), 0);
    assert_eq!(m.total(), 3);
    assert_eq!(m.len(), 2);
}

#[test]
fn test_frequency_map_merge_sums_per_depth() {
    let mut a = freq(&[(1, 2), (3, 4)]);
    let b = freq(&[(3, 1), (7, 10)]);
    let added = a.merge(&b);
    assert_eq!(added, 11);
    assert_eq!(a, freq(&[(1, 2), (3, 5), (7, 10)]));
}

#[test]
fn test_frequency_map_merge_order_independent() {
    let parts = [freq(&[(1, 1), (2, 2)]), freq(&[(2, 3)]), freq(&[(4, 1), (1, 5)])];
    let mut forward = FrequencyMap::new();
    for p in &parts {
        forward.merge(p);
    }
    let mut backward = FrequencyMap::new();
    for p in parts.iter().rev() {
        backward.merge(p);
    }
    assert_eq!(forward, backward);
}

// --- average_depth / histogram / render ---

#[test]
fn test_average_depth_weighted() {
    let m = freq(&[(2, 3), (4, 1)]);
    assert_eq!(average_depth(&m), Some(2.5));
}

#[test]
fn test_average_depth_empty_is_none() {
    assert_eq!(average_depth(&FrequencyMap::new()), None);
}

#[test]
fn test_histogram_sorted_by_depth() {
    let m = freq(&[(5, 1), (2, 4), (3, 2)]);
    let rows = histogram(&m);
    let depths: Vec<u32> = rows.iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![2, 3, 5]);
    assert_eq!(rows[0], HistogramRow { depth: 2, count: 4 });
}

fn report_for(pairs: &[(u32, u64)]) -> crumbstat::Report {
    let f = freq(pairs);
    let tally = Tally {
        total: f.total(),
        freq: f,
        partials: 1,
    };
    build_report(tally, RunStats::default())
}

#[test]
fn test_render_text_format() {
    let report = report_for(&[(3, 1), (2, 2)]);
    assert_eq!(
        render_text(&report),
        "Average len: 2.33\nLength  2:        2\nLength  3:        1\n"
    );
}

#[test]
fn test_render_text_empty_map() {
    let report = report_for(&[]);
    let text = render_text(&report);
    assert_eq!(text, "Average len: n/a (no breadcrumbs found)\n");
    assert!(!text.contains("Length"));
}

#[test]
fn test_render_json_fields() {
    let report = report_for(&[(2, 3), (4, 1)]);
    let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
    assert_eq!(json["average_depth"], 2.5);
    assert_eq!(json["total"], 4);
    assert_eq!(json["histogram"][0]["depth"], 2);
    assert_eq!(json["histogram"][1]["count"], 1);
    assert!(json.get("freq").is_none());
}

// --- Batch / BufferPool ---

#[test]
fn test_batch_push_until_full() {
    let pool = BufferPool::new(1, 3);
    let mut batch = pool.acquire();
    assert_eq!(batch.capacity(), 3);
    assert!(batch.is_empty());
    assert!(batch.push("a"));
    assert!(batch.push("b"));
    assert!(batch.push("c"));
    assert!(batch.is_full());
    assert!(!batch.push("d"));
    assert_eq!(batch.lines(), ["a", "b", "c"]);
    pool.release(batch);
}

#[test]
fn test_batch_reset_hides_stale_slots() {
    let pool = BufferPool::new(1, 4);
    let mut batch = pool.acquire();
    for s in ["a", "b", "c", "d"] {
        batch.push(s);
    }
    batch.reset();
    batch.push("x");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.lines(), ["x"]);
    pool.release(batch);
}

#[test]
fn test_pool_acquire_returns_empty_batch() {
    let pool = BufferPool::new(1, 2);
    let mut batch = pool.acquire();
    batch.push("left over");
    pool.release(batch);
    let batch = pool.acquire();
    assert!(batch.is_empty());
    pool.release(batch);
}

#[test]
fn test_pool_conservation_counts() {
    let pool = BufferPool::new(3, 4);
    assert_eq!(pool.capacity(), 3);
    assert_eq!(pool.free_count(), 3);
    assert_eq!(pool.outstanding(), 0);

    let a = pool.acquire();
    let b = pool.acquire();
    assert_eq!(pool.free_count(), 1);
    assert_eq!(pool.outstanding(), 2);
    assert_eq!(pool.free_count() + pool.outstanding(), pool.capacity());

    pool.release(a);
    assert_eq!(pool.free_count() + pool.outstanding(), pool.capacity());
    pool.release(b);
    assert_eq!(pool.free_count(), 3);
    assert_eq!(pool.outstanding(), 0);
    assert_eq!(pool.peak_outstanding(), 2);
}

#[test]
fn test_pool_try_acquire_when_exhausted() {
    let pool = BufferPool::new(1, 1);
    let held = pool.try_acquire().unwrap();
    assert!(pool.try_acquire().is_none());
    pool.release(held);
    assert!(pool.try_acquire().is_some());
}

#[test]
fn test_pool_clone_shares_batches() {
    let pool = BufferPool::new(2, 1);
    let other = pool.clone();
    let batch = other.acquire();
    assert_eq!(pool.free_count(), 1);
    assert_eq!(pool.outstanding(), 1);
    pool.release(batch);
    assert_eq!(other.free_count(), 2);
}

#[test]
fn test_pool_acquire_blocks_until_release() {
    let pool = BufferPool::new(1, 1);
    let held = pool.acquire();

    let (tx, rx) = mpsc::channel();
    let waiter_pool = pool.clone();
    let waiter = thread::spawn(move || {
        let batch = waiter_pool.acquire();
        tx.send(()).unwrap();
        waiter_pool.release(batch);
    });

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    pool.release(held);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    waiter.join().unwrap();
    assert_eq!(pool.free_count(), 1);
}

// --- scan_batch ---

#[test]
fn test_scan_batch_counts_matches() {
    let ex = Extractor::compile(&TagPattern::Topic, None).unwrap();
    let pool = BufferPool::new(1, 4);
    let mut batch = pool.acquire();
    batch.push(&topic_line("Top/A"));
    batch.push("<Title>no</Title>");
    batch.push(&topic_line("Top/A/B"));
    batch.push(&topic_line("Top/C"));

    let mut m = FrequencyMap::new();
    let counts = scan_batch(&batch, &ex, &mut m);
    assert_eq!(counts.processed, 4);
    assert_eq!(counts.matched, 3);
    assert_eq!(m, freq(&[(2, 2), (3, 1)]));
    pool.release(batch);
}

#[test]
fn test_scan_batch_ignores_content_past_valid_length() {
    let ex = Extractor::compile(&TagPattern::Topic, None).unwrap();
    let pool = BufferPool::new(1, 5);
    let mut batch = pool.acquire();
    for _ in 0..5 {
        batch.push(&topic_line("Stale/Deep/Crumb/Path"));
    }
    batch.reset();
    batch.push(&topic_line("Top/A"));
    batch.push("not a topic");

    let mut m = FrequencyMap::new();
    let counts = scan_batch(&batch, &ex, &mut m);
    assert_eq!(counts.processed, 2);
    assert_eq!(counts.matched, 1);
    assert_eq!(m, freq(&[(2, 1)]));
    pool.release(batch);
}

// --- config file / CLI ---

#[test]
fn test_config_file_applies_settings() {
    let file = parse_crumbstat_toml(
        r#"
[settings]
packet_size = 100
pool_size = 4
queue_depth = 2
workers = 3
pattern = "^id=(.*)$"
separator = "."
json = true
"#,
    )
    .unwrap();
    let mut opts = Opts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.packet_size, Some(100));
    assert_eq!(opts.pool_size, Some(4));
    assert_eq!(opts.queue_depth, Some(2));
    assert_eq!(opts.num_threads, Some(3));
    assert_eq!(opts.pattern, TagPattern::Custom("^id=(.*)$".to_string()));
    assert_eq!(opts.separator.as_deref(), Some("."));
    assert!(opts.json);
    assert!(!opts.verbose);
}

#[test]
fn test_config_file_rejects_unknown_key() {
    assert!(parse_crumbstat_toml("[settings]\npacket_sz = 1\n").is_err());
}

#[test]
fn test_config_file_empty_is_default() {
    let file = parse_crumbstat_toml("").unwrap();
    let mut opts = Opts::default();
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.packet_size, None);
    assert_eq!(opts.pattern, TagPattern::Topic);
}

#[test]
fn test_cli_overrides_config_file() {
    let file = parse_crumbstat_toml("[settings]\npacket_size = 100\npool_size = 4\njson = true\n")
        .unwrap();
    let cli =
        Cli::try_parse_from(["crumbstat", "dump.rdf", "--packet-size", "200", "--json=false"])
            .unwrap();
    let opts = build_opts(&cli, Some(&file));
    assert_eq!(opts.packet_size, Some(200));
    assert_eq!(opts.pool_size, Some(4));
    assert!(!opts.json);
}

#[test]
fn test_cli_defaults() {
    let cli = Cli::try_parse_from(["crumbstat"]).unwrap();
    assert_eq!(cli.path, PathBuf::from("./structure.rdf.u8"));
    assert_eq!(cli.workers, None);
    let opts = build_opts(&cli, None);
    assert_eq!(opts.pattern, TagPattern::Topic);
    assert!(!opts.json);
    assert!(!opts.verbose);
}

#[test]
fn test_cli_bare_bool_flag() {
    let cli = Cli::try_parse_from(["crumbstat", "-w", "2", "dump.rdf", "--json"]).unwrap();
    assert_eq!(cli.workers, Some(2));
    assert_eq!(cli.json, Some(true));
    assert_eq!(cli.path, PathBuf::from("dump.rdf"));
}

#[test]
fn test_source_from_arg() {
    assert!(matches!(Source::from_arg(&PathBuf::from("-")), Source::Stdin));
    assert!(matches!(
        Source::from_arg(&PathBuf::from("dump.rdf")),
        Source::Path(p) if p == PathBuf::from("dump.rdf")
    ));
}
