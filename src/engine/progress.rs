//! Progress counter for the reader (verbose mode only).

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::utils::config::ProgressConsts;

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (shows count without percentage)
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = ProgressConsts::COUNTER_UNIT
    )))
}

/// Force a refresh of the bar (e.g. so counter shows "0 lines" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Update progress bar if available
/// Uses try_lock so the reader never blocks on the bar; a skipped update is caught up by the final refresh.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Create a progress callback function that updates the progress bar.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<Box<dyn Fn(usize) + Send>> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as Box<dyn Fn(usize) + Send>
    })
}

/// Build the reader counter and its batch callback when `verbose`.
pub fn setup_progress(verbose: bool) -> (Option<ProgressBar>, Option<Box<dyn Fn(usize) + Send>>) {
    let bar = verbose.then(|| {
        let b = create_counter(ProgressConsts::COUNTER_DESC);
        refresh_bar(&b);
        b
    });
    let on_batch = progress_callback(&bar);
    (bar, on_batch)
}

/// Final refresh and newline so log lines don't overwrite the counter.
pub fn finish_progress(bar: &Option<ProgressBar>) {
    if let Some(bar) = bar
        && let Ok(mut b) = bar.lock()
    {
        let _ = b.refresh();
        eprintln!();
    }
}
