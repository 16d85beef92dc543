//! Engine module: extraction, reporting and the CLI around the pipeline

pub mod arg_parser;
pub mod cli;
pub mod extractor;
pub mod parallel;
pub mod progress;
pub mod report;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::{build_opts, handle_run};
pub use extractor::{Extractor, TOPIC_PATTERN, TagPattern, breadcrumb_depth};
pub use report::{average_depth, build_report, histogram, render_json, render_text};
