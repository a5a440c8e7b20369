//! Output module for persisting crawl results
//!
//! This module handles:
//! - The append-only sink interface each stage writes through
//! - The JSON-lines file implementation of that sink
//! - Per-run crawl statistics

mod json_lines;
pub mod stats;
mod traits;

pub use json_lines::JsonLinesSink;
pub use stats::{print_statistics, CrawlStatistics};
pub use traits::{OutputError, OutputResult, ResultSink, Store};
