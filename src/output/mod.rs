//! Output module for crawl records and run reports
//!
//! This module handles:
//! - Writing records through the `RecordSink` trait (JSON Lines or memory)
//! - Counting what a run did
//! - Printing statistics and generating markdown summaries

mod jsonl;
mod markdown;
mod memory;
pub mod stats;
mod traits;

pub use jsonl::JsonLinesSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use memory::MemorySink;
pub use stats::{print_statistics, CrawlStats, SiteStats};
pub use traits::{OutputError, OutputResult, RecordSink};
