//! Crawler module for fetching and processing catalog pages
//!
//! This module contains the site-independent crawl machinery:
//! - Fetch directives and handler output
//! - HTTP fetching with retry logic
//! - Parsed documents with field extraction helpers
//! - The dispatcher that runs directives to completion

mod directive;
mod dispatcher;
pub mod document;
mod fetcher;

pub use directive::{FetchDirective, HandlerOutput, Step};
pub use dispatcher::Dispatcher;
pub use document::Document;
pub use fetcher::{build_http_client, fetch_page, FetchResult, RetryPolicy};

use crate::config::Config;
use crate::output::{CrawlStats, JsonLinesSink};
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the JSON Lines record file
/// 2. Build each enabled site's crawler and seed its start directives
/// 3. Fetch pages and run the site handlers until nothing is left
/// 4. Return the run statistics
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Crawl completed
/// * `Err(CatalogError)` - Crawl could not start or its output failed
pub async fn crawl(config: Config) -> Result<CrawlStats> {
    let sink = JsonLinesSink::create(Path::new(&config.output.records_path))?;
    tracing::info!("Writing records to {}", sink.path().display());

    let dispatcher = Dispatcher::new(&config, Arc::new(sink))?;
    dispatcher.run().await
}
