//! Run statistics
//!
//! The dispatcher keeps a `CrawlStats` while it runs; the binary prints it
//! and the markdown summary is rendered from it.

use crate::crawler::Step;
use crate::sites::SiteKind;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Per-site counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteStats {
    /// Summary records written
    pub summaries: u64,

    /// Product (per-color) records written
    pub products: u64,

    /// Distinct products whose detail page was requested
    pub distinct_products: u64,

    /// Listing sightings that did not trigger a detail fetch
    pub detail_fetches_skipped: u64,

    /// Distinct listing pages requested, first pages included
    pub listing_pages: u64,
}

/// Counters for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Directives issued, by step
    pub directives: BTreeMap<Step, u64>,

    /// Fetches that returned a page
    pub pages_fetched: u64,

    /// Fetches that ended in an HTTP or network error
    pub fetch_failures: u64,

    /// Product records dropped for missing required fields
    pub dropped_records: u64,

    pub sites: BTreeMap<SiteKind, SiteStats>,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlStats {
    /// Starts the clock
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            directives: BTreeMap::new(),
            pages_fetched: 0,
            fetch_failures: 0,
            dropped_records: 0,
            sites: BTreeMap::new(),
        }
    }

    pub fn record_directive(&mut self, step: Step) {
        *self.directives.entry(step).or_insert(0) += 1;
    }

    pub fn directives_for(&self, step: Step) -> u64 {
        self.directives.get(&step).copied().unwrap_or(0)
    }

    pub fn site_mut(&mut self, site: SiteKind) -> &mut SiteStats {
        self.sites.entry(site).or_default()
    }

    /// Fetches completed either way
    pub fn fetches(&self) -> u64 {
        self.pages_fetched + self.fetch_failures
    }

    pub fn total_summaries(&self) -> u64 {
        self.sites.values().map(|site| site.summaries).sum()
    }

    pub fn total_products(&self) -> u64 {
        self.sites.values().map(|site| site.products).sum()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Percentage of fetches that returned a page
    pub fn success_rate(&self) -> f64 {
        if self.fetches() == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / self.fetches() as f64) * 100.0
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Fetch failures: {}", stats.fetch_failures);
    println!("  Summary records: {}", stats.total_summaries());
    println!("  Product records: {}", stats.total_products());
    println!("  Dropped records: {}", stats.dropped_records);
    if let Some(duration) = stats.duration_seconds() {
        println!("  Duration: {}s", duration);
    }
    println!();

    println!("Directives by Step:");
    for step in Step::ALL {
        println!("  {}: {}", step, stats.directives_for(step));
    }
    println!();

    println!("Sites:");
    for (site, counts) in &stats.sites {
        println!(
            "  {}: {} listing pages, {} summaries, {} products, {} distinct products, {} detail fetches skipped",
            site,
            counts.listing_pages,
            counts.summaries,
            counts.products,
            counts.distinct_products,
            counts.detail_fetches_skipped
        );
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} fetches returned a page)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.fetches()
    );
}
