//! Directive dispatcher - the crawl loop
//!
//! The dispatcher owns everything a run shares:
//! - The queue of pending fetch directives
//! - A bounded set of in-flight fetches
//! - Each site's crawler and run-scoped session (dedup, page tracker)
//! - The record sink and run statistics
//!
//! A fetch task fetches its page, parses it and hands it to the site's
//! handler. The dispatcher then writes the records and queues the
//! directives the handler returned. The run ends when the queue is empty
//! and nothing is in flight.

use crate::catalog::{to_full, Record};
use crate::config::Config;
use crate::crawler::directive::{FetchDirective, HandlerOutput};
use crate::crawler::document::Document;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult, RetryPolicy};
use crate::output::{CrawlStats, RecordSink};
use crate::sites::{build_site, SiteCrawler, SiteKind, SiteSession};
use crate::{CatalogError, Result};
use reqwest::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use url::Url;

/// Completed fetches between progress log lines
const PROGRESS_INTERVAL: u64 = 25;

/// One enabled site and its shared run state
struct SiteRuntime {
    crawler: Arc<dyn SiteCrawler>,
    session: Arc<SiteSession>,
}

/// What a fetch task hands back
enum Completed {
    Page {
        site: SiteKind,
        url: Url,
        output: HandlerOutput,
    },
    Failed {
        url: Url,
        reason: String,
    },
}

/// Runs fetch directives to completion for a set of sites
pub struct Dispatcher {
    sites: HashMap<SiteKind, SiteRuntime>,
    client: Client,
    retry: RetryPolicy,
    max_in_flight: usize,
    sink: Arc<dyn RecordSink>,
    queue: VecDeque<FetchDirective>,
    stats: CrawlStats,
}

impl Dispatcher {
    /// Creates a dispatcher seeded with every enabled site's start directives
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `sink` - Where records are written
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatcher)` - Ready to run
    /// * `Err(CatalogError)` - No enabled site, a bad site entry, or the
    ///   HTTP client could not be built
    pub fn new(config: &Config, sink: Arc<dyn RecordSink>) -> Result<Self> {
        let mut sites = HashMap::new();
        let mut queue = VecDeque::new();
        let mut stats = CrawlStats::new();

        for entry in config.enabled_sites() {
            let crawler = build_site(entry)?;
            let session = SiteSession::new(entry.dedup_scope, crawler.pagination_policy());

            let start = crawler.start_directives();
            tracing::info!(
                "Site '{}': {} start directive(s), dedup scope {:?}, pagination {:?}",
                entry.kind,
                start.len(),
                session.dedup.scope(),
                session.paginator.policy()
            );
            for directive in start {
                stats.record_directive(directive.step);
                queue.push_back(directive);
            }

            stats.site_mut(entry.kind);
            sites.insert(
                entry.kind,
                SiteRuntime {
                    crawler,
                    session: Arc::new(session),
                },
            );
        }

        if sites.is_empty() {
            return Err(CatalogError::NoSites);
        }

        let client = build_http_client(&config.user_agent, &config.crawler)?;

        Ok(Self {
            sites,
            client,
            retry: RetryPolicy::from(&config.crawler),
            max_in_flight: config.crawler.max_concurrent_requests.max(1) as usize,
            sink,
            queue,
            stats,
        })
    }

    /// Number of directives waiting to be fetched
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Runs until no directive is queued or in flight
    ///
    /// Fetch failures are logged and counted; only a failing sink ends the
    /// run early.
    pub async fn run(mut self) -> Result<CrawlStats> {
        tracing::info!(
            "Starting crawl of {} site(s) with {} queued directive(s), up to {} in flight",
            self.sites.len(),
            self.queue.len(),
            self.max_in_flight
        );

        let start_time = Instant::now();
        let mut in_flight = JoinSet::new();
        let mut completed: u64 = 0;

        loop {
            while in_flight.len() < self.max_in_flight {
                let Some(directive) = self.queue.pop_front() else {
                    break;
                };
                let Some(runtime) = self.sites.get(&directive.site) else {
                    tracing::warn!(
                        "No crawler for site '{}', dropping {}",
                        directive.site,
                        directive.target
                    );
                    continue;
                };

                tracing::debug!("Fetching {} ({})", directive.target, directive.step);
                in_flight.spawn(process_directive(
                    self.client.clone(),
                    self.retry,
                    Arc::clone(&runtime.crawler),
                    Arc::clone(&runtime.session),
                    directive,
                ));
            }

            let Some(joined) = in_flight.join_next().await else {
                tracing::info!("Directive queue is empty, crawl complete");
                break;
            };

            match joined {
                Ok(Completed::Page { site, url, output }) => {
                    self.stats.pages_fetched += 1;
                    self.absorb(site, &url, output)?;
                }
                Ok(Completed::Failed { url, reason }) => {
                    self.stats.fetch_failures += 1;
                    tracing::warn!("Fetch failed for {}: {}", url, reason);
                }
                Err(e) => {
                    self.stats.fetch_failures += 1;
                    tracing::error!("Fetch task did not complete: {}", e);
                }
            }

            completed += 1;
            if completed % PROGRESS_INTERVAL == 0 {
                let rate = completed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} fetches completed, {} queued, {} in flight, {:.2} pages/sec",
                    completed,
                    self.queue.len(),
                    in_flight.len(),
                    rate
                );
            }
        }

        for (kind, runtime) in &self.sites {
            let site = self.stats.site_mut(*kind);
            site.distinct_products = runtime.session.dedup.distinct_products() as u64;
            site.detail_fetches_skipped = runtime.session.dedup.skipped();
            site.listing_pages = runtime.session.paginator.pages_tracked() as u64;
        }

        self.sink.finish()?;
        self.stats.finish();

        tracing::info!(
            "Crawl completed: {} pages fetched, {} failures, {} records in {:?}",
            self.stats.pages_fetched,
            self.stats.fetch_failures,
            self.stats.total_summaries() + self.stats.total_products(),
            start_time.elapsed()
        );

        Ok(self.stats)
    }

    /// Writes a handler's records and queues its directives
    fn absorb(&mut self, site: SiteKind, url: &Url, output: HandlerOutput) -> Result<()> {
        tracing::debug!(
            "{} produced {} record(s) and {} directive(s)",
            url,
            output.records.len(),
            output.directives.len()
        );

        for record in output.records {
            match record {
                Record::Summary(summary) => {
                    self.sink.write_record(&Record::Summary(summary))?;
                    self.stats.site_mut(site).summaries += 1;
                }
                Record::Product(product) => match to_full(product) {
                    Ok(full) => {
                        self.sink.write_record(&Record::Product(full))?;
                        self.stats.site_mut(site).products += 1;
                    }
                    Err(e) => {
                        tracing::warn!("Dropping record: {}", e);
                        self.stats.dropped_records += 1;
                    }
                },
            }
        }

        for directive in output.directives {
            self.stats.record_directive(directive.step);
            self.queue.push_back(directive);
        }

        Ok(())
    }
}

/// Fetches one directive's page and runs its handler
async fn process_directive(
    client: Client,
    retry: RetryPolicy,
    crawler: Arc<dyn SiteCrawler>,
    session: Arc<SiteSession>,
    directive: FetchDirective,
) -> Completed {
    match fetch_page(&client, &directive.target, retry).await {
        FetchResult::Success {
            final_url, body, ..
        } => {
            let output = handle_page(crawler.as_ref(), &session, &directive, &body, final_url.clone());
            Completed::Page {
                site: directive.site,
                url: final_url,
                output,
            }
        }
        FetchResult::HttpError { status_code } => Completed::Failed {
            url: directive.target,
            reason: format!("HTTP {}", status_code),
        },
        FetchResult::NetworkError { error, .. } => Completed::Failed {
            url: directive.target,
            reason: error,
        },
    }
}

/// Parses a body and routes it to the handler for the directive's step
///
/// Kept synchronous: the parsed tree must not live across an await.
fn handle_page(
    crawler: &dyn SiteCrawler,
    session: &SiteSession,
    directive: &FetchDirective,
    body: &str,
    final_url: Url,
) -> HandlerOutput {
    let document = Document::parse(body, final_url);
    crawler.handle(&document, directive, session)
}
