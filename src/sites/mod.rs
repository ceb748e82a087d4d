//! Site crawlers
//!
//! Each supported shop implements `SiteCrawler`. A crawler knows its start
//! pages and how to read its own markup; everything it extracts goes through
//! the shared catalog core, so every site follows the same rules for
//! category paths, pagination, de-duplication and variant expansion.
//!
//! Supported sites:
//! - `markavip`: MarkaVIP, Saudi market, all colors on one detail page
//! - `lacoste-jp`: Lacoste Japan, one page per color
//! - `lacoste-tr`: Lacoste Turkey, one page per color, numbered pagination

mod lacoste_jp;
mod lacoste_tr;
mod markavip;

pub use lacoste_jp::LacosteJp;
pub use lacoste_tr::LacosteTr;
pub use markavip::MarkaVip;

use crate::catalog::{
    expand, expand_color, to_summary, walk_forest, BaseProduct, ColorOption, CrawlContext,
    DedupScope, DetailDocument, ListingResult, NavigationNode, PaginationPolicy, Paginator,
    ProductDeduplicator, Record,
};
use crate::config::SiteEntry;
use crate::crawler::{Document, FetchDirective, HandlerOutput, Step};
use crate::{CatalogError, ConfigError, ExtractError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// The shops this crate knows how to crawl
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum SiteKind {
    #[serde(rename = "markavip")]
    #[value(name = "markavip")]
    MarkaVip,

    #[serde(rename = "lacoste-jp")]
    #[value(name = "lacoste-jp")]
    LacosteJp,

    #[serde(rename = "lacoste-tr")]
    #[value(name = "lacoste-tr")]
    LacosteTr,
}

impl SiteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteKind::MarkaVip => "markavip",
            SiteKind::LacosteJp => "lacoste-jp",
            SiteKind::LacosteTr => "lacoste-tr",
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One storefront of a site: where it sells and in what terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pub country_code: String,
    pub language_code: String,
    pub currency: String,
}

impl Market {
    pub fn new(country_code: &str, language_code: &str, currency: &str) -> Self {
        Self {
            country_code: country_code.to_string(),
            language_code: language_code.to_string(),
            currency: currency.to_string(),
        }
    }

    /// Root context for crawls of this market
    pub fn context(&self, brand: &str) -> CrawlContext {
        CrawlContext::new(
            &self.country_code,
            &self.language_code,
            &self.currency,
            brand,
        )
    }
}

/// Settings every site crawler is built from
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_url: Url,
    pub markets: Vec<Market>,
    pub single_item_test: bool,
}

impl SiteSettings {
    /// Applies a config entry on top of a site's defaults
    ///
    /// # Arguments
    ///
    /// * `entry` - The `[[site]]` table for this site
    /// * `default_base_url` - The site's public address
    /// * `markets` - Every market the site supports
    ///
    /// # Returns
    ///
    /// * `Ok(SiteSettings)` - Base URL resolved and markets filtered
    /// * `Err(ConfigError)` - The base URL does not parse
    pub fn from_entry(
        entry: &SiteEntry,
        default_base_url: &str,
        markets: Vec<Market>,
    ) -> Result<Self, ConfigError> {
        let raw = entry.base_url.as_deref().unwrap_or(default_base_url);
        let base_url = Url::parse(raw)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", raw, e)))?;

        let markets: Vec<Market> = markets
            .into_iter()
            .filter(|market| entry.wants_country(&market.country_code))
            .collect();

        if markets.is_empty() {
            tracing::warn!(
                "Site '{}' has no market left after the country filter {:?}",
                entry.kind,
                entry.countries
            );
        }

        Ok(Self {
            base_url,
            markets,
            single_item_test: entry.single_item_test,
        })
    }

    /// Resolves a site-relative path against the base URL
    pub fn url(&self, path: &str) -> Result<Url, CatalogError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Run-scoped state one site shares across all of its pages
#[derive(Debug)]
pub struct SiteSession {
    pub dedup: ProductDeduplicator,
    pub paginator: Paginator,
}

impl SiteSession {
    pub fn new(scope: DedupScope, policy: PaginationPolicy) -> Self {
        Self {
            dedup: ProductDeduplicator::new(scope),
            paginator: Paginator::new(policy),
        }
    }
}

/// A site-specific crawler
///
/// Handlers are pure with respect to the network: they read one parsed page
/// and return what to emit and what to fetch next. Shared run state lives in
/// the `SiteSession` the dispatcher passes in.
pub trait SiteCrawler: Send + Sync {
    fn kind(&self) -> SiteKind;

    fn pagination_policy(&self) -> PaginationPolicy;

    /// Directives that start a crawl of this site
    fn start_directives(&self) -> Vec<FetchDirective>;

    /// Reads the category menu and issues one listing directive per category
    fn handle_navigation(
        &self,
        document: &Document,
        directive: &FetchDirective,
        session: &SiteSession,
    ) -> HandlerOutput;

    /// Emits summaries, detail directives and further listing pages
    fn handle_listing(
        &self,
        document: &Document,
        directive: &FetchDirective,
        session: &SiteSession,
    ) -> HandlerOutput;

    /// Expands a product page into records or per-color directives
    fn handle_detail(
        &self,
        document: &Document,
        directive: &FetchDirective,
        session: &SiteSession,
    ) -> HandlerOutput;

    /// Builds the record of one color from its own page
    fn handle_color_page(
        &self,
        document: &Document,
        _directive: &FetchDirective,
        _session: &SiteSession,
    ) -> HandlerOutput {
        tracing::warn!(
            "Site '{}' does not use color pages, ignoring {}",
            self.kind(),
            document.url()
        );
        HandlerOutput::new()
    }

    /// Routes a page to the handler for its step
    fn handle(
        &self,
        document: &Document,
        directive: &FetchDirective,
        session: &SiteSession,
    ) -> HandlerOutput {
        match directive.step {
            Step::Navigation => self.handle_navigation(document, directive, session),
            Step::Listing => self.handle_listing(document, directive, session),
            Step::Detail => self.handle_detail(document, directive, session),
            Step::ColorPage => self.handle_color_page(document, directive, session),
        }
    }
}

/// Builds the crawler for a config entry
pub fn build_site(entry: &SiteEntry) -> Result<Arc<dyn SiteCrawler>, ConfigError> {
    let site: Arc<dyn SiteCrawler> = match entry.kind {
        SiteKind::MarkaVip => Arc::new(MarkaVip::new(entry)?),
        SiteKind::LacosteJp => Arc::new(LacosteJp::new(entry)?),
        SiteKind::LacosteTr => Arc::new(LacosteTr::new(entry)?),
    };
    Ok(site)
}

/// One product row of a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub base_sku: String,
    pub url: Url,
}

/// Turns a navigation tree into listing directives
pub(crate) fn listing_directives(
    site: SiteKind,
    document: &Document,
    context: &CrawlContext,
    menu: &[NavigationNode],
) -> HandlerOutput {
    let mut output = HandlerOutput::new();

    for (path, target) in walk_forest(menu) {
        match document.resolve(target) {
            Some(url) => output.push_directive(FetchDirective::listing(
                site,
                url,
                context.for_listing(path),
            )),
            None => tracing::debug!(
                "Skipping menu entry '{}': {}",
                path,
                ExtractError::InvalidLink(target.to_string())
            ),
        }
    }

    tracing::debug!(
        "{} listing directives from {} on {}",
        output.directives.len(),
        site,
        document.url()
    );
    output
}

/// Emits what a listing page yields, identically for every site
///
/// Every row gets a summary. A detail directive is issued only for the
/// first sighting of a product under the site's dedup scope. Pagination
/// follows the session's policy; `page_for` builds numbered page URLs.
pub(crate) fn listing_output<F>(
    site: SiteKind,
    document: &Document,
    directive: &FetchDirective,
    session: &SiteSession,
    rows: Vec<ListingRow>,
    listing: &ListingResult,
    page_for: F,
) -> HandlerOutput
where
    F: Fn(u32) -> Option<Url>,
{
    let mut output = HandlerOutput::new();
    let context = &directive.context;
    let referer = Some(document.url().to_string());

    for row in rows {
        let product =
            BaseProduct::from_listing(context, row.base_sku, row.url.as_str(), referer.clone());
        output.push_record(Record::Summary(to_summary(&product)));

        if session
            .dedup
            .should_fetch_detail(&product.base_sku, &product.country_code)
        {
            output.push_directive(FetchDirective::detail(
                site,
                row.url,
                context.clone(),
                product,
            ));
        }
    }

    for (url, next_context) in
        session
            .paginator
            .continuations(listing, document.url(), context, page_for)
    {
        output.push_directive(FetchDirective::listing(site, url, next_context));
    }

    output
}

/// Records for a detail page that lists every color itself
pub(crate) fn detail_records(detail: &DetailDocument, product: &BaseProduct) -> HandlerOutput {
    let mut output = HandlerOutput::new();
    for record in expand(detail, product) {
        output.push_record(Record::Product(record));
    }
    output
}

/// The carried product of a detail or color directive
pub(crate) fn carried_product<'a>(
    directive: &'a FetchDirective,
    document: &Document,
) -> Option<&'a BaseProduct> {
    let product = directive.carried_product.as_ref();
    if product.is_none() {
        tracing::warn!(
            "{} directive for {} carries no product, skipping",
            directive.step,
            document.url()
        );
    }
    product
}

/// Issues one color page per swatch, all sharing the parsed detail page
pub(crate) fn color_page_directives(
    site: SiteKind,
    directive: &FetchDirective,
    product: &BaseProduct,
    detail: DetailDocument,
    pages: Vec<(String, Url)>,
) -> HandlerOutput {
    let mut output = HandlerOutput::new();
    if pages.is_empty() {
        tracing::debug!("No color swatches on {}", product.url);
        return output;
    }

    let detail = Arc::new(detail);
    for (color_code, url) in pages {
        output.push_directive(FetchDirective::color_page(
            site,
            url,
            directive.context.clone(),
            product.clone(),
            Arc::clone(&detail),
            color_code,
        ));
    }
    output
}

/// The record of one color, read from that color's own page
///
/// Product-level fields come from the carried detail page; the color, its
/// sizes and its images come from this page.
pub(crate) fn color_page_record(
    document: &Document,
    directive: &FetchDirective,
    color: ColorOption,
    image_urls: Vec<String>,
) -> HandlerOutput {
    let mut output = HandlerOutput::new();
    let Some(product) = carried_product(directive, document) else {
        return output;
    };
    let Some(detail) = directive.carried_detail.as_deref() else {
        tracing::warn!("Color page {} carries no detail page, skipping", document.url());
        return output;
    };

    let page_detail = DetailDocument {
        colors: vec![color.clone()],
        images: Vec::new(),
        generic_images: image_urls,
        ..detail.clone()
    };
    output.push_record(Record::Product(expand_color(
        &page_detail,
        product,
        &color,
    )));
    output
}

/// The color code a color page was issued for
pub(crate) fn carried_color<'a>(
    directive: &'a FetchDirective,
    document: &Document,
) -> Option<&'a str> {
    let code = directive.color_code.as_deref();
    if code.is_none() {
        tracing::warn!("Color page {} carries no color code, skipping", document.url());
    }
    code
}

/// A menu entry for a link whose URL path doubles as its category path
///
/// `/men/polos` becomes `men → polos`, with only the leaf linking.
pub(crate) fn path_chain(document: &Document, href: &str) -> Option<NavigationNode> {
    let url = document.resolve(href)?;
    let mut segments: Vec<String> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    let leaf_label = segments.pop()?;
    let mut node = NavigationNode::new(leaf_label, Some(href.to_string()));
    while let Some(label) = segments.pop() {
        node = NavigationNode::new(label, None).with_children(vec![node]);
    }
    Some(node)
}
