//! Fetch directives and handler output
//!
//! A directive names one page to fetch, which site handles it, at which step
//! of the crawl, and the context inherited from the page that issued it.

use crate::catalog::{BaseProduct, CrawlContext, DetailDocument, Record};
use crate::sites::SiteKind;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// The handler a fetched page is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Navigation,
    Listing,
    Detail,
    ColorPage,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Navigation, Step::Listing, Step::Detail, Step::ColorPage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Navigation => "navigation",
            Step::Listing => "listing",
            Step::Detail => "detail",
            Step::ColorPage => "color-page",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page to fetch plus everything its handler needs
#[derive(Debug, Clone)]
pub struct FetchDirective {
    pub site: SiteKind,
    pub step: Step,
    pub target: Url,
    pub context: CrawlContext,

    /// Listing product a detail or color page belongs to
    pub carried_product: Option<BaseProduct>,

    /// Parsed detail page shared by all color pages of one product
    pub carried_detail: Option<Arc<DetailDocument>>,

    /// Color a color page was issued for
    pub color_code: Option<String>,
}

impl FetchDirective {
    /// A start or navigation page
    pub fn navigation(site: SiteKind, target: Url, context: CrawlContext) -> Self {
        Self {
            site,
            step: Step::Navigation,
            target,
            context,
            carried_product: None,
            carried_detail: None,
            color_code: None,
        }
    }

    /// A listing page for the category in `context`
    pub fn listing(site: SiteKind, target: Url, context: CrawlContext) -> Self {
        Self {
            site,
            step: Step::Listing,
            target,
            context,
            carried_product: None,
            carried_detail: None,
            color_code: None,
        }
    }

    /// The detail page of `product`
    pub fn detail(site: SiteKind, target: Url, context: CrawlContext, product: BaseProduct) -> Self {
        Self {
            site,
            step: Step::Detail,
            target,
            context,
            carried_product: Some(product),
            carried_detail: None,
            color_code: None,
        }
    }

    /// One color page of a product whose detail page was already parsed
    pub fn color_page(
        site: SiteKind,
        target: Url,
        context: CrawlContext,
        product: BaseProduct,
        detail: Arc<DetailDocument>,
        color_code: impl Into<String>,
    ) -> Self {
        Self {
            site,
            step: Step::ColorPage,
            target,
            context,
            carried_product: Some(product),
            carried_detail: Some(detail),
            color_code: Some(color_code.into()),
        }
    }
}

/// What a handler produced from one page
#[derive(Debug, Default)]
pub struct HandlerOutput {
    pub directives: Vec<FetchDirective>,
    pub records: Vec<Record>,
}

impl HandlerOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_directive(&mut self, directive: FetchDirective) {
        self.directives.push(directive);
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty() && self.records.is_empty()
    }

    /// Directives of one step, in emission order
    pub fn directives_for(&self, step: Step) -> impl Iterator<Item = &FetchDirective> {
        self.directives.iter().filter(move |d| d.step == step)
    }
}
