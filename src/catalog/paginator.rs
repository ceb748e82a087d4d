//! Listing pagination
//!
//! Sites paginate in one of two ways:
//! - FollowNext: every page links to the next one; each page asks for it.
//! - FanOutFromFirst: every page lists the page numbers; the first page
//!   issues all later pages at once and later pages never paginate.
//!
//! Both policies record every page they issue in a `PageTracker`, so a page
//! is never requested twice for the same category path.

use crate::catalog::dedup::SeenSet;
use crate::catalog::model::{CategoryPath, CrawlContext};
use crate::url::{normalize_url, resolve_link};
use url::Url;

/// What a listing page says about its siblings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingResult {
    /// Raw href of the "next page" control
    pub next_href: Option<String>,

    /// Page numbers shown in the pagination bar
    pub page_numbers: Vec<u32>,
}

impl ListingResult {
    /// Highest page number the pagination bar shows
    pub fn total_pages(&self) -> Option<u32> {
        self.page_numbers.iter().copied().max()
    }
}

/// Returns the next-page locator of a listing, if it has a usable one
pub fn next_page(listing: &ListingResult) -> Option<&str> {
    listing
        .next_href
        .as_deref()
        .map(str::trim)
        .filter(|href| crate::url::is_followable(href))
}

/// How a site chains its listing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationPolicy {
    FollowNext,
    FanOutFromFirst,
}

/// Pages already issued during this run, per category path
#[derive(Debug, Default)]
pub struct PageTracker {
    seen: SeenSet<(CategoryPath, String)>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self {
            seen: SeenSet::new(),
        }
    }

    /// Claims a page, returning false if it was already claimed
    pub fn claim(&self, path: &CategoryPath, url: &Url) -> bool {
        let key = normalize_url(url.as_str())
            .map(|normalized| normalized.to_string())
            .unwrap_or_else(|_| url.to_string());
        self.seen.insert((path.clone(), key))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Applies a site's pagination policy to listing pages
#[derive(Debug)]
pub struct Paginator {
    policy: PaginationPolicy,
    pages: PageTracker,
}

impl Paginator {
    pub fn new(policy: PaginationPolicy) -> Self {
        Self {
            policy,
            pages: PageTracker::new(),
        }
    }

    pub fn policy(&self) -> PaginationPolicy {
        self.policy
    }

    /// Number of distinct listing pages seen or issued so far
    pub fn pages_tracked(&self) -> usize {
        self.pages.len()
    }

    /// Computes the listing pages to request after `page_url`
    ///
    /// `page_for` builds the URL of page `n` for the FanOutFromFirst policy.
    /// Every returned context is flagged as a pagination continuation.
    pub fn continuations<F>(
        &self,
        listing: &ListingResult,
        page_url: &Url,
        context: &CrawlContext,
        page_for: F,
    ) -> Vec<(Url, CrawlContext)>
    where
        F: Fn(u32) -> Option<Url>,
    {
        let path = &context.category_path;

        // The current page counts as fetched, so links back to it are refused
        self.pages.claim(path, page_url);

        match self.policy {
            PaginationPolicy::FollowNext => {
                let Some(href) = next_page(listing) else {
                    tracing::debug!("Last page of '{}' reached at {}", path, page_url);
                    return Vec::new();
                };

                match resolve_link(href, page_url) {
                    Some(next) if self.pages.claim(path, &next) => {
                        vec![(next, context.as_continuation())]
                    }
                    Some(next) => {
                        tracing::debug!("Next page {} of '{}' already requested", next, path);
                        Vec::new()
                    }
                    None => {
                        tracing::debug!("Unresolvable next link '{}' on {}", href, page_url);
                        Vec::new()
                    }
                }
            }

            PaginationPolicy::FanOutFromFirst => {
                if context.is_pagination_continuation {
                    return Vec::new();
                }

                let total = listing.total_pages().unwrap_or(1);
                (2..=total)
                    .filter_map(page_for)
                    .filter(|url| self.pages.claim(path, url))
                    .map(|url| (url, context.as_continuation()))
                    .collect()
            }
        }
    }
}
