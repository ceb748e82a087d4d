//! Lacoste Turkey crawler
//!
//! Listings show numbered pagination, so the first page of a category issues
//! every later page itself. Like the Japanese store, each color has its own
//! page, selected with the `integration_renk` query parameter.

use crate::catalog::{
    ColorOption, DetailDocument, ListingResult, NavigationNode, PaginationPolicy, PriceFields,
    SizeOption,
};
use crate::config::SiteEntry;
use crate::crawler::document::{attr_in, element_attr, element_text, select_in, text_in};
use crate::crawler::{Document, FetchDirective, HandlerOutput};
use crate::sites::{
    carried_color, carried_product, color_page_directives, color_page_record, listing_directives,
    listing_output, ListingRow, Market, SiteCrawler, SiteKind, SiteSession, SiteSettings,
};
use crate::ConfigError;
use url::Url;

const BRAND: &str = "lacoste";
const DEFAULT_BASE_URL: &str = "https://www.lacoste.com.tr/";
const COLOR_PARAM: &str = "integration_renk";

const MENU_ITEM: &str = ".js-navigation.navigation-list > li";
const MENU_LABEL: &str = "a span";
const MENU_LINK: &str = "a";
const MENU_SECTION: &str = ".page-sidebar__lists div div ul";
const MENU_SECTION_LINK: &str = ".hero a";
const MENU_LEAF_LINK: &str = "li:not(.hero) > a";

const LISTING_ROW: &str = ".product-item-box";
const ROW_LINK: &str = ".product-item-image-link";
const ROW_SKU: &str = ".product-item-wrapper";
const PAGE_NUMBER: &str = ".pagination a";

const TITLE: &str = ".name.hidden-xs h1";
const PRICE: &str = ".current-price";
const DESCRIPTION: &str = ".content ul li";
const COLOR_ITEM: &str = ".variant-colors__item";

const COLOR_NAME: &str = ".js-variant-color-type";
const COLOR_IMAGE: &str = ".product-detail__thumbnails img";
const SIZE: &str = ".variant-sizes__item";

pub struct LacosteTr {
    settings: SiteSettings,
}

impl LacosteTr {
    pub fn new(entry: &SiteEntry) -> Result<Self, ConfigError> {
        if entry.single_item_test {
            tracing::info!("Site '{}' has no single-item test, crawling normally", entry.kind);
        }

        let settings =
            SiteSettings::from_entry(entry, DEFAULT_BASE_URL, vec![Market::new("tr", "tr", "TRY")])?;
        Ok(Self { settings })
    }
}

impl SiteCrawler for LacosteTr {
    fn kind(&self) -> SiteKind {
        SiteKind::LacosteTr
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::FanOutFromFirst
    }

    fn start_directives(&self) -> Vec<FetchDirective> {
        self.settings
            .markets
            .iter()
            .map(|market| {
                FetchDirective::navigation(
                    SiteKind::LacosteTr,
                    self.settings.base_url.clone(),
                    market.context(BRAND),
                )
            })
            .collect()
    }

    fn handle_navigation(
        &self,
        document: &Document,
        directive: &FetchDirective,
        _session: &SiteSession,
    ) -> HandlerOutput {
        let menu = read_menu(document);
        listing_directives(SiteKind::LacosteTr, document, &directive.context, &menu)
    }

    fn handle_listing(
        &self,
        document: &Document,
        directive: &FetchDirective,
        session: &SiteSession,
    ) -> HandlerOutput {
        let listing = ListingResult {
            next_href: None,
            page_numbers: document
                .texts(PAGE_NUMBER)
                .iter()
                .filter_map(|text| text.parse::<u32>().ok())
                .collect(),
        };

        listing_output(
            SiteKind::LacosteTr,
            document,
            directive,
            session,
            read_listing_rows(document),
            &listing,
            |page| page_url(document.url(), page),
        )
    }

    fn handle_detail(
        &self,
        document: &Document,
        directive: &FetchDirective,
        _session: &SiteSession,
    ) -> HandlerOutput {
        let Some(product) = carried_product(directive, document) else {
            return HandlerOutput::new();
        };

        let canonical = document.canonical_url();
        let detail = read_detail(document);
        let pages = detail
            .colors
            .iter()
            .map(|color| {
                (
                    color.color_code.clone(),
                    color_url(&canonical, &color.color_code),
                )
            })
            .collect();

        color_page_directives(SiteKind::LacosteTr, directive, product, detail, pages)
    }

    fn handle_color_page(
        &self,
        document: &Document,
        directive: &FetchDirective,
        _session: &SiteSession,
    ) -> HandlerOutput {
        let Some(color_code) = carried_color(directive, document) else {
            return HandlerOutput::new();
        };

        let sizes = document
            .select(SIZE)
            .into_iter()
            .filter_map(|size| {
                let name = element_text(size)?;
                let sold_out = size.value().classes().any(|class| class == "disabled");
                Some(SizeOption::new(name, if sold_out { 0 } else { 1 }))
            })
            .collect();

        let color = ColorOption {
            color_name: document.first_text(COLOR_NAME),
            sizes,
            ..ColorOption::new(color_code)
        };
        let images = document
            .urls(COLOR_IMAGE, "src")
            .into_iter()
            .map(String::from)
            .collect();

        color_page_record(document, directive, color, images)
    }
}

/// Department links, each with sidebar sections of a heading and its links
fn read_menu(document: &Document) -> Vec<NavigationNode> {
    document
        .select(MENU_ITEM)
        .into_iter()
        .filter_map(|item| {
            let label = text_in(item, MENU_LABEL).or_else(|| text_in(item, MENU_LINK))?;

            let sections = select_in(item, MENU_SECTION)
                .into_iter()
                .map(|section| {
                    let leaves = select_in(section, MENU_LEAF_LINK)
                        .into_iter()
                        .filter_map(|link| {
                            Some(NavigationNode::new(
                                element_text(link)?,
                                element_attr(link, "href"),
                            ))
                        })
                        .collect();

                    NavigationNode::new(
                        text_in(section, MENU_SECTION_LINK).unwrap_or_default(),
                        attr_in(section, MENU_SECTION_LINK, "href"),
                    )
                    .with_children(leaves)
                })
                .collect();

            // The department anchor comes first; later anchors belong to its sections
            let href = select_in(item, MENU_LINK)
                .first()
                .and_then(|link| element_attr(*link, "href"));

            Some(NavigationNode::new(label, href).with_children(sections))
        })
        .collect()
}

fn read_listing_rows(document: &Document) -> Vec<ListingRow> {
    document
        .select(LISTING_ROW)
        .into_iter()
        .filter_map(|row| {
            let base_sku = attr_in(row, ROW_SKU, "data-sku");
            let url = attr_in(row, ROW_LINK, "href").and_then(|href| document.resolve(&href));

            match (base_sku, url) {
                (Some(base_sku), Some(url)) => Some(ListingRow { base_sku, url }),
                _ => {
                    tracing::debug!("Listing row without SKU or link on {}", document.url());
                    None
                }
            }
        })
        .collect()
}

fn read_detail(document: &Document) -> DetailDocument {
    DetailDocument {
        title: document.first_text(TITLE),
        description_text: document.texts(DESCRIPTION),
        prices: PriceFields {
            full_price_text: document.first_text(PRICE),
            ..PriceFields::default()
        },
        colors: document
            .attrs(COLOR_ITEM, "data-value")
            .into_iter()
            .map(ColorOption::new)
            .collect(),
        ..DetailDocument::default()
    }
}

/// Page `page` of the listing at `listing_url`
fn page_url(listing_url: &Url, page: u32) -> Option<Url> {
    let mut url = listing_url.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("page", &page.to_string());
    Some(url)
}

fn color_url(canonical: &Url, color_code: &str) -> Url {
    let mut url = canonical.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair(COLOR_PARAM, color_code);
    url
}
