//! Lacoste Japan crawler
//!
//! The storefront is a styled-components app, so selectors key on the
//! generated component class names. The detail page lists color swatches
//! only; sizes and images live on one page per color.

use crate::catalog::{
    ColorOption, DetailDocument, ListingResult, NavigationNode, PaginationPolicy, PriceFields,
    SizeOption,
};
use crate::config::SiteEntry;
use crate::crawler::document::{attr_in, element_attr, element_text, select_in, text_in};
use crate::crawler::{Document, FetchDirective, HandlerOutput};
use crate::sites::{
    carried_color, carried_product, color_page_directives, color_page_record, listing_directives,
    listing_output, path_chain, ListingRow, Market, SiteCrawler, SiteKind, SiteSession,
    SiteSettings,
};
use crate::ConfigError;
use url::Url;

const BRAND: &str = "lacoste";
const DEFAULT_BASE_URL: &str = "https://www.lacoste.jp";

const MENU_ITEM: &str = "nav > .htmlElements__Ul-sc-1e1gdav-4 > li";
const MENU_LABEL: &str = ".text__TextBase-wvjikk-0";
const MENU_SECTION: &str = ".htmlElements__Ul-sc-1e1gdav-4:not(.fvRPJd) > li";
const MENU_SECTION_LINK: &str = ".MenuLinkList__H3-ki4j0-0 a";
const MENU_LEAF_LINK: &str = ".htmlElements__Ul-sc-1e1gdav-4.fvRPJd > li a";
const SIDEBAR_LINK: &str = ".text__MenuLinkCondensed-wvjikk-16.SidebarItem__MenuLink-dys11-6";

const PRODUCT_LINK: &str = "a.htmlElements__ABlock-sc-1e1gdav-3:not(.Pagination__Item-q8pzb8-2)";
const NEXT_PAGE: &str = r#"a.Pagination__Item-q8pzb8-2[rel="next"]"#;

const TITLE: &str = ".text__H1-wvjikk-2";
const OLD_PRICE: &str = ".Price__PriceWrapper-sc-1tbjaoc-3 span:nth-child(1)";
const NEW_PRICE: &str = ".Price__PriceWrapper-sc-1tbjaoc-3 span:nth-child(2)";
const DESCRIPTION: &str = ".text__P-wvjikk-8";
const COLOR_SWATCH: &str = ".ColorSwatch__List-sc-1k99ke9-0 span";

const COLOR_NAME: &str = ".Content__ColorAndPrice-sc-1t9s0qv-1 p span";
const COLOR_IMAGE: &str = ".htmlElements__Ul-sc-1e1gdav-4 img";
const SIZE: &str = ".Desktop__Item-sc-4ldu9m-4";

pub struct LacosteJp {
    settings: SiteSettings,
}

impl LacosteJp {
    pub fn new(entry: &SiteEntry) -> Result<Self, ConfigError> {
        if entry.single_item_test {
            tracing::info!("Site '{}' has no single-item test, crawling normally", entry.kind);
        }

        let settings =
            SiteSettings::from_entry(entry, DEFAULT_BASE_URL, vec![Market::new("jp", "ja", "JPY")])?;
        Ok(Self { settings })
    }
}

impl SiteCrawler for LacosteJp {
    fn kind(&self) -> SiteKind {
        SiteKind::LacosteJp
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::FollowNext
    }

    fn start_directives(&self) -> Vec<FetchDirective> {
        self.settings
            .markets
            .iter()
            .map(|market| {
                FetchDirective::navigation(
                    SiteKind::LacosteJp,
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
        let mut menu = read_menu(document);
        menu.extend(
            document
                .attrs(SIDEBAR_LINK, "href")
                .iter()
                .filter_map(|href| path_chain(document, href)),
        );

        listing_directives(SiteKind::LacosteJp, document, &directive.context, &menu)
    }

    fn handle_listing(
        &self,
        document: &Document,
        directive: &FetchDirective,
        session: &SiteSession,
    ) -> HandlerOutput {
        let listing = ListingResult {
            next_href: document.first_attr(NEXT_PAGE, "href"),
            page_numbers: Vec::new(),
        };

        listing_output(
            SiteKind::LacosteJp,
            document,
            directive,
            session,
            read_listing_rows(document),
            &listing,
            |_| None,
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
            .filter_map(|color| {
                color_url(&canonical, &color.color_code).map(|url| (color.color_code.clone(), url))
            })
            .collect();

        color_page_directives(SiteKind::LacosteJp, directive, product, detail, pages)
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

        // No stock figures on this storefront; a listed size is orderable
        let color = ColorOption {
            color_name: document.first_text(COLOR_NAME),
            sizes: document
                .texts(SIZE)
                .into_iter()
                .map(|name| SizeOption::new(name, 1))
                .collect(),
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

/// Three menu levels: department, section heading, section links
fn read_menu(document: &Document) -> Vec<NavigationNode> {
    document
        .select(MENU_ITEM)
        .into_iter()
        .filter_map(|item| {
            let label = text_in(item, MENU_LABEL)?;

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

            Some(NavigationNode::new(label, None).with_children(sections))
        })
        .collect()
}

/// Product links carry the base SKU as their second path segment
fn read_listing_rows(document: &Document) -> Vec<ListingRow> {
    document
        .urls(PRODUCT_LINK, "href")
        .into_iter()
        .filter_map(|url| {
            let base_sku = url
                .path_segments()
                .and_then(|mut segments| segments.nth(1))
                .map(str::trim)
                .filter(|sku| !sku.is_empty())
                .map(str::to_string);

            match base_sku {
                Some(base_sku) => Some(ListingRow { base_sku, url }),
                None => {
                    tracing::debug!("Product link {} has no SKU segment", url);
                    None
                }
            }
        })
        .collect()
}

fn read_detail(document: &Document) -> DetailDocument {
    let colors = document
        .texts(COLOR_SWATCH)
        .iter()
        .filter_map(|swatch| swatch_code(swatch))
        .map(ColorOption::new)
        .collect();

    DetailDocument {
        title: document.first_text(TITLE),
        description_text: document.texts(DESCRIPTION),
        prices: PriceFields {
            full_price_text: None,
            old_price_text: document.first_text(OLD_PRICE),
            new_price_text: document.first_text(NEW_PRICE),
        },
        colors,
        ..DetailDocument::default()
    }
}

/// Swatch labels read `カラー - 001`; the code follows the dash
fn swatch_code(label: &str) -> Option<String> {
    let code = match label.split_once('-') {
        Some((_, code)) => code,
        None => label,
    }
    .trim();

    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

fn color_url(canonical: &Url, color_code: &str) -> Option<Url> {
    let raw = format!("{}/{}", canonical.as_str().trim_end_matches('/'), color_code);
    match Url::parse(&raw) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Cannot build color page URL '{}': {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BaseProduct, CategoryPath, CrawlContext, DedupScope, Record};
    use crate::crawler::Step;

    fn site() -> LacosteJp {
        LacosteJp::new(&SiteEntry::new(SiteKind::LacosteJp)).unwrap()
    }

    fn session() -> SiteSession {
        SiteSession::new(DedupScope::Sku, PaginationPolicy::FollowNext)
    }

    fn context() -> CrawlContext {
        CrawlContext::new("jp", "ja", "JPY", BRAND)
    }

    fn doc(html: &str, url: &str) -> Document {
        Document::parse(html, Url::parse(url).unwrap())
    }

    const HOMEPAGE: &str = r#"
        <nav><ul class="htmlElements__Ul-sc-1e1gdav-4">
          <li>
            <span class="text__TextBase-wvjikk-0">メンズ</span>
            <ul class="htmlElements__Ul-sc-1e1gdav-4">
              <li>
                <h3 class="MenuLinkList__H3-ki4j0-0"><a href="/men/clothing">ウェア</a></h3>
                <ul class="htmlElements__Ul-sc-1e1gdav-4 fvRPJd">
                  <li><a href="/men/clothing/polos">ポロシャツ</a></li>
                </ul>
              </li>
            </ul>
          </li>
        </ul></nav>
        <a class="text__MenuLinkCondensed-wvjikk-16 SidebarItem__MenuLink-dys11-6" href="/women/bags">Bags</a>"#;

    const LISTING: &str = r#"
        <a class="htmlElements__ABlock-sc-1e1gdav-3" href="/products/L1212/polo">Polo</a>
        <a class="htmlElements__ABlock-sc-1e1gdav-3" href="/products/PH4012/polo">Polo</a>
        <a class="htmlElements__ABlock-sc-1e1gdav-3 Pagination__Item-q8pzb8-2" rel="next" href="/men/clothing?page=2">2</a>"#;

    const DETAIL: &str = r#"
        <head><link rel="canonical" href="https://www.lacoste.jp/products/L1212/polo"></head>
        <h1 class="text__H1-wvjikk-2">クラシックポロ</h1>
        <div class="Price__PriceWrapper-sc-1tbjaoc-3"><span>16,500円</span><span>13,200円</span></div>
        <p class="text__P-wvjikk-8">鹿の子</p>
        <div class="ColorSwatch__List-sc-1k99ke9-0"><span>カラー - 001</span><span>カラー - 166</span></div>"#;

    const COLOR_PAGE: &str = r#"
        <div class="Content__ColorAndPrice-sc-1t9s0qv-1"><p><span>ブラック</span></p></div>
        <ul class="htmlElements__Ul-sc-1e1gdav-4"><li><img src="/img/L1212_001.jpg"></li></ul>
        <div><span class="Desktop__Item-sc-4ldu9m-4">2</span><span class="Desktop__Item-sc-4ldu9m-4">3</span></div>"#;

    #[test]
    fn test_navigation_menu_and_sidebar() {
        let document = doc(HOMEPAGE, "https://www.lacoste.jp/");
        let directive =
            FetchDirective::navigation(SiteKind::LacosteJp, document.url().clone(), context());

        let output = site().handle_navigation(&document, &directive, &session());
        let listings: Vec<_> = output
            .directives
            .iter()
            .map(|d| (d.context.category_path.to_string(), d.target.path().to_string()))
            .collect();

        assert_eq!(
            listings,
            vec![
                ("メンズ / ウェア".to_string(), "/men/clothing".to_string()),
                (
                    "メンズ / ウェア / ポロシャツ".to_string(),
                    "/men/clothing/polos".to_string()
                ),
                ("women / bags".to_string(), "/women/bags".to_string()),
            ]
        );
    }

    #[test]
    fn test_listing_sku_from_path() {
        let document = doc(LISTING, "https://www.lacoste.jp/men/clothing");
        let directive = FetchDirective::listing(
            SiteKind::LacosteJp,
            document.url().clone(),
            context().for_listing(CategoryPath::new(["Men"])),
        );

        let output = site().handle_listing(&document, &directive, &session());
        let skus: Vec<_> = output
            .directives_for(Step::Detail)
            .filter_map(|d| d.carried_product.as_ref())
            .map(|p| p.base_sku.as_str())
            .collect();
        assert_eq!(skus, vec!["L1212", "PH4012"]);
        assert_eq!(output.records.len(), 2);
        assert_eq!(output.directives_for(Step::Listing).count(), 1);
    }

    #[test]
    fn test_detail_issues_one_page_per_color() {
        let document = doc(DETAIL, "https://www.lacoste.jp/products/L1212/polo?ref=x");
        let listing = context().for_listing(CategoryPath::new(["Men"]));
        let product = BaseProduct::from_listing(&listing, "L1212", document.url().as_str(), None);
        let directive =
            FetchDirective::detail(SiteKind::LacosteJp, document.url().clone(), listing, product);

        let output = site().handle_detail(&document, &directive, &session());
        assert!(output.records.is_empty());

        let targets: Vec<_> = output
            .directives_for(Step::ColorPage)
            .map(|d| (d.target.as_str(), d.color_code.as_deref()))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("https://www.lacoste.jp/products/L1212/polo/001", Some("001")),
                ("https://www.lacoste.jp/products/L1212/polo/166", Some("166")),
            ]
        );

        let detail = output.directives[0].carried_detail.as_ref().unwrap();
        assert_eq!(detail.title.as_deref(), Some("クラシックポロ"));
        assert_eq!(detail.prices.old_price_text.as_deref(), Some("16,500円"));
        assert_eq!(detail.prices.new_price_text.as_deref(), Some("13,200円"));
    }

    #[test]
    fn test_color_page_builds_record() {
        let detail_doc = doc(DETAIL, "https://www.lacoste.jp/products/L1212/polo");
        let listing = context().for_listing(CategoryPath::new(["Men"]));
        let product =
            BaseProduct::from_listing(&listing, "L1212", detail_doc.url().as_str(), None);
        let directive =
            FetchDirective::detail(SiteKind::LacosteJp, detail_doc.url().clone(), listing, product);
        let detail_output = site().handle_detail(&detail_doc, &directive, &session());
        let color_directive = &detail_output.directives[0];

        let page = doc(COLOR_PAGE, color_directive.target.as_str());
        let output = site().handle_color_page(&page, color_directive, &session());

        let Record::Product(record) = &output.records[0] else {
            panic!("expected product record");
        };
        assert_eq!(record.variant.identifier, "L1212-001");
        assert_eq!(record.variant.color_name, "ブラック");
        assert_eq!(
            record.variant.image_urls,
            vec!["https://www.lacoste.jp/img/L1212_001.jpg"]
        );
        let sizes: Vec<_> = record
            .variant
            .size_infos
            .iter()
            .map(|s| s.size_identifier.as_str())
            .collect();
        assert_eq!(sizes, vec!["L1212-001-2", "L1212-001-3"]);
        assert!(record.available);
        assert_eq!(record.currency, "JPY");
    }

    #[test]
    fn test_swatch_code() {
        assert_eq!(swatch_code("カラー - 001").as_deref(), Some("001"));
        assert_eq!(swatch_code("166").as_deref(), Some("166"));
        assert_eq!(swatch_code("カラー - "), None);
    }
}
