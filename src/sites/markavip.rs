//! MarkaVIP crawler
//!
//! One market (Saudi Arabia, English, SAR). The detail page lists every
//! color as a swatch, so records are expanded straight from it. Listings
//! chain through a "next page" control.

use crate::catalog::{
    BaseProduct, CategoryPath, ColorOption, DetailDocument, ListingResult, NavigationNode,
    PaginationPolicy, PriceFields, SizeOption, TaggedImage,
};
use crate::config::SiteEntry;
use crate::crawler::document::{attr_in, attrs_in, element_attr, element_text, select_in, text_in};
use crate::crawler::{Document, FetchDirective, HandlerOutput};
use crate::sites::{
    carried_product, detail_records, listing_directives, listing_output, ListingRow, Market,
    SiteCrawler, SiteKind, SiteSession, SiteSettings,
};
use crate::ConfigError;
use serde_json::Value;

const BRAND: &str = "markavip";
const DEFAULT_BASE_URL: &str = "https://markavip.com";
const START_PATH: &str = "/?regioncode=sa";

const TEST_ITEM_PATH: &str = "/p/versace-collection-mens-t-shirt-o-neck-short-sleeve-logo-pattern-casual-top-g0xdx0x4-rnc9gqc-xn-eoo-73.html?SPM=CAT.NEWIN.MEN.C3456";
const TEST_ITEM_SKU: &str = "56158575";
const TEST_ITEM_CATEGORY: &str = "Test cat";

const NAV_ITEM: &str = ".header-nav-wrap > ul > li";
const NAV_ITEM_LINK: &str = ".nav-item";
const NAV_GROUP: &str = "dl";
const NAV_GROUP_LINK: &str = ".fn-bold a";
const NAV_LEAF_LINK: &str = "dd:not(.fn-bold) a";

const LISTING_ROW: &str = "#J-pro-list > li";
const NEXT_PAGE: &str = ".ui-page-next";

const TITLE: &str = r#"[itemprop="name"]"#;
const DESCRIPTION: &str = "#detailHtml span";
const PRICE: &str = ".J-sku-price span";
const OLD_PRICE: &str = ".org-price-box del";
const COLOR_SWATCH: &str = r#"span[data-key="Color"]"#;
const GENERIC_IMAGE: &str = ".goods-loading";
const SIZE: &str = ".J-size-list a";
const STOCK: &str = ".stockNum";
const CURRENCY: &str = ".currency-site";
const SOLD_OUT: &str = ".J-sold-out";

/// Size name used when a product has no size selector
const ONE_SIZE: &str = "one_size";

pub struct MarkaVip {
    settings: SiteSettings,
}

impl MarkaVip {
    pub fn new(entry: &SiteEntry) -> Result<Self, ConfigError> {
        let settings =
            SiteSettings::from_entry(entry, DEFAULT_BASE_URL, vec![Market::new("sa", "en", "SAR")])?;
        Ok(Self { settings })
    }

    /// A fixed product with a synthetic listing entry
    fn single_item_directive(&self, market: &Market) -> Option<FetchDirective> {
        let url = match self.settings.url(TEST_ITEM_PATH) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build the single-item URL: {}", e);
                return None;
            }
        };

        let context = market
            .context(BRAND)
            .for_listing(CategoryPath::new([TEST_ITEM_CATEGORY]));
        let product = BaseProduct::from_listing(&context, TEST_ITEM_SKU, url.as_str(), None);

        Some(FetchDirective::detail(
            SiteKind::MarkaVip,
            url,
            context,
            product,
        ))
    }
}

impl SiteCrawler for MarkaVip {
    fn kind(&self) -> SiteKind {
        SiteKind::MarkaVip
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::FollowNext
    }

    fn start_directives(&self) -> Vec<FetchDirective> {
        if self.settings.single_item_test {
            tracing::info!("MarkaVIP single-item test: fetching product {}", TEST_ITEM_SKU);
            return self
                .settings
                .markets
                .first()
                .and_then(|market| self.single_item_directive(market))
                .into_iter()
                .collect();
        }

        self.settings
            .markets
            .iter()
            .filter_map(|market| match self.settings.url(START_PATH) {
                Ok(url) => Some(FetchDirective::navigation(
                    SiteKind::MarkaVip,
                    url,
                    market.context(BRAND),
                )),
                Err(e) => {
                    tracing::error!("Cannot build the MarkaVIP start URL: {}", e);
                    None
                }
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
        listing_directives(SiteKind::MarkaVip, document, &directive.context, &menu)
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
            SiteKind::MarkaVip,
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

        detail_records(&read_detail(document), product)
    }
}

/// Top menu entries, their column headings, and the links under each heading
fn read_menu(document: &Document) -> Vec<NavigationNode> {
    document
        .select(NAV_ITEM)
        .into_iter()
        .filter_map(|item| {
            let label = text_in(item, NAV_ITEM_LINK)?;
            // Only the entry's own link; nested dropdown links belong to its groups
            let href = select_in(item, NAV_ITEM_LINK).first().and_then(|link| {
                element_attr(*link, "href").or_else(|| attr_in(*link, "a", "href"))
            });

            let groups = select_in(item, NAV_GROUP)
                .into_iter()
                .map(|group| {
                    let leaves = select_in(group, NAV_LEAF_LINK)
                        .into_iter()
                        .filter_map(|link| {
                            Some(NavigationNode::new(
                                element_text(link)?,
                                element_attr(link, "href"),
                            ))
                        })
                        .collect();

                    NavigationNode::new(
                        text_in(group, NAV_GROUP_LINK).unwrap_or_default(),
                        attr_in(group, NAV_GROUP_LINK, "href"),
                    )
                    .with_children(leaves)
                })
                .collect();

            Some(NavigationNode::new(label, href).with_children(groups))
        })
        .collect()
}

fn read_listing_rows(document: &Document) -> Vec<ListingRow> {
    document
        .select(LISTING_ROW)
        .into_iter()
        .filter_map(|row| {
            let base_sku = element_attr(row, "data-gid");
            let url = attr_in(row, "a", "href").and_then(|href| document.resolve(&href));

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
    let disabled = document.exists(SOLD_OUT) || offers_out_of_stock(&document.json_ld());

    // A sold-out page leaves every size without stock, whatever the counter says
    let stock = if disabled {
        0
    } else {
        document
            .first_text(STOCK)
            .and_then(|text| text.parse::<u32>().ok())
            .unwrap_or(1)
    };

    let title = match document.require_text(TITLE) {
        Ok(title) => Some(title),
        Err(e) => {
            tracing::debug!("{} on {}", e, document.url());
            None
        }
    };

    let mut size_names = document.texts(SIZE);
    if size_names.is_empty() {
        size_names.push(ONE_SIZE.to_string());
    }
    let sizes: Vec<SizeOption> = size_names
        .into_iter()
        .map(|name| SizeOption::new(name, stock))
        .collect();

    let mut colors = Vec::new();
    let mut images = Vec::new();
    for swatch in document.select(COLOR_SWATCH) {
        let Some(code) = element_attr(swatch, "data-attrid") else {
            continue;
        };

        images.extend(
            attrs_in(swatch, "img", "src")
                .iter()
                .map(|src| TaggedImage {
                    url: full_size_image(src),
                    tag: Some(code.clone()),
                }),
        );

        colors.push(ColorOption {
            color_name: text_in(swatch, "a"),
            sizes: sizes.clone(),
            ..ColorOption::new(code)
        });
    }

    DetailDocument {
        title,
        description_text: document.texts(DESCRIPTION),
        prices: PriceFields {
            full_price_text: document.first_text(PRICE),
            old_price_text: document.first_text(OLD_PRICE),
            new_price_text: None,
        },
        colors,
        images,
        generic_images: document
            .attrs(GENERIC_IMAGE, "src")
            .iter()
            .map(|src| full_size_image(src))
            .collect(),
        disabled,
        currency: document.first_text(CURRENCY),
        ..DetailDocument::default()
    }
}

/// Thumbnail URL to full-size URL
///
/// Thumbnails look like `123.jpg_200x200t.jpg`; the original image is the
/// part before the first underscore.
fn full_size_image(src: &str) -> String {
    let src = src.replace("t.jpg", ".jpg");
    match src.split_once('_') {
        Some((original, _)) => original.to_string(),
        None => src,
    }
}

/// True if any JSON-LD offer declares the product out of stock
fn offers_out_of_stock(objects: &[Value]) -> bool {
    objects.iter().any(|object| match object.get("offers") {
        Some(Value::Array(offers)) => offers.iter().any(is_out_of_stock),
        Some(offer) => is_out_of_stock(offer),
        None => false,
    })
}

fn is_out_of_stock(offer: &Value) -> bool {
    offer
        .get("availability")
        .and_then(Value::as_str)
        .is_some_and(|availability| availability.ends_with("OutOfStock"))
}
