//! Catalog data model
//!
//! Values flow one way: navigation nodes produce category paths, listings
//! produce base products, detail pages produce detail documents, and the
//! expander turns a base product plus its detail document into records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ordered category labels from the navigation root down to a listing
///
/// Paths are never mutated in place: descending one level builds a new
/// path, so sibling branches can hold their own copies safely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    /// The empty path above every top-level category
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from raw labels, dropping blank ones
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            labels
                .into_iter()
                .map(|label| label.as_ref().trim().to_string())
                .filter(|label| !label.is_empty())
                .collect(),
        )
    }

    /// Returns a new path one level deeper
    ///
    /// A blank label leaves the path unchanged.
    pub fn child(&self, label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() {
            return self.clone();
        }

        let mut labels = Vec::with_capacity(self.0.len() + 1);
        labels.extend(self.0.iter().cloned());
        labels.push(label.to_string());
        Self(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" / "))
    }
}

/// A node of a site's category menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationNode {
    /// Display text of the menu entry
    pub label: String,

    /// Link of the entry as found in the markup (may be relative)
    pub target_path: Option<String>,

    /// Sub-entries in source order
    pub children: Vec<NavigationNode>,

    /// 0 for top-level entries
    pub depth: usize,
}

impl NavigationNode {
    /// Creates a top-level node without children
    pub fn new(label: impl Into<String>, target_path: Option<String>) -> Self {
        Self {
            label: label.into(),
            target_path,
            children: Vec::new(),
            depth: 0,
        }
    }

    /// Attaches children, fixing up their depths below this node
    pub fn with_children(mut self, children: Vec<NavigationNode>) -> Self {
        for mut child in children {
            child.set_depth(self.depth + 1);
            self.children.push(child);
        }
        self
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in &mut self.children {
            child.set_depth(depth + 1);
        }
    }

    /// The node's link, if it is one a crawler can follow
    pub fn link(&self) -> Option<&str> {
        self.target_path
            .as_deref()
            .map(str::trim)
            .filter(|target| crate::url::is_followable(target))
    }

    /// Number of nodes in this subtree, this node included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

/// Context carried from a crawl start through every derived fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlContext {
    pub country_code: String,
    pub currency: String,
    pub language_code: String,
    pub brand: String,
    pub category_path: CategoryPath,

    /// Set on listing pages reached through pagination
    pub is_pagination_continuation: bool,
}

impl CrawlContext {
    pub fn new(
        country_code: impl Into<String>,
        language_code: impl Into<String>,
        currency: impl Into<String>,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            currency: currency.into(),
            language_code: language_code.into(),
            brand: brand.into(),
            category_path: CategoryPath::root(),
            is_pagination_continuation: false,
        }
    }

    /// Context for the first page of a listing found under `path`
    pub fn for_listing(&self, path: CategoryPath) -> Self {
        Self {
            category_path: path,
            is_pagination_continuation: false,
            ..self.clone()
        }
    }

    /// Context for a later page of the same listing
    pub fn as_continuation(&self) -> Self {
        Self {
            is_pagination_continuation: true,
            ..self.clone()
        }
    }
}

/// A product as it appears on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseProduct {
    pub base_sku: String,
    pub url: String,
    pub referer_url: Option<String>,
    pub category_path: CategoryPath,
    pub country_code: String,
    pub currency: String,
    pub language_code: String,
    pub brand: String,
}

impl BaseProduct {
    /// Builds a product from a listing row, inheriting the listing context
    pub fn from_listing(
        context: &CrawlContext,
        base_sku: impl Into<String>,
        url: impl Into<String>,
        referer_url: Option<String>,
    ) -> Self {
        Self {
            base_sku: base_sku.into(),
            url: url.into(),
            referer_url,
            category_path: context.category_path.clone(),
            country_code: context.country_code.clone(),
            currency: context.currency.clone(),
            language_code: context.language_code.clone(),
            brand: context.brand.clone(),
        }
    }
}

/// Price texts as shown on the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_price_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_price_text: Option<String>,
}

/// A size as extracted from a detail or color page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeOption {
    pub name: String,
    pub stock: u32,
    pub full_price_text: Option<String>,
    pub old_price_text: Option<String>,
}

impl SizeOption {
    pub fn new(name: impl Into<String>, stock: u32) -> Self {
        Self {
            name: name.into(),
            stock,
            full_price_text: None,
            old_price_text: None,
        }
    }
}

/// A color swatch as extracted from a detail or color page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorOption {
    pub color_code: String,

    /// Name shown next to the swatch, when the page has one
    pub color_name: Option<String>,

    pub sizes: Vec<SizeOption>,
}

impl ColorOption {
    pub fn new(color_code: impl Into<String>) -> Self {
        Self {
            color_code: color_code.into(),
            color_name: None,
            sizes: Vec::new(),
        }
    }
}

/// An image URL, optionally tagged with the color it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedImage {
    pub url: String,

    /// Color code or variant identifier the image was tagged with
    pub tag: Option<String>,
}

/// Everything a detail page yielded for one base product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailDocument {
    pub title: Option<String>,
    pub description_text: Vec<String>,
    pub prices: PriceFields,
    pub colors: Vec<ColorOption>,

    /// Site-specific color code to display name mapping
    pub color_names: HashMap<String, String>,

    pub images: Vec<TaggedImage>,

    /// Images not bound to any color
    pub generic_images: Vec<String>,

    /// Page-level sold-out / disabled marker
    pub disabled: bool,

    /// Currency shown on the page, overriding the market default
    pub currency: Option<String>,
}

/// A size entry of a normalized record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub size_name: String,
    pub size_identifier: String,
    pub stock: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_price_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price_text: Option<String>,
}

/// A resolved color variant of a base product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorVariant {
    pub identifier: String,
    pub color_code: String,
    pub color_name: String,
    pub image_urls: Vec<String>,
    pub size_infos: Vec<SizeInfo>,
}

/// The lightweight record emitted for every listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub url: String,
    pub base_sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer_url: Option<String>,
    pub category_path: CategoryPath,
    pub country_code: String,
    pub currency: String,
    pub language_code: String,
    pub brand: String,
}

/// One color of one product, fully populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub url: String,
    pub base_sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer_url: Option<String>,
    pub category_path: CategoryPath,
    pub country_code: String,
    pub currency: String,
    pub language_code: String,
    pub brand: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description_text: Vec<String>,
    #[serde(flatten)]
    pub prices: PriceFields,

    #[serde(flatten)]
    pub variant: ColorVariant,

    pub available: bool,
    pub use_size_level_prices: bool,
}

/// Anything the crawl emits downstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Summary(SummaryRecord),
    Product(NormalizedRecord),
}

impl Record {
    pub fn url(&self) -> &str {
        match self {
            Record::Summary(summary) => &summary.url,
            Record::Product(product) => &product.url,
        }
    }
}
