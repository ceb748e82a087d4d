//! Site-independent catalog core
//!
//! This module holds the parts every site crawler shares:
//! - The catalog data model (navigation nodes, products, variants, records)
//! - Category tree traversal
//! - Listing pagination policies
//! - Run-scoped product de-duplication
//! - Color/size variant expansion
//! - Record normalization
//!
//! Nothing in here performs I/O; site handlers feed it extracted values and
//! forward what it returns to the dispatcher.

mod dedup;
mod expander;
mod model;
mod normalizer;
mod paginator;
mod walker;

pub use dedup::{DedupKey, DedupScope, ProductDeduplicator, SeenSet};
pub use expander::{expand, expand_color, identifier, is_available, size_identifier};
pub use model::{
    BaseProduct, CategoryPath, ColorOption, ColorVariant, CrawlContext, DetailDocument,
    NavigationNode, NormalizedRecord, PriceFields, Record, SizeInfo, SizeOption, SummaryRecord,
    TaggedImage,
};
pub use normalizer::{to_full, to_summary};
pub use paginator::{next_page, ListingResult, PageTracker, PaginationPolicy, Paginator};
pub use walker::{walk, walk_forest, CategoryWalk};
