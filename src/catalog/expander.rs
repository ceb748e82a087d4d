//! Color and size variant expansion
//!
//! Turns one base product plus its detail document into one record per
//! color. Every record starts from its own copy of the base fields, and
//! sizes are built only after their color identifier is fixed.

use crate::catalog::model::{
    BaseProduct, ColorOption, ColorVariant, DetailDocument, NormalizedRecord, SizeInfo,
    SizeOption,
};

/// Identifier of a color variant: base SKU and color code joined by `-`
pub fn identifier(base_sku: &str, color_code: &str) -> String {
    format!("{}-{}", base_sku.trim(), color_code.trim())
}

/// Identifier of a size within a color variant
pub fn size_identifier(identifier: &str, size_name: &str) -> String {
    format!("{}-{}", identifier, size_name.trim())
}

/// Availability of a variant
///
/// With sizes, a variant is available iff one size has stock. Without a size
/// list the page-level disabled marker decides.
pub fn is_available(sizes: &[SizeInfo], disabled: bool) -> bool {
    if sizes.is_empty() {
        !disabled
    } else {
        sizes.iter().any(|size| size.stock > 0)
    }
}

/// Expands every color of `detail` into a record
pub fn expand(detail: &DetailDocument, base: &BaseProduct) -> Vec<NormalizedRecord> {
    if detail.colors.is_empty() {
        tracing::debug!("No color variants on {}", base.url);
    }

    detail
        .colors
        .iter()
        .map(|color| expand_color(detail, base, color))
        .collect()
}

/// Expands a single color of `detail` into a record
///
/// Used directly by sites that fetch one page per color.
pub fn expand_color(
    detail: &DetailDocument,
    base: &BaseProduct,
    color: &ColorOption,
) -> NormalizedRecord {
    let identifier = identifier(&base.base_sku, &color.color_code);
    let size_infos = build_sizes(&identifier, &color.sizes);
    let available = is_available(&size_infos, detail.disabled);
    let use_size_level_prices = size_infos
        .iter()
        .any(|size| size.full_price_text.is_some() || size.old_price_text.is_some());

    let variant = ColorVariant {
        color_name: resolve_color_name(detail, color),
        image_urls: resolve_images(detail, color, &identifier),
        color_code: color.color_code.clone(),
        identifier,
        size_infos,
    };

    let base = base.clone();
    NormalizedRecord {
        url: base.url,
        base_sku: base.base_sku,
        referer_url: base.referer_url,
        category_path: base.category_path,
        country_code: base.country_code,
        currency: detail.currency.clone().unwrap_or(base.currency),
        language_code: base.language_code,
        brand: base.brand,
        title: detail.title.clone(),
        description_text: detail.description_text.clone(),
        prices: detail.prices.clone(),
        variant,
        available,
        use_size_level_prices,
    }
}

fn build_sizes(identifier: &str, sizes: &[SizeOption]) -> Vec<SizeInfo> {
    sizes
        .iter()
        .map(|size| SizeInfo {
            size_name: size.name.trim().to_string(),
            size_identifier: size_identifier(identifier, &size.name),
            stock: size.stock,
            full_price_text: size.full_price_text.clone(),
            old_price_text: size.old_price_text.clone(),
        })
        .collect()
}

/// Mapped name, then the swatch's own name, then the raw code
fn resolve_color_name(detail: &DetailDocument, color: &ColorOption) -> String {
    detail
        .color_names
        .get(&color.color_code)
        .cloned()
        .or_else(|| color.color_name.clone())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| color.color_code.clone())
}

fn resolve_images(detail: &DetailDocument, color: &ColorOption, identifier: &str) -> Vec<String> {
    let tagged: Vec<String> = if detail.colors.len() > 1 {
        detail
            .images
            .iter()
            .filter(|image| {
                image
                    .tag
                    .as_deref()
                    .is_some_and(|tag| tag == color.color_code || tag == identifier)
            })
            .map(|image| image.url.clone())
            .collect()
    } else {
        Vec::new()
    };

    if !tagged.is_empty() {
        return tagged;
    }

    if !detail.generic_images.is_empty() {
        return detail.generic_images.clone();
    }

    detail.images.iter().map(|image| image.url.clone()).collect()
}
