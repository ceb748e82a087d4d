//! Record normalization
//!
//! Summaries are built straight from a base product at listing time. Full
//! records only get their required fields checked and their optional text
//! fields tidied; nothing is invented for fields a page did not have.

use crate::catalog::model::{BaseProduct, NormalizedRecord, PriceFields, SummaryRecord};
use crate::CatalogError;

/// Builds the listing-time summary of a product
pub fn to_summary(base: &BaseProduct) -> SummaryRecord {
    SummaryRecord {
        url: base.url.clone(),
        base_sku: base.base_sku.clone(),
        referer_url: base.referer_url.clone(),
        category_path: base.category_path.clone(),
        country_code: base.country_code.clone(),
        currency: base.currency.clone(),
        language_code: base.language_code.clone(),
        brand: base.brand.clone(),
    }
}

/// Finalizes a product record
///
/// # Errors
///
/// Returns `CatalogError::MissingRequiredField` when an identity or market
/// field is blank.
pub fn to_full(record: NormalizedRecord) -> Result<NormalizedRecord, CatalogError> {
    let required = [
        ("url", record.url.as_str()),
        ("base_sku", record.base_sku.as_str()),
        ("identifier", record.variant.identifier.as_str()),
        ("country_code", record.country_code.as_str()),
        ("currency", record.currency.as_str()),
        ("language_code", record.language_code.as_str()),
        ("brand", record.brand.as_str()),
    ];

    if let Some(&(field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(CatalogError::MissingRequiredField {
            url: record.url.clone(),
            field,
        });
    }

    let PriceFields {
        full_price_text,
        old_price_text,
        new_price_text,
    } = record.prices;

    Ok(NormalizedRecord {
        title: clean(record.title),
        description_text: record
            .description_text
            .into_iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        prices: PriceFields {
            full_price_text: clean(full_price_text),
            old_price_text: clean(old_price_text),
            new_price_text: clean(new_price_text),
        },
        referer_url: clean(record.referer_url),
        ..record
    })
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
