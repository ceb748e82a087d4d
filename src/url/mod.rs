//! URL handling module for Catalog-Ripple
//!
//! This module provides link filtering and resolution for hrefs pulled out
//! of site markup, plus URL normalization used to key visited pages.

mod normalize;

use ::url::Url;

pub use normalize::normalize_url;

/// Schemes that look like links but never lead to a page
const PSEUDO_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Returns true if `href` is a pseudo-link (script, mail, phone, data, anchor)
pub fn is_pseudo_link(href: &str) -> bool {
    let href = href.trim();
    let lowered = href.to_ascii_lowercase();

    PSEUDO_SCHEMES
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
        || href.starts_with('#')
}

/// Returns true if `href` is non-empty and not a pseudo-link
pub fn is_followable(href: &str) -> bool {
    let href = href.trim();
    !href.is_empty() && !is_pseudo_link(href)
}

/// Resolves an href against the page it was found on
///
/// Returns None if the link should be skipped:
/// - empty hrefs and pseudo-links
/// - hrefs that cannot be joined onto `base_url`
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if !is_followable(href) {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
