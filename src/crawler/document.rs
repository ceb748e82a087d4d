//! Field extraction from fetched HTML
//!
//! This module wraps a parsed page and answers the questions site handlers
//! ask of it:
//! - Text and attribute values by CSS selector, trimmed, empty counting as missing
//! - The same lookups scoped to one element for nested markup
//! - Link resolution against the page URL, filtering pseudo-links
//! - Embedded JSON-LD payloads
//!
//! Selector misses are never errors here. Handlers decide what a missing
//! value means.

use crate::url::resolve_link;
use crate::ExtractError;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

/// A fetched page ready for extraction
pub struct Document {
    html: Html,
    url: Url,
}

impl Document {
    /// Parses `body`, remembering the URL it was served from
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_ripple::crawler::Document;
    /// use url::Url;
    ///
    /// let html = r#"<div class="price"> 120 SAR </div><a class="next" href="?p=2">next</a>"#;
    /// let doc = Document::parse(html, Url::parse("https://shop.example/men").unwrap());
    ///
    /// assert_eq!(doc.first_text(".price").as_deref(), Some("120 SAR"));
    /// assert_eq!(
    ///     doc.resolve_attr("a.next", "href").unwrap().as_str(),
    ///     "https://shop.example/men?p=2"
    /// );
    /// ```
    pub fn parse(body: &str, url: Url) -> Self {
        Self {
            html: Html::parse_document(body),
            url,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All elements matching `css`, in document order
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match selector(css) {
            Some(selector) => self.html.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    /// Text of the first matching element with non-empty text
    pub fn first_text(&self, css: &str) -> Option<String> {
        let found = self.select(css).into_iter().find_map(element_text);
        if found.is_none() {
            tracing::trace!("'{}' matched no text on {}", css, self.url);
        }
        found
    }

    /// Non-empty texts of every matching element
    pub fn texts(&self, css: &str) -> Vec<String> {
        self.select(css).into_iter().filter_map(element_text).collect()
    }

    /// Like `first_text`, but a miss is reported as an extraction error
    pub fn require_text(&self, css: &str) -> Result<String, ExtractError> {
        self.first_text(css).ok_or_else(|| ExtractError::MissingField {
            selector: css.to_string(),
        })
    }

    /// Attribute of the first matching element that carries a non-empty one
    pub fn first_attr(&self, css: &str, attr: &str) -> Option<String> {
        self.select(css)
            .into_iter()
            .find_map(|element| element_attr(element, attr))
    }

    /// Non-empty attribute values of every matching element
    pub fn attrs(&self, css: &str, attr: &str) -> Vec<String> {
        self.select(css)
            .into_iter()
            .filter_map(|element| element_attr(element, attr))
            .collect()
    }

    pub fn exists(&self, css: &str) -> bool {
        !self.select(css).is_empty()
    }

    /// Joins `href` onto the page URL, dropping pseudo-links
    pub fn resolve(&self, href: &str) -> Option<Url> {
        resolve_link(href, &self.url)
    }

    /// Resolves the first non-empty `attr` of elements matching `css`
    pub fn resolve_attr(&self, css: &str, attr: &str) -> Option<Url> {
        self.first_attr(css, attr)
            .and_then(|href| self.resolve(&href))
    }

    /// Resolves every non-empty `attr` of elements matching `css`
    pub fn urls(&self, css: &str, attr: &str) -> Vec<Url> {
        self.attrs(css, attr)
            .iter()
            .filter_map(|href| self.resolve(href))
            .collect()
    }

    /// The page's `<link rel="canonical">`, falling back to the page URL
    pub fn canonical_url(&self) -> Url {
        self.resolve_attr(r#"link[rel="canonical"]"#, "href")
            .unwrap_or_else(|| self.url.clone())
    }

    /// Every JSON-LD object on the page
    ///
    /// Top-level arrays and `@graph` containers are flattened. Blocks that
    /// do not parse are skipped with a warning.
    pub fn json_ld(&self) -> Vec<Value> {
        let mut objects = Vec::new();

        for script in self.select(r#"script[type="application/ld+json"]"#) {
            match parse_json_payload(&script.text().collect::<String>()) {
                Ok(value) => flatten_json_ld(value, &mut objects),
                Err(e) => tracing::warn!("Skipping JSON-LD block on {}: {}", self.url, e),
            }
        }

        objects
    }
}

/// Parses one embedded JSON payload
pub fn parse_json_payload(raw: &str) -> Result<Value, ExtractError> {
    serde_json::from_str(raw.trim()).map_err(|e| ExtractError::MalformedPayload(e.to_string()))
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
                if map.keys().any(|key| key != "@context") {
                    out.push(Value::Object(map));
                }
            } else {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::warn!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Collapses whitespace runs; None if nothing is left
fn clean_text(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text content of an element, whitespace-collapsed
pub fn element_text(element: ElementRef<'_>) -> Option<String> {
    clean_text(&element.text().collect::<String>())
}

/// An attribute of the element itself, trimmed
pub fn element_attr(element: ElementRef<'_>, attr: &str) -> Option<String> {
    element
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Descendants of `element` matching `css`
pub fn select_in<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match selector(css) {
        Some(selector) => element.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// First non-empty text among descendants of `element` matching `css`
pub fn text_in(element: ElementRef<'_>, css: &str) -> Option<String> {
    select_in(element, css).into_iter().find_map(element_text)
}

/// First non-empty attribute among descendants of `element` matching `css`
pub fn attr_in(element: ElementRef<'_>, css: &str, attr: &str) -> Option<String> {
    select_in(element, css)
        .into_iter()
        .find_map(|child| element_attr(child, attr))
}

/// Every non-empty attribute among descendants of `element` matching `css`
pub fn attrs_in(element: ElementRef<'_>, css: &str, attr: &str) -> Vec<String> {
    select_in(element, css)
        .into_iter()
        .filter_map(|child| element_attr(child, attr))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Document {
        Document::parse(html, Url::parse("https://shop.example/men/shoes").unwrap())
    }

    #[test]
    fn test_first_text_trims_and_skips_empty() {
        let d = doc(r#"<p class="t"> </p><p class="t">
            Leather   Boot </p>"#);
        assert_eq!(d.first_text(".t").as_deref(), Some("Leather Boot"));
        assert_eq!(d.first_text(".missing"), None);
    }

    #[test]
    fn test_texts_and_attrs() {
        let d = doc(r#"<ul><li data-v="a">One</li><li data-v="">Two</li><li>  </li></ul>"#);
        assert_eq!(d.texts("li"), vec!["One", "Two"]);
        assert_eq!(d.attrs("li", "data-v"), vec!["a"]);
        assert_eq!(d.first_attr("li", "data-v").as_deref(), Some("a"));
    }

    #[test]
    fn test_require_text_reports_selector() {
        let d = doc("<div></div>");
        assert_eq!(
            d.require_text("h1").unwrap_err(),
            ExtractError::MissingField {
                selector: "h1".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let d = doc("<div>x</div>");
        assert!(d.select("div[[").is_empty());
        assert!(!d.exists("div[["));
    }

    #[test]
    fn test_resolve_filters_pseudo_links() {
        let d = doc("");
        assert_eq!(
            d.resolve("../women").unwrap().as_str(),
            "https://shop.example/women"
        );
        assert!(d.resolve("javascript:;").is_none());
    }

    #[test]
    fn test_urls_resolves_and_drops_pseudo_links() {
        let d = doc(r#"<img src="/a.jpg"><img src="javascript:;"><img src="https://cdn.example/b.jpg">"#);
        let urls: Vec<_> = d.urls("img", "src").iter().map(Url::to_string).collect();
        assert_eq!(
            urls,
            vec!["https://shop.example/a.jpg", "https://cdn.example/b.jpg"]
        );
    }

    #[test]
    fn test_canonical_url() {
        let d = doc(r#"<head><link rel="canonical" href="/p/polo-L1212"></head>"#);
        assert_eq!(d.canonical_url().as_str(), "https://shop.example/p/polo-L1212");

        let d = doc("<head></head>");
        assert_eq!(d.canonical_url().as_str(), "https://shop.example/men/shoes");
    }

    #[test]
    fn test_json_ld_flattens_and_skips_malformed() {
        let d = doc(
            r#"<script type="application/ld+json">{"@type":"Product","name":"Polo"}</script>
               <script type="application/ld+json">{not json</script>
               <script type="application/ld+json">
                 {"@context":"https://schema.org","@graph":[{"@type":"BreadcrumbList"},{"@type":"Offer"}]}
               </script>"#,
        );

        let types: Vec<_> = d
            .json_ld()
            .iter()
            .filter_map(|v| v.get("@type").and_then(Value::as_str).map(str::to_string))
            .collect();
        assert_eq!(types, vec!["Product", "BreadcrumbList", "Offer"]);
    }

    #[test]
    fn test_malformed_payload_error() {
        assert!(matches!(
            parse_json_payload("{"),
            Err(ExtractError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_element_scoped_helpers() {
        let d = doc(
            r#"<li class="row" data-gid="77"><a href="/p/77.html"><span>Polo</span></a><img src="a.jpg"><img src="b.jpg"></li>"#,
        );
        let row = d.select("li.row")[0];

        assert_eq!(element_attr(row, "data-gid").as_deref(), Some("77"));
        assert_eq!(attr_in(row, "a", "href").as_deref(), Some("/p/77.html"));
        assert_eq!(text_in(row, "a span").as_deref(), Some("Polo"));
        assert_eq!(attrs_in(row, "img", "src"), vec!["a.jpg", "b.jpg"]);
    }
}
