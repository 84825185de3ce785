//! Canonical product records and filter facets.
//!
//! [`ProductRecord`] is the normalized unit persisted to `scrape_data`.
//! Field defaults follow the column contract: string columns are never null
//! here ("" stands in for unknown) and the loader decides which empty strings
//! bridge to SQL NULL at insert time.

use chrono::{DateTime, Utc};

/// A normalized product row ready for bulk insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub scrape_date: DateTime<Utc>,
    pub keyword: String,
    /// 1-based provider rank; 0 when the provider did not report one.
    pub position: i32,
    /// Empty string means unknown; the loader stores that as NULL.
    pub product_id: String,
    pub title: String,
    /// Empty string means no product page; the loader stores that as NULL.
    pub link: String,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub price: Option<f64>,
    /// Original price text as the provider sent it, possibly empty, even when
    /// `price` failed to parse.
    pub price_raw: String,
    pub merchant: String,
    pub is_carousel: bool,
    pub carousel_position: Option<i32>,
    pub has_product_page: bool,
    /// Zero or more "category - value" pairs joined by ", ".
    pub filters_raw: String,
}

/// A single (category, value) filter pair associated with a product row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterFacet {
    pub category: String,
    pub value: String,
}

/// Splits a raw filters string into facets.
///
/// Segments are separated by `,`; each trimmed non-empty segment is split
/// once on the first `" - "`. Segments without that separator are silently
/// dropped. Pure and idempotent.
#[must_use]
pub fn parse_filters_raw(filters_raw: &str) -> Vec<FilterFacet> {
    filters_raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            part.split_once(" - ").map(|(category, value)| FilterFacet {
                category: category.trim().to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

/// Serializes facets back into the `filters_raw` wire format.
#[must_use]
pub fn serialize_filters(facets: &[FilterFacet]) -> String {
    facets
        .iter()
        .map(|f| format!("{} - {}", f.category, f.value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facet(category: &str, value: &str) -> FilterFacet {
        FilterFacet {
            category: category.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn parses_multiple_pairs() {
        let facets = parse_filters_raw("Brand - Nike, Colour - Black");
        assert_eq!(facets, vec![facet("Brand", "Nike"), facet("Colour", "Black")]);
    }

    #[test]
    fn splits_only_on_first_separator() {
        let facets = parse_filters_raw("Size - US 9 - wide fit");
        assert_eq!(facets, vec![facet("Size", "US 9 - wide fit")]);
    }

    #[test]
    fn drops_segments_without_separator() {
        let facets = parse_filters_raw("Brand - Nike, on sale, Colour - Black");
        assert_eq!(facets, vec![facet("Brand", "Nike"), facet("Colour", "Black")]);
    }

    #[test]
    fn empty_input_yields_no_facets() {
        assert!(parse_filters_raw("").is_empty());
        assert!(parse_filters_raw("  , ,").is_empty());
    }

    #[test]
    fn round_trips_when_text_has_no_embedded_separators() {
        let facets = vec![facet("Brand", "Nike"), facet("Price", "Under $50")];
        assert_eq!(parse_filters_raw(&serialize_filters(&facets)), facets);
    }

    #[test]
    fn parse_is_idempotent() {
        let raw = "Brand - Nike, Colour - Black";
        let once = parse_filters_raw(raw);
        let twice = parse_filters_raw(&serialize_filters(&once));
        assert_eq!(once, twice);
    }
}
