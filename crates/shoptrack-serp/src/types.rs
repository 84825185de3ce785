//! Provider-neutral types produced by the fetch layer.
//!
//! Each provider adapter resolves its own response shape into
//! [`ProvisionalRecord`] so that the dispatcher, normalizer, and loader never
//! branch on provider-specific field presence.

use chrono::{DateTime, Utc};

/// An upstream search API vendor in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    ValueSerp,
    SerpApi,
}

impl Provider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::ValueSerp => "valueserp",
            Provider::SerpApi => "serpapi",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two query modes the pipeline runs per keyword.
///
/// Popular products come from the general result page and carry no filter
/// facets; the shopping tab returns structured shopping results plus the
/// sidebar filter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    PopularProducts,
    ShoppingTab,
}

impl SearchMode {
    /// The `scrape_type_id` stored alongside rows from this mode.
    #[must_use]
    pub fn scrape_type_id(self) -> i16 {
        match self {
            SearchMode::PopularProducts => 1,
            SearchMode::ShoppingTab => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::PopularProducts => "popular_products",
            SearchMode::ShoppingTab => "shopping_tab",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product listing as adapted from a provider response, before batch
/// normalization. Loosely-typed upstream fields have already been coerced
/// best-effort-else-null by the provider adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionalRecord {
    pub scrape_date: DateTime<Utc>,
    pub keyword: String,
    pub position: Option<i32>,
    /// Empty string when no identifier could be recovered.
    pub product_id: String,
    pub title: String,
    pub link: String,
    pub rating: Option<f64>,
    pub reviews: Option<i64>,
    pub price: Option<f64>,
    pub price_raw: String,
    pub merchant: String,
    pub is_carousel: bool,
    pub carousel_position: Option<i32>,
    pub filters_raw: String,
    /// Which provider produced this record, for success-rate reporting.
    pub provider: Provider,
}

/// Result of running one keyword through the fallback chain.
///
/// `records` is empty either because every provider legitimately found
/// nothing (`provider_errors` empty too) or because providers errored —
/// callers can tell the two apart.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<ProvisionalRecord>,
    pub provider_errors: Vec<String>,
}
