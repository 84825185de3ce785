//! SerpApi response adapter (secondary provider).
//!
//! ## Shape differences from ValueSERP
//!
//! - The merchant field is called `seller`.
//! - Review counts arrive as compact strings (`"7.7K"`), not raw counts.
//! - Prices come as display strings (`"$39.99"`) with a separate
//!   `extracted_price` number; when both are absent the price sometimes
//!   hides in a free-text `extensions` entry.
//! - Popular products live under `immersive_products`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use shoptrack_core::coerce::try_f64;

use crate::parse::{extract_product_id_from_link, parse_price_text};
use crate::providers::{coerce_reviews, scalar_to_string};
use crate::types::{Provider, ProvisionalRecord, SearchMode};

pub(crate) const BASE_URL: &str = "https://serpapi.com/search";

#[derive(Debug, Deserialize)]
pub(crate) struct SerpApiResponse {
    #[serde(default)]
    pub immersive_products: Vec<SerpApiItem>,
    #[serde(default)]
    pub shopping_results: Vec<SerpApiItem>,
    #[serde(default)]
    pub filters: Vec<SerpApiFilterGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SerpApiItem {
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub product_id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub reviews: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub extracted_price: Option<f64>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SerpApiFilterGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<SerpApiFilterValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SerpApiFilterValue {
    #[serde(default)]
    pub name: Option<String>,
}

pub(crate) fn query_params(
    mode: SearchMode,
    api_key: &str,
    keyword: &str,
    location: &str,
) -> Vec<(&'static str, String)> {
    let engine = match mode {
        SearchMode::PopularProducts => "google",
        SearchMode::ShoppingTab => "google_shopping",
    };
    vec![
        ("api_key", api_key.to_string()),
        ("engine", engine.to_string()),
        ("q", keyword.to_string()),
        ("location", location.to_string()),
        ("gl", "au".to_string()),
        ("hl", "en".to_string()),
        ("google_domain", "google.com.au".to_string()),
    ]
}

pub(crate) fn adapt_response(
    response: SerpApiResponse,
    mode: SearchMode,
    keyword: &str,
    scrape_date: DateTime<Utc>,
) -> Vec<ProvisionalRecord> {
    let (items, filters_raw) = match mode {
        SearchMode::PopularProducts => (response.immersive_products, String::new()),
        SearchMode::ShoppingTab => {
            let filters_raw = build_filters_raw(&response.filters);
            (response.shopping_results, filters_raw)
        }
    };

    items
        .into_iter()
        .map(|item| adapt_item(item, mode, keyword, &filters_raw, scrape_date))
        .collect()
}

fn adapt_item(
    item: SerpApiItem,
    mode: SearchMode,
    keyword: &str,
    filters_raw: &str,
    scrape_date: DateTime<Utc>,
) -> ProvisionalRecord {
    let link = item
        .link
        .clone()
        .or_else(|| item.product_link.clone())
        .unwrap_or_default();

    let mut product_id = item
        .product_id
        .as_ref()
        .map(scalar_to_string)
        .unwrap_or_default();
    if product_id.is_empty() {
        product_id = extract_product_id_from_link(&link).unwrap_or_default();
    }

    let rating = try_f64(item.rating.as_ref());

    let reviews = match mode {
        SearchMode::PopularProducts => Some(coerce_reviews(item.reviews.as_ref()).unwrap_or(0)),
        SearchMode::ShoppingTab => coerce_reviews(item.reviews.as_ref()),
    };

    let (price, price_raw) = adapt_price(&item);

    ProvisionalRecord {
        scrape_date,
        keyword: keyword.to_string(),
        position: item.position,
        product_id,
        title: item.title.unwrap_or_default(),
        link,
        rating,
        reviews,
        price,
        price_raw,
        merchant: item.seller.unwrap_or_default(),
        is_carousel: false,
        carousel_position: None,
        filters_raw: filters_raw.to_string(),
        provider: Provider::SerpApi,
    }
}

/// Price resolution order: `extracted_price`, then the display `price`
/// string, then the first extension entry that parses as a price.
fn adapt_price(item: &SerpApiItem) -> (Option<f64>, String) {
    let display = item
        .price
        .as_ref()
        .map(scalar_to_string)
        .unwrap_or_default();

    if let Some(extracted) = item.extracted_price.filter(|v| v.is_finite()) {
        let raw = if display.is_empty() {
            extracted.to_string()
        } else {
            display
        };
        return (Some(extracted), raw);
    }

    if !display.is_empty() {
        return (parse_price_text(&display), display);
    }

    for extension in &item.extensions {
        if let Some(parsed) = parse_price_text(extension) {
            return (Some(parsed), extension.clone());
        }
    }

    (None, String::new())
}

fn build_filters_raw(groups: &[SerpApiFilterGroup]) -> String {
    let mut entries = Vec::new();
    for group in groups {
        let Some(group_name) = group.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        for value in &group.values {
            if let Some(value_name) = value.name.as_deref().filter(|v| !v.is_empty()) {
                entries.push(format!("{group_name} - {value_name}"));
            }
        }
    }
    entries.join(", ")
}
