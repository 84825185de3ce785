//! ValueSERP response adapter (primary provider).
//!
//! ## Observed shape
//!
//! The `engine=google` query returns popular products under the
//! `popular_products` key; `search_type=shopping` returns `shopping_results`
//! plus a `filters` list of `{name, values: [{name}]}` groups. Link fields
//! vary per item (`link`, `product_link`, `url`, `shopping_link`), prices
//! arrive as numbers or strings, and some items carry a structured
//! `regular_price {value, symbol}` instead of a flat `price`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use shoptrack_core::coerce::try_f64;

use crate::parse::extract_product_id_from_link;
use crate::providers::{coerce_reviews, scalar_to_string};
use crate::types::{Provider, ProvisionalRecord, SearchMode};

pub(crate) const BASE_URL: &str = "https://api.valueserp.com/search";

#[derive(Debug, Deserialize)]
pub(crate) struct ValueSerpResponse {
    #[serde(default)]
    pub popular_products: Vec<ValueSerpItem>,
    #[serde(default)]
    pub shopping_results: Vec<ValueSerpItem>,
    #[serde(default)]
    pub filters: Vec<ValueSerpFilterGroup>,
}

/// A single result item. Every field is optional — missing or oddly-typed
/// fields must degrade to null, never to a parse failure.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ValueSerpItem {
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub shopping_link: Option<String>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub reviews: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub regular_price: Option<ValueSerpRegularPrice>,
    #[serde(default)]
    pub merchant: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueSerpRegularPrice {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueSerpFilterGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub values: Vec<ValueSerpFilterValue>,
}

/// Filter values are usually `{name: "..."}` objects but bare strings have
/// been observed.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ValueSerpFilterValue {
    Named {
        #[serde(default)]
        name: Option<String>,
    },
    Text(String),
}

/// Query parameters for one search call.
pub(crate) fn query_params(
    mode: SearchMode,
    api_key: &str,
    keyword: &str,
    location: &str,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("api_key", api_key.to_string()),
        ("q", keyword.to_string()),
        ("location", location.to_string()),
        ("gl", "au".to_string()),
        ("hl", "en".to_string()),
    ];
    match mode {
        SearchMode::PopularProducts => {
            params.push(("google_domain", "google.com.au".to_string()));
            params.push(("engine", "google".to_string()));
            params.push(("include_ai_overview", "false".to_string()));
            params.push(("ads_optimized", "false".to_string()));
        }
        SearchMode::ShoppingTab => {
            params.push(("google_domain", "google.com".to_string()));
            params.push(("search_type", "shopping".to_string()));
        }
    }
    params
}

/// Adapts a parsed response into provisional records for `keyword`.
pub(crate) fn adapt_response(
    response: ValueSerpResponse,
    mode: SearchMode,
    keyword: &str,
    scrape_date: DateTime<Utc>,
) -> Vec<ProvisionalRecord> {
    let (items, filters_raw) = match mode {
        SearchMode::PopularProducts => (response.popular_products, String::new()),
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
    item: ValueSerpItem,
    mode: SearchMode,
    keyword: &str,
    filters_raw: &str,
    scrape_date: DateTime<Utc>,
) -> ProvisionalRecord {
    let link = item
        .link
        .or(item.product_link)
        .or(item.url)
        .or(item.shopping_link)
        .unwrap_or_default();

    let mut product_id = extract_product_id_from_link(&link).unwrap_or_default();
    if product_id.is_empty() {
        if let Some(id) = &item.id {
            product_id = scalar_to_string(id);
        }
    }

    let rating = try_f64(item.rating.as_ref());

    // Popular products default missing review counts to zero; the shopping
    // tab leaves them null.
    let reviews = match mode {
        SearchMode::PopularProducts => Some(coerce_reviews(item.reviews.as_ref()).unwrap_or(0)),
        SearchMode::ShoppingTab => coerce_reviews(item.reviews.as_ref()),
    };

    let (price, price_raw) = adapt_price(item.price.as_ref(), item.regular_price.as_ref());

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
        merchant: item.merchant.unwrap_or_default(),
        is_carousel: false,
        carousel_position: None,
        filters_raw: filters_raw.to_string(),
        provider: Provider::ValueSerp,
    }
}

/// Resolves the flat `price` field, falling back to `regular_price`.
///
/// `price_raw` always ends up a string (possibly empty) regardless of whether
/// the numeric parse succeeded.
fn adapt_price(
    price: Option<&Value>,
    regular_price: Option<&ValueSerpRegularPrice>,
) -> (Option<f64>, String) {
    if let Some(value) = price {
        let parsed = try_f64(Some(value));
        return (parsed, scalar_to_string(value));
    }

    if let Some(regular) = regular_price {
        let symbol = regular.symbol.as_deref().unwrap_or_default();
        if let Some(parsed) = try_f64(regular.value.as_ref()) {
            let text = regular
                .value
                .as_ref()
                .map(scalar_to_string)
                .unwrap_or_default();
            return (Some(parsed), format!("{symbol}{text}"));
        }
        return (None, symbol.to_string());
    }

    (None, String::new())
}

/// Flattens filter groups into the `"name - value, ..."` wire format.
pub(crate) fn build_filters_raw(groups: &[ValueSerpFilterGroup]) -> String {
    let mut entries = Vec::new();
    for group in groups {
        let Some(group_name) = group.name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        for value in &group.values {
            let value_name = match value {
                ValueSerpFilterValue::Named { name } => name.as_deref().unwrap_or_default(),
                ValueSerpFilterValue::Text(text) => text.as_str(),
            };
            if !value_name.is_empty() {
                entries.push(format!("{group_name} - {value_name}"));
            }
        }
    }
    entries.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> ValueSerpResponse {
        serde_json::from_value(body).expect("test body should deserialize")
    }

    #[test]
    fn adapts_popular_products_with_link_aliases() {
        let response = parse(json!({
            "popular_products": [
                {
                    "position": 1,
                    "title": "Runner 2000",
                    "product_link": "https://www.google.com.au/shopping/product/111222333",
                    "rating": "4.5",
                    "reviews": "380",
                    "price": 129.95,
                    "merchant": "Shoe Barn"
                }
            ]
        }));

        let records =
            adapt_response(response, SearchMode::PopularProducts, "shoes", Utc::now());
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.keyword, "shoes");
        assert_eq!(rec.product_id, "111222333");
        assert_eq!(rec.rating, Some(4.5));
        assert_eq!(rec.reviews, Some(380));
        assert_eq!(rec.price, Some(129.95));
        assert_eq!(rec.price_raw, "129.95");
        assert_eq!(rec.merchant, "Shoe Barn");
        assert_eq!(rec.provider, Provider::ValueSerp);
        assert!(rec.filters_raw.is_empty());
    }

    #[test]
    fn missing_fields_degrade_to_defaults_not_errors() {
        let response = parse(json!({"popular_products": [{}]}));
        let records =
            adapt_response(response, SearchMode::PopularProducts, "shoes", Utc::now());
        let rec = &records[0];
        assert_eq!(rec.position, None);
        assert_eq!(rec.product_id, "");
        assert_eq!(rec.title, "");
        assert_eq!(rec.link, "");
        assert_eq!(rec.rating, None);
        assert_eq!(rec.reviews, Some(0), "popular mode defaults reviews to 0");
        assert_eq!(rec.price, None);
        assert_eq!(rec.price_raw, "");
    }

    #[test]
    fn non_numeric_price_keeps_raw_text_only() {
        let response = parse(json!({
            "popular_products": [{"price": "N/A"}]
        }));
        let records =
            adapt_response(response, SearchMode::PopularProducts, "shoes", Utc::now());
        assert_eq!(records[0].price, None);
        assert_eq!(records[0].price_raw, "N/A");
    }

    #[test]
    fn regular_price_fallback_builds_symbol_prefixed_raw() {
        let response = parse(json!({
            "popular_products": [
                {"regular_price": {"value": "89.99", "symbol": "$"}}
            ]
        }));
        let records =
            adapt_response(response, SearchMode::PopularProducts, "shoes", Utc::now());
        assert_eq!(records[0].price, Some(89.99));
        assert_eq!(records[0].price_raw, "$89.99");
    }

    #[test]
    fn provider_id_field_is_fallback_for_unparseable_links() {
        let response = parse(json!({
            "popular_products": [
                {"link": "https://shop.example.com/item/blue-shoe", "id": 12345}
            ]
        }));
        let records =
            adapt_response(response, SearchMode::PopularProducts, "shoes", Utc::now());
        assert_eq!(records[0].product_id, "12345");
    }

    #[test]
    fn shopping_tab_attaches_filters_to_every_record() {
        let response = parse(json!({
            "shopping_results": [
                {"position": 1, "title": "A"},
                {"position": 2, "title": "B"}
            ],
            "filters": [
                {"name": "Brand", "values": [{"name": "Nike"}, {"name": "Asics"}]},
                {"name": "Colour", "values": ["Black"]},
                {"values": [{"name": "orphaned"}]}
            ]
        }));

        let records = adapt_response(response, SearchMode::ShoppingTab, "shoes", Utc::now());
        assert_eq!(records.len(), 2);
        for rec in &records {
            assert_eq!(
                rec.filters_raw,
                "Brand - Nike, Brand - Asics, Colour - Black"
            );
            assert_eq!(rec.reviews, None, "shopping mode leaves reviews null");
        }
    }
}
