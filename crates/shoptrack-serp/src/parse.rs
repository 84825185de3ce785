//! Text extraction helpers shared by the provider adapters.

use std::sync::OnceLock;

use regex::Regex;

fn product_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/shopping/product/(\d+)").expect("product id pattern is valid")
    })
}

/// Recovers a product identifier from a shopping-result URL.
///
/// Matches the canonical `/shopping/product/<digits>` path first; failing
/// that, the last path segment is used only if it is purely numeric.
/// Example: `https://www.google.com.au/shopping/product/16052668069645325775`
/// yields `"16052668069645325775"`.
#[must_use]
pub fn extract_product_id_from_link(link: &str) -> Option<String> {
    if link.is_empty() {
        return None;
    }

    if let Some(captures) = product_id_pattern().captures(link) {
        return Some(captures[1].to_string());
    }

    let last = link.trim_end_matches('/').rsplit('/').next()?;
    if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) {
        return Some(last.to_string());
    }

    None
}

/// Parses a price out of free text like `"$39.99"` or `"AUD 1,299.00"`.
///
/// Skips to the first digit, takes the longest run of digits, dots, and
/// thousands separators, then parses with separators removed. Text without
/// any digits (e.g. `"Free shipping"`) yields `None`.
#[must_use]
pub fn parse_price_text(raw: &str) -> Option<f64> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let tail = &raw[start..];
    let end = tail
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
        .unwrap_or(tail.len());

    let cleaned: String = tail[..end].chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
