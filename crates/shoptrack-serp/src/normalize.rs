//! Batch normalizer: provisional provider records to canonical rows.
//!
//! [`clean`] is pure over the whole batch and must never panic on odd
//! provider data. Anything the adapters could not settle is settled here:
//! missing positions become 0, non-finite numerics become null, and
//! `has_product_page` is derived from the link.

use shoptrack_core::ProductRecord;

use crate::types::ProvisionalRecord;

/// Normalizes a batch of provisional records into canonical rows.
///
/// Per row:
/// - `position` defaults to 0 and is clamped to be non-negative
/// - `rating`, `price` drop non-finite values (NaN, infinities)
/// - `reviews` drops negative counts
/// - `has_product_page` is true iff the row carries a non-empty link
///
/// The provider tag is consumed here; downstream storage does not
/// distinguish which provider a row came from.
#[must_use]
pub fn clean(raw: Vec<ProvisionalRecord>) -> Vec<ProductRecord> {
    raw.into_iter().map(clean_one).collect()
}

fn clean_one(raw: ProvisionalRecord) -> ProductRecord {
    let has_product_page = !raw.link.is_empty();
    ProductRecord {
        scrape_date: raw.scrape_date,
        keyword: raw.keyword,
        position: raw.position.unwrap_or(0).max(0),
        product_id: raw.product_id,
        title: raw.title,
        link: raw.link,
        rating: raw.rating.filter(|v| v.is_finite()),
        reviews: raw.reviews.filter(|v| *v >= 0),
        price: raw.price.filter(|v| v.is_finite()),
        price_raw: raw.price_raw,
        merchant: raw.merchant,
        is_carousel: raw.is_carousel,
        carousel_position: raw.carousel_position,
        has_product_page,
        filters_raw: raw.filters_raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::types::Provider;

    fn raw() -> ProvisionalRecord {
        ProvisionalRecord {
            scrape_date: Utc::now(),
            keyword: "shoes".to_string(),
            position: Some(3),
            product_id: "111".to_string(),
            title: "Runner".to_string(),
            link: "https://www.google.com/shopping/product/111".to_string(),
            rating: Some(4.5),
            reviews: Some(120),
            price: Some(99.95),
            price_raw: "$99.95".to_string(),
            merchant: "Shoe Barn".to_string(),
            is_carousel: false,
            carousel_position: None,
            filters_raw: "Brand - Nike".to_string(),
            provider: Provider::ValueSerp,
        }
    }

    #[test]
    fn carries_fields_through_unchanged() {
        let rows = clean(vec![raw()]);
        let row = &rows[0];
        assert_eq!(row.keyword, "shoes");
        assert_eq!(row.position, 3);
        assert_eq!(row.product_id, "111");
        assert_eq!(row.rating, Some(4.5));
        assert_eq!(row.reviews, Some(120));
        assert_eq!(row.price, Some(99.95));
        assert_eq!(row.filters_raw, "Brand - Nike");
        assert!(row.has_product_page);
    }

    #[test]
    fn missing_position_defaults_to_zero_and_negatives_clamp() {
        let mut a = raw();
        a.position = None;
        let mut b = raw();
        b.position = Some(-2);
        let rows = clean(vec![a, b]);
        assert_eq!(rows[0].position, 0);
        assert_eq!(rows[1].position, 0);
    }

    #[test]
    fn non_finite_numerics_become_null() {
        let mut r = raw();
        r.rating = Some(f64::NAN);
        r.price = Some(f64::INFINITY);
        r.reviews = Some(-5);
        let rows = clean(vec![r]);
        assert_eq!(rows[0].rating, None);
        assert_eq!(rows[0].price, None);
        assert_eq!(rows[0].reviews, None);
    }

    #[test]
    fn empty_link_means_no_product_page() {
        let mut r = raw();
        r.link = String::new();
        let rows = clean(vec![r]);
        assert!(!rows[0].has_product_page);
        assert_eq!(rows[0].link, "");
    }

    #[test]
    fn empty_batch_is_fine() {
        assert!(clean(Vec::new()).is_empty());
    }
}
