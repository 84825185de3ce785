//! Transactional bulk loader for `scrape_data` and `scrape_data_filter`.
//!
//! The load is two-stage inside one transaction: parent rows go in as a
//! single `INSERT ... SELECT FROM UNNEST(...) RETURNING id`, then filter
//! facets are expanded against the returned ids and inserted the same way.
//! Postgres returns ids in insertion order for this statement shape, which
//! is what lets index `i` of the id list correlate with row `i` of the
//! batch. If the id count ever disagrees with the submitted row count that
//! correlation is void, so the whole transaction rolls back.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shoptrack_core::{parse_filters_raw, ProductRecord};

use crate::DbError;

/// What one bulk load wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertStats {
    pub scrape_rows: usize,
    pub filter_rows: usize,
}

/// Column-major arrays for the parent insert, with the null-bridging rules
/// already applied.
#[derive(Debug, Default)]
struct InsertArrays {
    scrape_date: Vec<DateTime<Utc>>,
    keyword: Vec<String>,
    position: Vec<i32>,
    product_id: Vec<Option<String>>,
    title: Vec<String>,
    link: Vec<Option<String>>,
    rating: Vec<Option<f64>>,
    reviews: Vec<Option<i64>>,
    price: Vec<Option<f64>>,
    price_raw: Vec<String>,
    merchant: Vec<String>,
    is_carousel: Vec<bool>,
    carousel_position: Vec<Option<i32>>,
    has_product_page: Vec<bool>,
}

/// Bridges in-memory records to column arrays.
///
/// - empty-string `product_id` and `link` become NULL
/// - non-finite `rating`/`price` become NULL
/// - `title`/`merchant`/`price_raw` pass through, empty stays ""
fn build_insert_arrays(rows: &[ProductRecord]) -> InsertArrays {
    let mut arrays = InsertArrays::default();
    for row in rows {
        arrays.scrape_date.push(row.scrape_date);
        arrays.keyword.push(row.keyword.clone());
        arrays.position.push(row.position);
        arrays.product_id.push(none_if_empty(&row.product_id));
        arrays.title.push(row.title.clone());
        arrays.link.push(none_if_empty(&row.link));
        arrays.rating.push(row.rating.filter(|v| v.is_finite()));
        arrays.reviews.push(row.reviews);
        arrays.price.push(row.price.filter(|v| v.is_finite()));
        arrays.price_raw.push(row.price_raw.clone());
        arrays.merchant.push(row.merchant.clone());
        arrays.is_carousel.push(row.is_carousel);
        arrays.carousel_position.push(row.carousel_position);
        arrays.has_product_page.push(row.has_product_page);
    }
    arrays
}

/// Checks the positional correlation the facet insert depends on: one
/// returned id per submitted row.
fn verify_id_correlation(rows: &[ProductRecord], ids: &[i64]) -> Result<(), DbError> {
    if ids.len() == rows.len() {
        return Ok(());
    }
    Err(DbError::InsertCountMismatch {
        expected: rows.len(),
        got: ids.len(),
        sample: batch_sample(rows),
    })
}

/// First few keywords of a batch, for count-mismatch diagnostics.
fn batch_sample(rows: &[ProductRecord]) -> String {
    rows.iter()
        .take(3)
        .map(|r| r.keyword.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn none_if_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Column-major arrays for the child insert, one entry per facet.
#[derive(Debug, Default)]
struct FacetArrays {
    scrape_data_id: Vec<i64>,
    category: Vec<String>,
    value: Vec<String>,
}

/// Expands each row's `filters_raw` against its returned parent id.
///
/// Callers must pass `ids` of the same length as `rows`.
fn build_facet_arrays(rows: &[ProductRecord], ids: &[i64]) -> FacetArrays {
    let mut arrays = FacetArrays::default();
    for (row, id) in rows.iter().zip(ids) {
        for facet in parse_filters_raw(&row.filters_raw) {
            arrays.scrape_data_id.push(*id);
            arrays.category.push(facet.category);
            arrays.value.push(facet.value);
        }
    }
    arrays
}

/// Bulk-loads one campaign batch into `scrape_data` and
/// `scrape_data_filter`, all inside one transaction.
///
/// An empty batch is a no-op that writes nothing.
///
/// # Errors
///
/// Returns [`DbError::InsertCountMismatch`] when the parent insert returns
/// a different number of ids than rows submitted (the transaction is rolled
/// back), or [`DbError::Sqlx`] on any query failure.
pub async fn upload_scrape_data(
    pool: &PgPool,
    campaign_id: i64,
    scrape_type_id: i16,
    rows: &[ProductRecord],
) -> Result<InsertStats, DbError> {
    if rows.is_empty() {
        return Ok(InsertStats {
            scrape_rows: 0,
            filter_rows: 0,
        });
    }

    let arrays = build_insert_arrays(rows);
    let mut tx = pool.begin().await?;

    let ids: Vec<i64> = sqlx::query_scalar(
        "INSERT INTO scrape_data \
           (campaign_id, scrape_type_id, scrape_date, keyword, position, product_id, \
            title, link, rating, reviews, price, price_raw, merchant, is_carousel, \
            carousel_position, has_product_page) \
         SELECT $1, $2, * FROM UNNEST( \
            $3::timestamptz[], $4::text[], $5::int4[], $6::text[], $7::text[], \
            $8::text[], $9::float8[], $10::int8[], $11::float8[], $12::text[], \
            $13::text[], $14::bool[], $15::int4[], $16::bool[]) \
         RETURNING id",
    )
    .bind(campaign_id)
    .bind(scrape_type_id)
    .bind(&arrays.scrape_date)
    .bind(&arrays.keyword)
    .bind(&arrays.position)
    .bind(&arrays.product_id)
    .bind(&arrays.title)
    .bind(&arrays.link)
    .bind(&arrays.rating)
    .bind(&arrays.reviews)
    .bind(&arrays.price)
    .bind(&arrays.price_raw)
    .bind(&arrays.merchant)
    .bind(&arrays.is_carousel)
    .bind(&arrays.carousel_position)
    .bind(&arrays.has_product_page)
    .fetch_all(&mut *tx)
    .await?;

    if let Err(e) = verify_id_correlation(rows, &ids) {
        // Dropping tx rolls back, but make the intent explicit.
        tx.rollback().await?;
        return Err(e);
    }

    let facets = build_facet_arrays(rows, &ids);
    if !facets.scrape_data_id.is_empty() {
        sqlx::query(
            "INSERT INTO scrape_data_filter (scrape_data_id, filter_category, filter_value) \
             SELECT * FROM UNNEST($1::int8[], $2::text[], $3::text[])",
        )
        .bind(&facets.scrape_data_id)
        .bind(&facets.category)
        .bind(&facets.value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(InsertStats {
        scrape_rows: rows.len(),
        filter_rows: facets.scrape_data_id.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(keyword: &str, filters_raw: &str) -> ProductRecord {
        ProductRecord {
            scrape_date: Utc::now(),
            keyword: keyword.to_string(),
            position: 1,
            product_id: "12345".to_string(),
            title: "Runner".to_string(),
            link: "https://www.google.com/shopping/product/12345".to_string(),
            rating: Some(4.5),
            reviews: Some(200),
            price: Some(99.95),
            price_raw: "$99.95".to_string(),
            merchant: "Shoe Barn".to_string(),
            is_carousel: false,
            carousel_position: None,
            has_product_page: true,
            filters_raw: filters_raw.to_string(),
        }
    }

    #[test]
    fn empty_strings_bridge_to_null_for_id_and_link_only() {
        let mut r = record("shoes", "");
        r.product_id = String::new();
        r.link = String::new();
        r.title = String::new();
        r.merchant = String::new();
        r.price_raw = String::new();

        let arrays = build_insert_arrays(&[r]);
        assert_eq!(arrays.product_id, vec![None]);
        assert_eq!(arrays.link, vec![None]);
        assert_eq!(arrays.title, vec![String::new()]);
        assert_eq!(arrays.merchant, vec![String::new()]);
        assert_eq!(arrays.price_raw, vec![String::new()]);
    }

    #[test]
    fn non_finite_numerics_bridge_to_null() {
        let mut r = record("shoes", "");
        r.rating = Some(f64::NAN);
        r.price = Some(f64::NEG_INFINITY);

        let arrays = build_insert_arrays(&[r]);
        assert_eq!(arrays.rating, vec![None]);
        assert_eq!(arrays.price, vec![None]);
    }

    #[test]
    fn arrays_keep_row_order() {
        let rows = vec![record("a", ""), record("b", ""), record("c", "")];
        let arrays = build_insert_arrays(&rows);
        assert_eq!(arrays.keyword, vec!["a", "b", "c"]);
        assert_eq!(arrays.scrape_date.len(), 3);
    }

    #[test]
    fn facets_expand_per_parent_id() {
        let rows = vec![
            record("shoes", "Brand - Nike, Colour - Black"),
            record("shoes", ""),
            record("shoes", "Brand - Asics"),
        ];
        let ids = vec![10, 11, 12];

        let facets = build_facet_arrays(&rows, &ids);
        assert_eq!(facets.scrape_data_id, vec![10, 10, 12]);
        assert_eq!(facets.category, vec!["Brand", "Colour", "Brand"]);
        assert_eq!(facets.value, vec!["Nike", "Black", "Asics"]);
    }

    #[test]
    fn id_correlation_mismatch_raises_with_diagnostics() {
        let rows = vec![
            record("shoes", ""),
            record("jumper", ""),
            record("socks", ""),
            record("hats", ""),
        ];

        let err = verify_id_correlation(&rows, &[1, 2]).expect_err("short id list must fail");
        match err {
            DbError::InsertCountMismatch {
                expected,
                got,
                sample,
            } => {
                assert_eq!(expected, 4);
                assert_eq!(got, 2);
                assert_eq!(sample, "shoes, jumper, socks");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn id_correlation_passes_on_matching_counts() {
        let rows = vec![record("shoes", ""), record("jumper", "")];
        assert!(verify_id_correlation(&rows, &[7, 8]).is_ok());
    }

    #[test]
    fn rows_without_filters_produce_no_facets() {
        let rows = vec![record("shoes", ""), record("shoes", "malformed entry")];
        let facets = build_facet_arrays(&rows, &[1, 2]);
        assert!(facets.scrape_data_id.is_empty());
    }
}
