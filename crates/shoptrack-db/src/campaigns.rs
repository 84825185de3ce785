//! Read-side queries for the `campaigns` and `shopping_scrape_keywords`
//! tables.

use sqlx::PgPool;

use crate::DbError;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub campaign_id: i64,
    pub domain_name: Option<String>,
    pub scrape_value: bool,
}

impl CampaignRow {
    /// Display name for logs and the run summary.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.domain_name.as_deref().unwrap_or("(unnamed)")
    }
}

/// Returns all campaigns opted in to scraping, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_campaigns(pool: &PgPool) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(
        "SELECT campaign_id, domain_name, scrape_value \
         FROM campaigns \
         WHERE scrape_value = TRUE \
         ORDER BY campaign_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the keyword list for one campaign, ordered by insertion.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn keywords_for_campaign(
    pool: &PgPool,
    campaign_id: i64,
) -> Result<Vec<String>, DbError> {
    let keywords = sqlx::query_scalar::<_, String>(
        "SELECT keyword \
         FROM shopping_scrape_keywords \
         WHERE campaign_id = $1 \
         ORDER BY id",
    )
    .bind(campaign_id)
    .fetch_all(pool)
    .await?;

    Ok(keywords)
}
