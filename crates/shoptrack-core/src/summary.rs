//! Run-summary accumulation for the notification channel.
//!
//! The pipeline fills a [`RunSummary`] as campaigns complete; nothing here
//! talks to Slack — rendering lives in the notify crate.

use chrono::{DateTime, Utc};

/// Per-campaign result counts for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct CampaignSummary {
    pub campaign_id: i64,
    pub domain: String,
    pub keyword_count: usize,
    pub popular_products_found: usize,
    pub shopping_products_found: usize,
    /// Keywords for which every provider answered and found nothing.
    /// Provider errors are recorded separately in [`RunSummary::errors`].
    pub keywords_with_no_popular: Vec<String>,
}

/// Aggregated outcome of one full pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub campaigns: Vec<CampaignSummary>,
    pub errors: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn begin() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            campaigns: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Utc::now);
        let millis = (end - self.started_at).num_milliseconds();
        #[allow(clippy::cast_precision_loss)]
        {
            millis as f64 / 1000.0
        }
    }

    #[must_use]
    pub fn total_keywords(&self) -> usize {
        self.campaigns.iter().map(|c| c.keyword_count).sum()
    }

    #[must_use]
    pub fn total_popular_products(&self) -> usize {
        self.campaigns.iter().map(|c| c.popular_products_found).sum()
    }

    #[must_use]
    pub fn total_shopping_products(&self) -> usize {
        self.campaigns
            .iter()
            .map(|c| c.shopping_products_found)
            .sum()
    }

    #[must_use]
    pub fn total_keywords_without_popular(&self) -> usize {
        self.campaigns
            .iter()
            .map(|c| c.keywords_with_no_popular.len())
            .sum()
    }

    /// Share of keywords that produced at least one popular product, in
    /// percent. 100 when there were no keywords at all.
    #[must_use]
    pub fn popular_success_rate(&self) -> f64 {
        let total = self.total_keywords();
        if total == 0 {
            return 100.0;
        }
        let with_results = total - self.total_keywords_without_popular();
        #[allow(clippy::cast_precision_loss)]
        {
            with_results as f64 / total as f64 * 100.0
        }
    }
}
