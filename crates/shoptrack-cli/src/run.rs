//! Pipeline orchestration: campaign loop, per-mode scrape + load, run
//! summary, Slack notification.
//!
//! Failure isolation works at the campaign boundary. A campaign that blows
//! up (keyword read, provider setup, bulk load) lands in the run summary's
//! error list and the loop moves on; the command itself fails only when no
//! campaign completed at all.

use sqlx::PgPool;

use shoptrack_core::{AppConfig, CampaignSummary, RunSummary};
use shoptrack_db::CampaignRow;
use shoptrack_notify::SlackNotifier;
use shoptrack_serp::{clean, scrape_for_keywords, KeywordFetcher, SearchMode};

/// Runs the full scrape pipeline.
///
/// With `campaign_filter` set, only that campaign runs (it must still be
/// opted in). `parallel` toggles the keyword worker pool.
///
/// Every failure past notifier construction lands in the run summary,
/// and the summary is finalized and posted even when the run dies before
/// its first campaign.
pub async fn run_pipeline(
    pool: &PgPool,
    config: &AppConfig,
    campaign_filter: Option<i64>,
    parallel: bool,
) -> anyhow::Result<()> {
    let notifier = SlackNotifier::from_config(config)?;
    if notifier.is_none() {
        tracing::warn!("no Slack bot token configured, run summary will not be posted");
    }
    let mut summary = RunSummary::begin();

    let fetcher = match KeywordFetcher::new(config) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            return critical_failure(
                &mut summary,
                notifier.as_ref(),
                "building provider chain",
                e.into(),
            )
            .await;
        }
    };

    let mut campaigns = match shoptrack_db::list_active_campaigns(pool).await {
        Ok(campaigns) => campaigns,
        Err(e) => {
            return critical_failure(
                &mut summary,
                notifier.as_ref(),
                "listing campaigns",
                e.into(),
            )
            .await;
        }
    };
    if let Some(id) = campaign_filter {
        campaigns.retain(|c| c.campaign_id == id);
        if campaigns.is_empty() {
            return critical_failure(
                &mut summary,
                notifier.as_ref(),
                "selecting campaign",
                anyhow::anyhow!("campaign {id} not found or not opted in to scraping"),
            )
            .await;
        }
    }
    tracing::info!(campaigns = campaigns.len(), "starting scrape run");

    let campaign_count = campaigns.len();

    for campaign in &campaigns {
        match process_campaign(pool, config, &fetcher, campaign, parallel, &mut summary).await {
            Ok(campaign_summary) => summary.campaigns.push(campaign_summary),
            Err(e) => {
                tracing::error!(
                    campaign_id = campaign.campaign_id,
                    domain = campaign.display_name(),
                    error = %e,
                    "campaign failed"
                );
                if let Some(notifier) = &notifier {
                    if let Err(alert_err) = notifier
                        .send_error_alert(campaign.display_name(), &format!("{e:#}"))
                        .await
                    {
                        tracing::warn!(error = %alert_err, "failed to post error alert to Slack");
                    }
                }
                summary.record_error(format!(
                    "campaign {} ({}): {e:#}",
                    campaign.campaign_id,
                    campaign.display_name()
                ));
            }
        }
    }

    finalize_and_notify(&mut summary, notifier.as_ref()).await;
    println!(
        "run finished: {}/{campaign_count} campaigns, {} products, {} errors in {:.0}s",
        summary.campaigns.len(),
        summary.total_popular_products() + summary.total_shopping_products(),
        summary.errors.len(),
        summary.duration_secs(),
    );

    if campaign_count > 0 && summary.campaigns.is_empty() {
        anyhow::bail!("all {campaign_count} campaigns failed");
    }
    Ok(())
}

/// Records a failure that stops the run before the campaign loop, then
/// finalizes and posts the summary so the error still reaches the
/// notification channel. Always returns `Err`.
async fn critical_failure(
    summary: &mut RunSummary,
    notifier: Option<&SlackNotifier>,
    context: &str,
    error: anyhow::Error,
) -> anyhow::Result<()> {
    tracing::error!(error = %error, "{context} failed, aborting run");
    summary.record_error(format!("{context}: {error:#}"));
    finalize_and_notify(summary, notifier).await;
    Err(error)
}

/// Stamps the end time, logs the totals, and posts the summary.
/// Best-effort delivery: a Slack outage never fails the run.
async fn finalize_and_notify(summary: &mut RunSummary, notifier: Option<&SlackNotifier>) {
    summary.finish();
    tracing::info!(
        campaigns = summary.campaigns.len(),
        keywords = summary.total_keywords(),
        popular_products = summary.total_popular_products(),
        shopping_products = summary.total_shopping_products(),
        errors = summary.errors.len(),
        duration_secs = summary.duration_secs(),
        "scrape run finished"
    );
    if let Some(notifier) = notifier {
        if let Err(e) = notifier.send_run_summary(summary).await {
            tracing::warn!(error = %e, "failed to post run summary to Slack");
        }
    }
}

/// Scrapes and loads one campaign: popular products always, the shopping
/// tab unless disabled. Provider errors degrade to summary entries;
/// database errors abort the campaign.
async fn process_campaign(
    pool: &PgPool,
    config: &AppConfig,
    fetcher: &KeywordFetcher,
    campaign: &CampaignRow,
    parallel: bool,
    summary: &mut RunSummary,
) -> anyhow::Result<CampaignSummary> {
    let keywords = shoptrack_db::keywords_for_campaign(pool, campaign.campaign_id).await?;
    let mut campaign_summary = CampaignSummary {
        campaign_id: campaign.campaign_id,
        domain: campaign.display_name().to_string(),
        keyword_count: keywords.len(),
        ..CampaignSummary::default()
    };
    if keywords.is_empty() {
        tracing::warn!(
            campaign_id = campaign.campaign_id,
            domain = campaign.display_name(),
            "campaign has no keywords, skipping"
        );
        return Ok(campaign_summary);
    }

    tracing::info!(
        campaign_id = campaign.campaign_id,
        domain = campaign.display_name(),
        keywords = keywords.len(),
        "processing campaign"
    );

    let popular = scrape_for_keywords(
        fetcher,
        &keywords,
        SearchMode::PopularProducts,
        parallel,
        config.worker_count,
    )
    .await;
    for error in popular.errors {
        summary.record_error(error);
    }
    campaign_summary.keywords_with_no_popular = popular.keywords_with_no_results;

    let rows = clean(popular.records);
    let stats = shoptrack_db::upload_scrape_data(
        pool,
        campaign.campaign_id,
        SearchMode::PopularProducts.scrape_type_id(),
        &rows,
    )
    .await?;
    campaign_summary.popular_products_found = stats.scrape_rows;

    if config.skip_shopping_tab {
        return Ok(campaign_summary);
    }

    let shopping = scrape_for_keywords(
        fetcher,
        &keywords,
        SearchMode::ShoppingTab,
        parallel,
        config.worker_count,
    )
    .await;
    for error in shopping.errors {
        summary.record_error(error);
    }

    let rows = clean(shopping.records);
    let stats = shoptrack_db::upload_scrape_data(
        pool,
        campaign.campaign_id,
        SearchMode::ShoppingTab.scrape_type_id(),
        &rows,
    )
    .await?;
    campaign_summary.shopping_products_found = stats.scrape_rows;
    tracing::info!(
        campaign_id = campaign.campaign_id,
        filter_rows = stats.filter_rows,
        "shopping tab loaded"
    );

    Ok(campaign_summary)
}

/// Prints opted-in campaigns with their keyword counts.
pub async fn list_campaigns(pool: &PgPool) -> anyhow::Result<()> {
    let campaigns = shoptrack_db::list_active_campaigns(pool).await?;
    if campaigns.is_empty() {
        println!("no campaigns are opted in to scraping");
        return Ok(());
    }
    for campaign in campaigns {
        let keywords = shoptrack_db::keywords_for_campaign(pool, campaign.campaign_id).await?;
        println!(
            "{:>8}  {:<40} {} keywords",
            campaign.campaign_id,
            campaign.display_name(),
            keywords.len()
        );
    }
    Ok(())
}
