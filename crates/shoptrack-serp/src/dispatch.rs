//! Concurrent keyword dispatch.
//!
//! Fans a keyword list out over the fetcher with a bounded worker pool and
//! merges the per-keyword outcomes into one [`DispatchOutcome`]. Keyword
//! order within the merged record list follows completion order when running
//! in parallel; callers that care about ordering sort downstream.

use futures::stream::{self, StreamExt};

use crate::fetch::KeywordFetcher;
use crate::types::{FetchOutcome, ProvisionalRecord, SearchMode};

/// Aggregated result of one keyword batch.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Records from every keyword that produced any, in completion order.
    pub records: Vec<ProvisionalRecord>,
    /// Keywords where every provider answered cleanly with zero items.
    pub keywords_with_no_results: Vec<String>,
    /// Provider error descriptions accumulated across the batch.
    pub errors: Vec<String>,
}

impl DispatchOutcome {
    fn absorb(&mut self, keyword: &str, fetched: FetchOutcome) {
        // A keyword counts as "no results" only when nothing came back AND
        // no provider errored; errors leave the question open.
        if fetched.records.is_empty() && fetched.provider_errors.is_empty() {
            self.keywords_with_no_results.push(keyword.to_string());
        }
        self.records.extend(fetched.records);
        self.errors.extend(fetched.provider_errors);
    }
}

/// Runs every keyword through `fetcher` for the given mode.
///
/// With `parallel` set, up to `worker_count` keywords are in flight at once;
/// otherwise keywords run strictly one after another. Each worker paces its
/// own provider calls, so the effective request rate scales with the pool
/// size.
pub async fn scrape_for_keywords(
    fetcher: &KeywordFetcher,
    keywords: &[String],
    mode: SearchMode,
    parallel: bool,
    worker_count: usize,
) -> DispatchOutcome {
    let workers = if parallel { worker_count.max(1) } else { 1 };

    tracing::info!(
        mode = %mode,
        keywords = keywords.len(),
        workers,
        "dispatching keyword batch"
    );

    let mut outcome = DispatchOutcome::default();
    let mut results = stream::iter(keywords.iter())
        .map(|keyword| async move { (keyword.as_str(), fetcher.fetch(keyword, mode).await) })
        .buffer_unordered(workers);

    while let Some((keyword, fetched)) = results.next().await {
        outcome.absorb(keyword, fetched);
    }

    tracing::info!(
        mode = %mode,
        records = outcome.records.len(),
        empty_keywords = outcome.keywords_with_no_results.len(),
        provider_errors = outcome.errors.len(),
        "keyword batch complete"
    );

    outcome
}
