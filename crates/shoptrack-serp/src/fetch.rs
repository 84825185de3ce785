//! Keyword fetcher with an ordered provider fallback chain.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use shoptrack_core::AppConfig;

use crate::error::SerpError;
use crate::providers::{serpapi, valueserp};
use crate::retry::retry_with_backoff;
use crate::types::{FetchOutcome, Provider, ProvisionalRecord, SearchMode};

const USER_AGENT: &str = "shoptrack/0.1 (campaign-shopping-intelligence)";

/// One provider in the fallback chain: which vendor, its key, and where to
/// send requests (overridable so tests can point at a mock server).
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub provider: Provider,
    pub api_key: String,
    pub base_url: String,
}

/// Fetches product listings for single keywords, walking the provider chain
/// in order until one yields usable results.
///
/// Every provider call — success or failure — is followed by the configured
/// inter-request delay so each worker paces its own requests independently.
pub struct KeywordFetcher {
    http: Client,
    chain: Vec<ProviderEndpoint>,
    top_n: usize,
    location: String,
    delay_ms: u64,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl KeywordFetcher {
    /// Builds the fetcher from application config: ValueSERP primary, SerpApi
    /// appended to the chain when its key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SerpError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, SerpError> {
        let mut chain = vec![ProviderEndpoint {
            provider: Provider::ValueSerp,
            api_key: config.valueserp_api_key.clone(),
            base_url: valueserp::BASE_URL.to_string(),
        }];
        if let Some(key) = &config.serpapi_api_key {
            chain.push(ProviderEndpoint {
                provider: Provider::SerpApi,
                api_key: key.clone(),
                base_url: serpapi::BASE_URL.to_string(),
            });
        }
        Self::with_endpoints(
            chain,
            config.request_timeout_secs,
            config.top_n,
            &config.location,
            config.rate_limit_delay_ms,
            config.max_retries,
            config.retry_backoff_base_ms,
        )
    }

    /// Builds a fetcher with an explicit chain (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SerpError::NoProviders`] if `chain` is empty, or
    /// [`SerpError::Http`] if the HTTP client cannot be constructed.
    pub fn with_endpoints(
        chain: Vec<ProviderEndpoint>,
        timeout_secs: u64,
        top_n: usize,
        location: &str,
        delay_ms: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, SerpError> {
        if chain.is_empty() {
            return Err(SerpError::NoProviders);
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            chain,
            top_n,
            location: location.to_string(),
            delay_ms,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Runs one keyword through the fallback chain for the given mode.
    ///
    /// A provider that errors (after retries) or returns zero items falls
    /// through to the next one. Provider errors are absorbed into the
    /// outcome, never raised — an all-empty, all-quiet chain means the
    /// keyword legitimately has no results.
    pub async fn fetch(&self, keyword: &str, mode: SearchMode) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        for endpoint in &self.chain {
            let result = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                self.search_provider(endpoint, keyword, mode)
            })
            .await;

            // Per-call pacing, applied even on failure.
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }

            match result {
                Ok(records) if !records.is_empty() => {
                    outcome.records = rank_and_truncate(records, self.top_n);
                    tracing::debug!(
                        keyword,
                        mode = %mode,
                        provider = %endpoint.provider,
                        count = outcome.records.len(),
                        "keyword fetched"
                    );
                    return outcome;
                }
                Ok(_) => {
                    tracing::debug!(
                        keyword,
                        mode = %mode,
                        provider = %endpoint.provider,
                        "provider returned no items — trying next in chain"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        keyword,
                        mode = %mode,
                        provider = %endpoint.provider,
                        error = %e,
                        "provider request failed — trying next in chain"
                    );
                    outcome
                        .provider_errors
                        .push(format!("{} {mode} '{keyword}': {e}", endpoint.provider));
                }
            }
        }

        outcome
    }

    /// One provider call: build the URL, issue the GET, map status codes to
    /// typed errors, and adapt the body through the provider's module.
    async fn search_provider(
        &self,
        endpoint: &ProviderEndpoint,
        keyword: &str,
        mode: SearchMode,
    ) -> Result<Vec<ProvisionalRecord>, SerpError> {
        let params = match endpoint.provider {
            Provider::ValueSerp => {
                valueserp::query_params(mode, &endpoint.api_key, keyword, &self.location)
            }
            Provider::SerpApi => {
                serpapi::query_params(mode, &endpoint.api_key, keyword, &self.location)
            }
        };

        let url =
            Url::parse_with_params(&endpoint.base_url, &params).map_err(|e| {
                SerpError::InvalidUrl {
                    url: endpoint.base_url.clone(),
                    reason: e.to_string(),
                }
            })?;

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SerpError::RateLimited {
                provider: endpoint.provider,
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(SerpError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let scrape_date = Utc::now();

        match endpoint.provider {
            Provider::ValueSerp => {
                let parsed: valueserp::ValueSerpResponse =
                    serde_json::from_str(&body).map_err(|e| SerpError::Deserialize {
                        context: format!("valueserp {mode} '{keyword}'"),
                        source: e,
                    })?;
                Ok(valueserp::adapt_response(parsed, mode, keyword, scrape_date))
            }
            Provider::SerpApi => {
                let parsed: serpapi::SerpApiResponse =
                    serde_json::from_str(&body).map_err(|e| SerpError::Deserialize {
                        context: format!("serpapi {mode} '{keyword}'"),
                        source: e,
                    })?;
                Ok(serpapi::adapt_response(parsed, mode, keyword, scrape_date))
            }
        }
    }
}

/// Orders records by the provider's position field when any item carries
/// one (response order otherwise, via stable sort), then truncates to
/// `top_n`.
fn rank_and_truncate(
    mut records: Vec<ProvisionalRecord>,
    top_n: usize,
) -> Vec<ProvisionalRecord> {
    if records.iter().any(|r| r.position.is_some()) {
        records.sort_by_key(|r| r.position.unwrap_or(i32::MAX));
    }
    records.truncate(top_n);
    records
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
