#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    /// Primary search provider key. Required — the pipeline cannot run
    /// without at least the primary provider.
    pub valueserp_api_key: String,
    /// Secondary provider key. When absent the fallback chain has a single
    /// entry and exhausting it means "no results for this keyword".
    pub serpapi_api_key: Option<String>,
    pub worker_count: usize,
    pub rate_limit_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub top_n: usize,
    pub location: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Skip the shopping-tab query mode entirely (popular products still run).
    pub skip_shopping_tab: bool,
    pub slack_bot_token: Option<String>,
    pub slack_channel: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("valueserp_api_key", &"[redacted]")
            .field(
                "serpapi_api_key",
                &self.serpapi_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("worker_count", &self.worker_count)
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("top_n", &self.top_n)
            .field("location", &self.location)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("skip_shopping_tab", &self.skip_shopping_tab)
            .field(
                "slack_bot_token",
                &self.slack_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("slack_channel", &self.slack_channel)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
