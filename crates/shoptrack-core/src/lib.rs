pub mod app_config;
pub mod coerce;
pub mod config;
pub mod record;
pub mod summary;

pub use app_config::AppConfig;
pub use coerce::{parse_compact_count, try_f64, try_i64};
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{parse_filters_raw, serialize_filters, FilterFacet, ProductRecord};
pub use summary::{CampaignSummary, RunSummary};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
