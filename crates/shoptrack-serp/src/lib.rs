pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod parse;
pub mod providers;
mod retry;
pub mod types;

pub use dispatch::{scrape_for_keywords, DispatchOutcome};
pub use error::SerpError;
pub use fetch::{KeywordFetcher, ProviderEndpoint};
pub use normalize::clean;
pub use types::{FetchOutcome, Provider, ProvisionalRecord, SearchMode};
