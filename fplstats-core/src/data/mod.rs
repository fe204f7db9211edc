//! Remote player data: listing, fetching, parsing.

pub mod fetch;
pub mod github;
pub mod http;
pub mod loader;
pub mod parse;
pub mod provider;

pub use fetch::{fetch_all, FetchBatch, FetchOptions, FetchOutcome};
pub use github::{GithubSource, SourceSettings};
pub use http::{HttpClient, MAX_RETRIES};
pub use loader::{LocationLoader, TableLoader};
pub use parse::{parse_table, parse_weekly_csv};
pub use provider::{DataError, EntitySource, FetchProgress, NoProgress, StdoutProgress};
