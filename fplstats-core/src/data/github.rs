//! GitHub mirror of the season's player files.
//!
//! Lists `data/{season}/players` through the contents API and downloads each
//! player's `gw.csv` from the raw host.

use super::http::HttpClient;
use super::parse::parse_weekly_csv;
use super::provider::{DataError, EntitySource};
use crate::domain::{EntityFile, WeeklyTable};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the season's data lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub season: String,
    pub repository: String,
    pub branch: String,
    pub api_base: String,
    pub raw_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Players fetched at once. 1 fetches sequentially.
    pub concurrency: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            season: "2022-23".into(),
            repository: "vaastav/Fantasy-Premier-League".into(),
            branch: "master".into(),
            api_base: "https://api.github.com".into(),
            raw_base: "https://raw.githubusercontent.com".into(),
            user_agent: concat!("fplstats/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 30,
            max_retries: 2,
            retry_base_delay_ms: 500,
            concurrency: 1,
        }
    }
}

impl SourceSettings {
    /// Contents API URL of the players directory.
    pub fn listing_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/data/{}/players",
            self.api_base.trim_end_matches('/'),
            self.repository,
            self.season
        )
    }

    /// Raw-host URL of the players directory.
    pub fn players_base_url(&self) -> String {
        format!(
            "{}/{}/{}/data/{}/players",
            self.raw_base.trim_end_matches('/'),
            self.repository,
            self.branch,
            self.season
        )
    }

    pub fn http_client(&self) -> Result<HttpClient, DataError> {
        HttpClient::new(
            &self.user_agent,
            Duration::from_secs(self.timeout_secs),
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

/// One entry of a contents API directory listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
}

/// Decode a contents API listing into entities, preserving order.
pub fn parse_listing(json: &str) -> Result<Vec<EntityFile>, DataError> {
    let entries: Vec<ContentEntry> =
        serde_json::from_str(json).map_err(|e| DataError::parse("directory listing", e))?;
    Ok(entries.into_iter().map(|e| EntityFile::new(e.name)).collect())
}

/// The production source.
pub struct GithubSource {
    http: HttpClient,
    listing_url: String,
    players_base: Url,
}

impl GithubSource {
    pub fn new(settings: &SourceSettings) -> Result<Self, DataError> {
        let players_base = Url::parse(&settings.players_base_url())
            .map_err(|e| DataError::InvalidUrl(format!("{}: {e}", settings.players_base_url())))?;
        Ok(Self {
            http: settings.http_client()?,
            listing_url: settings.listing_url(),
            players_base,
        })
    }

    /// `{players_base}/{name}/gw.csv`, with the name percent-encoded as one path segment.
    pub fn entity_url(&self, entity: &EntityFile) -> Result<Url, DataError> {
        entity_url(&self.players_base, entity)
    }
}

fn entity_url(base: &Url, entity: &EntityFile) -> Result<Url, DataError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DataError::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .push(&entity.name)
        .push("gw.csv");
    Ok(url)
}

impl EntitySource for GithubSource {
    fn name(&self) -> &str {
        "github"
    }

    fn list_entities(&self) -> Result<Vec<EntityFile>, DataError> {
        tracing::info!(url = %self.listing_url, "listing player directories");
        let body = self.http.get_text(&self.listing_url)?;
        parse_listing(&body)
    }

    fn fetch_entity(&self, entity: &EntityFile) -> Result<WeeklyTable, DataError> {
        let url = self.entity_url(entity)?;
        tracing::debug!(%url, "fetching gameweek file");
        let body = self.http.get_text(url.as_str())?;
        parse_weekly_csv(entity.clone(), &body)
    }

    fn is_available(&self) -> bool {
        !self.http.is_rate_limited()
    }
}
