//! Load a whole CSV table from a local path or an HTTP(S) URL.

use super::http::HttpClient;
use super::parse::parse_table;
use super::provider::DataError;
use crate::domain::Table;

/// Resolves a location string to a parsed table.
pub trait TableLoader: Send + Sync {
    fn load(&self, location: &str) -> Result<Table, DataError>;
}

/// URLs go through the HTTP client, anything else is read from disk.
pub struct LocationLoader {
    http: HttpClient,
}

impl LocationLoader {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

impl TableLoader for LocationLoader {
    fn load(&self, location: &str) -> Result<Table, DataError> {
        let text = if is_remote(location) {
            self.http.get_text(location)?
        } else {
            std::fs::read_to_string(location).map_err(|e| DataError::Io {
                path: location.to_string(),
                reason: e.to_string(),
            })?
        };
        tracing::debug!(location, bytes = text.len(), "loaded table");
        parse_table(&text, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://raw.githubusercontent.com/x/y.csv"));
        assert!(is_remote("http://localhost/y.csv"));
        assert!(!is_remote("data/cleaned_players.csv"));
        assert!(!is_remote("/tmp/https.csv"));
    }
}
