//! Pipeline configuration, loaded from TOML.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults, which reproduce the published 2022-23 season run.

use std::path::{Path, PathBuf};

use fplstats_core::aggregate::{AggregateError, AggregationSpec, Preset};
use fplstats_core::data::{SourceSettings, MAX_RETRIES};
use fplstats_core::domain::PlayerLabel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<AggregateError> for ConfigError {
    fn from(e: AggregateError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Top-level configuration for `run` and `merge`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceSettings,
    pub aggregation: AggregationConfig,
    pub output: OutputConfig,
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub preset: Preset,
    /// How the `player` column is derived from the directory name.
    pub player_label: PlayerLabel,
}

/// Where artifacts land and which optional ones are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub csv_file: String,
    pub html_file: String,
    pub combined_html_file: String,
    pub parquet_file: String,
    pub write_combined: bool,
    pub write_parquet: bool,
    /// Column the HTML minimum filter applies to. Empty disables the filter.
    pub min_filter_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            csv_file: "filtered_player_data.csv".into(),
            html_file: "grouped_player_data_with_filter.html".into(),
            combined_html_file: "combined_player_data.html".into(),
            parquet_file: "filtered_player_data.parquet".into(),
            write_combined: false,
            write_parquet: false,
            min_filter_column: "minutes".into(),
        }
    }
}

impl OutputConfig {
    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(&self.csv_file)
    }

    pub fn html_path(&self) -> PathBuf {
        self.dir.join(&self.html_file)
    }

    pub fn combined_html_path(&self) -> PathBuf {
        self.dir.join(&self.combined_html_file)
    }

    pub fn parquet_path(&self) -> PathBuf {
        self.dir.join(&self.parquet_file)
    }

    pub fn min_filter(&self) -> Option<&str> {
        let col = self.min_filter_column.trim();
        (!col.is_empty()).then_some(col)
    }
}

/// Inputs and output of the reference merge. Locations are URLs or paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub filtered: String,
    pub reference: String,
    pub output: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            filtered: "https://raw.githubusercontent.com/pkgrem/FPLHistory/main/filtered_player_data.csv"
                .into(),
            reference: "https://raw.githubusercontent.com/vaastav/Fantasy-Premier-League/master/data/2022-23/cleaned_players.csv"
                .into(),
            output: PathBuf::from("merged_filtered_player_data.csv"),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn aggregation_spec(&self) -> AggregationSpec {
        self.aggregation.preset.spec()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.concurrency == 0 {
            return Err(ConfigError::Invalid("source.concurrency must be at least 1".into()));
        }
        if self.source.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "source.max_retries must be at most {MAX_RETRIES}"
            )));
        }
        if self.source.season.trim().is_empty() {
            return Err(ConfigError::Invalid("source.season must not be empty".into()));
        }
        let names = [
            ("output.csv_file", &self.output.csv_file),
            ("output.html_file", &self.output.html_file),
            ("output.combined_html_file", &self.output.combined_html_file),
            ("output.parquet_file", &self.output.parquet_file),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        self.aggregation_spec().validate()?;
        Ok(())
    }
}
