//! Season pipeline: wires listing, fetch, aggregation, and export.
//!
//! Two entry points:
//! - `Pipeline::run()`: list players, fetch every `gw.csv`, aggregate, write
//!   the CSV/HTML (and optionally combined HTML and Parquet) artifacts.
//! - `run_merge()`: left-join a filtered table with reference attributes and
//!   write the merged CSV.
//!
//! Artifacts are rendered in memory and then staged together. Nothing is
//! committed until every stage succeeds, so a render or stage failure leaves
//! the previous outputs as they were.

use std::path::PathBuf;

use fplstats_core::aggregate::{aggregate_batch, AggregateError, SkippedEntity};
use fplstats_core::data::{
    fetch_all, DataError, EntitySource, FetchOptions, FetchProgress, TableLoader,
};
use thiserror::Error;

use crate::config::{ConfigError, MergeConfig, PipelineConfig};
use crate::export::{export_csv, parquet_bytes, render_html, ExportError, HtmlOptions};
use crate::merge::{merge_locations, MergeError, MergeOptions};
use crate::writer::ArtifactWriter;

/// Errors that abort a run. Per-player failures are not errors; they are
/// reported in `RunSummary::skipped`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot list players from {source_name}: {error}")]
    Listing {
        source_name: String,
        #[source]
        error: DataError,
    },

    #[error("nothing to aggregate: all {} players were skipped", .skipped.len())]
    NothingToAggregate { skipped: Vec<SkippedEntity> },

    #[error("aggregation error: {0}")]
    Spec(#[from] AggregateError),

    #[error("export error: {0}")]
    Export(#[from] ExportError),

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
}

/// What a season run did.
#[derive(Debug)]
pub struct RunSummary {
    pub listed: usize,
    pub fetched: usize,
    /// Rows in the aggregated table.
    pub aggregated_rows: usize,
    pub skipped: Vec<SkippedEntity>,
    /// Written artifacts, in write order.
    pub artifacts: Vec<PathBuf>,
}

impl RunSummary {
    /// Every listed player made it into the output.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// One configured season run over an injected source and sink.
pub struct Pipeline<'a> {
    source: &'a dyn EntitySource,
    writer: &'a dyn ArtifactWriter,
    progress: &'a dyn FetchProgress,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn EntitySource,
        writer: &'a dyn ArtifactWriter,
        progress: &'a dyn FetchProgress,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            source,
            writer,
            progress,
            config,
        }
    }

    pub fn run(&self) -> Result<RunSummary, RunError> {
        self.config.validate()?;
        let spec = self.config.aggregation_spec();

        let entities = self
            .source
            .list_entities()
            .map_err(|error| RunError::Listing {
                source_name: self.source.name().to_string(),
                error,
            })?;
        let listed = entities.len();
        tracing::info!(source = self.source.name(), players = listed, "listed players");

        let options = FetchOptions {
            concurrency: self.config.source.concurrency,
        };
        let batch = fetch_all(self.source, &entities, &options, self.progress);
        let fetched = batch.fetched_count();

        let output = aggregate_batch(batch, &spec, self.config.aggregation.player_label)?;
        if listed > 0 && output.skipped.len() == listed {
            return Err(RunError::NothingToAggregate {
                skipped: output.skipped,
            });
        }

        let aggregated = output.aggregated.to_table();
        let out = &self.config.output;
        let mut artifacts: Vec<(PathBuf, Vec<u8>)> = vec![
            (out.csv_path(), export_csv(&aggregated)?.into_bytes()),
            (
                out.html_path(),
                render_html(
                    &aggregated,
                    &HtmlOptions {
                        min_filter_column: out.min_filter().map(str::to_string),
                    },
                )
                .into_bytes(),
            ),
        ];
        if out.write_combined {
            artifacts.push((
                out.combined_html_path(),
                render_html(&output.combined, &HtmlOptions::default()).into_bytes(),
            ));
        }
        if out.write_parquet {
            artifacts.push((out.parquet_path(), parquet_bytes(&aggregated)?));
        }

        let written = self.write_all(artifacts)?;

        for skipped in &output.skipped {
            tracing::warn!(player = %skipped.entity, "skipped: {}", skipped.reason);
        }
        tracing::info!(
            listed,
            fetched,
            rows = aggregated.len(),
            skipped = output.skipped.len(),
            "season run complete"
        );

        Ok(RunSummary {
            listed,
            fetched,
            aggregated_rows: aggregated.len(),
            skipped: output.skipped,
            artifacts: written,
        })
    }

    fn write_all(&self, artifacts: Vec<(PathBuf, Vec<u8>)>) -> Result<Vec<PathBuf>, RunError> {
        let mut staged: Vec<PathBuf> = Vec::with_capacity(artifacts.len());
        for (path, bytes) in artifacts {
            if let Err(source) = self.writer.stage(&path, &bytes) {
                self.writer.discard(&path);
                self.discard_all(&staged);
                return Err(RunError::Write { path, source });
            }
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "staged artifact");
            staged.push(path);
        }

        for (i, path) in staged.iter().enumerate() {
            if let Err(source) = self.writer.commit(path) {
                self.discard_all(&staged[i..]);
                return Err(RunError::Write {
                    path: path.clone(),
                    source,
                });
            }
            tracing::info!(path = %path.display(), "wrote artifact");
        }
        Ok(staged)
    }

    fn discard_all(&self, paths: &[PathBuf]) {
        for path in paths {
            self.writer.discard(path);
        }
    }
}

/// What a merge run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub rows: usize,
    pub output: PathBuf,
}

/// Merge the configured filtered and reference tables and write the result.
pub fn run_merge(
    loader: &dyn TableLoader,
    writer: &dyn ArtifactWriter,
    config: &MergeConfig,
) -> Result<MergeSummary, RunError> {
    let merged = merge_locations(
        loader,
        &config.filtered,
        &config.reference,
        &MergeOptions::default(),
    )?;
    let csv = export_csv(&merged)?;
    writer
        .write(&config.output, csv.as_bytes())
        .map_err(|source| RunError::Write {
            path: config.output.clone(),
            source,
        })?;
    tracing::info!(path = %config.output.display(), rows = merged.len(), "wrote merged table");
    Ok(MergeSummary {
        rows: merged.len(),
        output: config.output.clone(),
    })
}
