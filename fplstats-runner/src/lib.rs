//! FPL Stats Runner: pipeline orchestration, configuration, export, merge.
//!
//! This crate builds on `fplstats-core` to provide:
//! - TOML pipeline configuration with defaults for the published season run
//! - The season pipeline (list, fetch, aggregate, export)
//! - CSV, DataTables HTML, and Parquet rendering
//! - Atomic filesystem and in-memory artifact writers
//! - The reference-data merge

pub mod config;
pub mod export;
pub mod merge;
pub mod pipeline;
pub mod writer;

pub use config::{AggregationConfig, ConfigError, MergeConfig, OutputConfig, PipelineConfig};
pub use export::{export_csv, parquet_bytes, render_html, ExportError, HtmlOptions};
pub use merge::{merge_locations, merge_reference, with_full_name, MergeError, MergeOptions};
pub use pipeline::{run_merge, MergeSummary, Pipeline, RunError, RunSummary};
pub use writer::{ArtifactWriter, FsWriter, MemoryWriter};
