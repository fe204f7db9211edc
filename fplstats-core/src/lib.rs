//! FPL Stats Core: domain types, remote data source, aggregation.
//!
//! This crate contains the season pipeline's building blocks:
//! - Domain types (player directories, parsed tables, weekly and aggregated rows)
//! - `EntitySource` trait with the GitHub mirror implementation
//! - Batch fetch with per-player failure isolation
//! - Aggregation spec and the single aggregator behind both season variants

pub mod aggregate;
pub mod data;
pub mod domain;
