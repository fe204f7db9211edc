//! Aggregation: combine per-player tables, group by `(player, element)`,
//! reduce, and derive per-90 metrics.
//!
//! Tables that cannot be aggregated (missing or non-numeric columns) are
//! skipped and reported alongside players whose fetch failed; the rest of
//! the season is still aggregated.

pub mod combine;
pub mod group;
pub mod spec;

pub use combine::combine;
pub use group::{group, AggregatedTable};
pub use spec::{
    Accumulator, AggregationSpec, ColumnRule, ColumnSelection, Preset, Reduction,
    INVOLVED_COLUMN, NET_TRANSFERS_COLUMN, NINETIES_COLUMN, PLAYER_COLUMN,
};

use crate::data::{DataError, FetchBatch, FetchOutcome};
use crate::domain::{Cell, EntityFile, PlayerLabel, Table, WeeklyTable, ELEMENT_COLUMN};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("non-numeric value '{value}' in column '{column}' (row {row})")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid aggregation spec: {0}")]
    InvalidSpec(String),
}

/// Why a player is missing from the aggregated table.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[from] DataError),

    #[error("unusable gameweek table: {0}")]
    Table(#[from] AggregateError),
}

#[derive(Debug)]
pub struct SkippedEntity {
    pub entity: EntityFile,
    pub reason: SkipReason,
}

/// Everything the aggregator produced for one run.
#[derive(Debug)]
pub struct AggregationOutput {
    /// All usable weekly rows, concatenated and tagged.
    pub combined: Table,
    pub aggregated: AggregatedTable,
    pub skipped: Vec<SkippedEntity>,
}

impl AggregationOutput {
    pub fn aggregated_players(&self) -> usize {
        self.aggregated.records.len()
    }
}

/// Check that a fetched table carries every reduced column, as numbers.
/// A blank `element` passes here; `group` drops that row alone.
pub fn check_table(table: &WeeklyTable, spec: &AggregationSpec) -> Result<(), AggregateError> {
    for column in spec.required_input_columns() {
        let idx = table
            .table
            .column_index(column)
            .ok_or_else(|| AggregateError::MissingColumn(column.to_string()))?;
        for (row, cells) in table.table.rows.iter().enumerate() {
            let cell = &cells[idx];
            let ok = match cell {
                Cell::Number(v) if column == ELEMENT_COLUMN => v.fract() == 0.0,
                Cell::Number(_) => true,
                Cell::Empty => true,
                Cell::Text(_) => false,
            };
            if !ok {
                return Err(AggregateError::NonNumeric {
                    column: column.to_string(),
                    row,
                    value: cell.render(),
                });
            }
        }
    }
    Ok(())
}

/// Aggregate a fetch batch. Fetch failures and unusable tables become
/// `skipped` entries; only an invalid spec is an error.
pub fn aggregate_batch(
    batch: FetchBatch,
    spec: &AggregationSpec,
    label: PlayerLabel,
) -> Result<AggregationOutput, AggregateError> {
    let mut tables = Vec::with_capacity(batch.outcomes.len());
    let mut skipped = Vec::new();

    for outcome in batch.outcomes {
        match outcome {
            FetchOutcome::Fetched(table) => tables.push(table),
            FetchOutcome::Failed { entity, error } => skipped.push(SkippedEntity {
                entity,
                reason: SkipReason::Fetch(error),
            }),
        }
    }

    let mut output = aggregate(tables, spec, label)?;
    skipped.append(&mut output.skipped);
    output.skipped = skipped;
    Ok(output)
}

/// Aggregate already-fetched tables.
pub fn aggregate(
    tables: Vec<WeeklyTable>,
    spec: &AggregationSpec,
    label: PlayerLabel,
) -> Result<AggregationOutput, AggregateError> {
    spec.validate()?;

    let mut usable = Vec::with_capacity(tables.len());
    let mut skipped = Vec::new();
    for table in tables {
        match check_table(&table, spec) {
            Ok(()) => usable.push(table),
            Err(e) => {
                tracing::warn!(player = %table.entity, "skipping player: {e}");
                skipped.push(SkippedEntity {
                    entity: table.entity,
                    reason: SkipReason::Table(e),
                });
            }
        }
    }

    let combined = combine(&usable, &spec.selection, label);
    let aggregated = group(&combined, spec)?;
    tracing::info!(
        rows = combined.len(),
        players = aggregated.records.len(),
        skipped = skipped.len(),
        "aggregation complete"
    );

    Ok(AggregationOutput {
        combined,
        aggregated,
        skipped,
    })
}
