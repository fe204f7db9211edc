//! Enrich the aggregated table with reference attributes (price, position).
//!
//! The reference table is keyed by a `full_name` built from its first and
//! second name columns, then left-joined onto the aggregated `player`
//! column. Every aggregated row survives; rows without a match carry empty
//! reference cells.

use std::collections::HashMap;

use fplstats_core::data::{DataError, TableLoader};
use fplstats_core::domain::{Cell, Table};
use thiserror::Error;

/// Reference columns kept after the join, in output order.
pub const REFERENCE_COLUMNS: [&str; 5] =
    ["full_name", "first_name", "second_name", "now_cost", "element_type"];

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("{table} table has no '{column}' column")]
    MissingColumn { table: &'static str, column: String },

    #[error("cannot load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: DataError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Join column of the aggregated table.
    pub left_on: String,
    pub first_name: String,
    pub second_name: String,
    /// Name of the derived join column on the reference side.
    pub key: String,
    /// Reference columns carried into the output.
    pub keep: Vec<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            left_on: "player".into(),
            first_name: "first_name".into(),
            second_name: "second_name".into(),
            key: "full_name".into(),
            keep: REFERENCE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Append the derived key column: `first second`, or `Empty` when either
/// part is blank.
pub fn with_full_name(reference: &Table, options: &MergeOptions) -> Result<Table, MergeError> {
    let col = |name: &str| {
        reference
            .column_index(name)
            .ok_or_else(|| MergeError::MissingColumn {
                table: "reference",
                column: name.to_string(),
            })
    };
    let first = col(&options.first_name)?;
    let second = col(&options.second_name)?;

    let mut headers = reference.headers.clone();
    let key_idx = match reference.column_index(&options.key) {
        Some(idx) => idx,
        None => {
            headers.push(options.key.clone());
            headers.len() - 1
        }
    };

    let mut out = Table::new(headers);
    for row in &reference.rows {
        let mut row = row.clone();
        let key = match (&row[first], &row[second]) {
            (a, b) if a.is_empty() || b.is_empty() => Cell::Empty,
            (a, b) => Cell::Text(format!("{} {}", a.render(), b.render())),
        };
        row.resize(out.headers.len(), Cell::Empty);
        row[key_idx] = key;
        out.push_row(row);
    }
    Ok(out)
}

/// Left join `filtered` with the reference attributes.
///
/// Output columns are every filtered column followed by `options.keep`.
/// Names present on both sides are suffixed `_x` (left) and `_y` (right),
/// except the join column itself when both sides share its name. A filtered
/// row matching several reference rows is emitted once per match.
pub fn merge_reference(
    filtered: &Table,
    reference: &Table,
    options: &MergeOptions,
) -> Result<Table, MergeError> {
    let left_key = filtered
        .column_index(&options.left_on)
        .ok_or_else(|| MergeError::MissingColumn {
            table: "filtered",
            column: options.left_on.clone(),
        })?;

    let reference = with_full_name(reference, options)?;
    let right_cols = options
        .keep
        .iter()
        .map(|name| {
            reference
                .column_index(name)
                .ok_or_else(|| MergeError::MissingColumn {
                    table: "reference",
                    column: name.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let right_key = reference
        .column_index(&options.key)
        .ok_or_else(|| MergeError::MissingColumn {
            table: "reference",
            column: options.key.clone(),
        })?;

    // Joining on identically named columns keeps a single copy.
    let shared_key = options.left_on == options.key;
    let right_out: Vec<(usize, &String)> = right_cols
        .iter()
        .zip(&options.keep)
        .filter(|(_, name)| !(shared_key && **name == options.key))
        .map(|(&idx, name)| (idx, name))
        .collect();

    let collides = |name: &str| {
        filtered.headers.iter().any(|h| h == name) && right_out.iter().any(|(_, n)| *n == name)
    };
    let mut headers: Vec<String> = filtered
        .headers
        .iter()
        .map(|h| {
            if collides(h.as_str()) {
                format!("{h}_x")
            } else {
                h.clone()
            }
        })
        .collect();
    headers.extend(right_out.iter().map(|(_, name)| {
        if collides(name.as_str()) {
            format!("{name}_y")
        } else {
            (*name).clone()
        }
    }));

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in reference.rows.iter().enumerate() {
        if let Cell::Text(key) = &row[right_key] {
            index.entry(key.clone()).or_default().push(i);
        }
    }

    let mut merged = Table::new(headers);
    let mut matched = 0usize;
    for row in &filtered.rows {
        let key = &row[left_key];
        let hits = if key.is_empty() {
            None
        } else {
            index.get(&key.render())
        };
        match hits {
            Some(hits) => {
                matched += 1;
                for &r in hits {
                    let mut out = row.clone();
                    out.extend(right_out.iter().map(|&(idx, _)| reference.rows[r][idx].clone()));
                    merged.push_row(out);
                }
            }
            None => {
                let mut out = row.clone();
                out.extend(std::iter::repeat(Cell::Empty).take(right_out.len()));
                merged.push_row(out);
            }
        }
    }

    tracing::info!(
        rows = filtered.len(),
        matched,
        unmatched = filtered.len() - matched,
        "reference merge complete"
    );
    Ok(merged)
}

/// Load both inputs through `loader`, then merge.
pub fn merge_locations(
    loader: &dyn TableLoader,
    filtered: &str,
    reference: &str,
    options: &MergeOptions,
) -> Result<Table, MergeError> {
    let filtered = loader.load(filtered).map_err(|source| MergeError::Load {
        what: "filtered table",
        source,
    })?;
    let reference = loader.load(reference).map_err(|source| MergeError::Load {
        what: "reference table",
        source,
    })?;
    merge_reference(&filtered, &reference, options)
}
