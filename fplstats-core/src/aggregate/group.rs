//! Group the combined table by `(player, element)` and reduce.

use std::collections::BTreeMap;

use super::spec::{
    Accumulator, AggregationSpec, NET_TRANSFERS_COLUMN, NINETIES_COLUMN, PLAYER_COLUMN,
    TRANSFERS_IN_COLUMN, TRANSFERS_OUT_COLUMN,
};
use super::AggregateError;
use crate::domain::{
    per_ninety, AggregatedRecord, Cell, Table, ELEMENT_COLUMN, MINUTES_COLUMN, MINUTES_PER_MATCH,
};

/// Reduced rows plus the column layout they follow.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    /// Names of the reduced columns, aligned with `AggregatedRecord::values`.
    pub columns: Vec<String>,
    /// Names of the per-90 columns, aligned with `AggregatedRecord::per90`.
    pub per90_columns: Vec<String>,
    /// One record per `(player, element)`, sorted by that key.
    pub records: Vec<AggregatedRecord>,
}

impl AggregatedTable {
    /// Output header: `player`, `element`, reduced columns, `Net Transfers`,
    /// `90s completed`, per-90 columns.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.columns.len() + self.per90_columns.len() + 4);
        headers.push(PLAYER_COLUMN.to_string());
        headers.push(ELEMENT_COLUMN.to_string());
        headers.extend(self.columns.iter().cloned());
        headers.push(NET_TRANSFERS_COLUMN.to_string());
        headers.push(NINETIES_COLUMN.to_string());
        headers.extend(self.per90_columns.iter().cloned());
        headers
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.headers());
        for r in &self.records {
            let mut row = Vec::with_capacity(table.headers.len());
            row.push(Cell::Text(r.player.clone()));
            row.push(Cell::Number(r.element as f64));
            row.extend(r.values.iter().map(|v| Cell::from(*v)));
            row.push(Cell::from(r.net_transfers));
            row.push(Cell::Number(r.nineties));
            row.extend(r.per90.iter().map(|v| Cell::from(*v)));
            table.push_row(row);
        }
        table
    }

    pub fn find(&self, player: &str, element: i64) -> Option<&AggregatedRecord> {
        self.records
            .iter()
            .find(|r| r.player == player && r.element == element)
    }

    /// Reduced value of a named column for one record.
    pub fn value(&self, record: &AggregatedRecord, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        record.values.get(idx).copied().flatten()
    }
}

/// Group by `(player, element)`, reduce every spec column, derive net
/// transfers, completed 90s, and per-90 ratios.
///
/// Output is sorted by player label, then element id.
pub fn group(combined: &Table, spec: &AggregationSpec) -> Result<AggregatedTable, AggregateError> {
    if combined.is_empty() {
        return Ok(AggregatedTable {
            columns: spec.columns.iter().map(|c| c.name.clone()).collect(),
            per90_columns: spec.per90_headers(),
            records: Vec::new(),
        });
    }

    let column = |name: &str| {
        combined
            .column_index(name)
            .ok_or_else(|| AggregateError::MissingColumn(name.to_string()))
    };
    let player_idx = column(PLAYER_COLUMN)?;
    let element_idx = column(ELEMENT_COLUMN)?;
    let rule_idx = spec
        .columns
        .iter()
        .map(|rule| column(rule.name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<(String, i64), Vec<Accumulator>> = BTreeMap::new();

    for (row_no, row) in combined.rows.iter().enumerate() {
        let non_numeric = |col: &str, cell: &Cell| AggregateError::NonNumeric {
            column: col.to_string(),
            row: row_no,
            value: cell.render(),
        };

        let player = row[player_idx].render();
        let element = match &row[element_idx] {
            Cell::Number(v) if v.fract() == 0.0 => *v as i64,
            // no key, no group
            Cell::Empty => continue,
            other => return Err(non_numeric(ELEMENT_COLUMN, other)),
        };

        let accs = groups
            .entry((player, element))
            .or_insert_with(|| vec![Accumulator::default(); spec.columns.len()]);

        for ((rule, &idx), acc) in spec.columns.iter().zip(&rule_idx).zip(accs.iter_mut()) {
            match &row[idx] {
                Cell::Number(v) => acc.push(*v),
                Cell::Empty => {}
                other => return Err(non_numeric(rule.name.as_str(), other)),
            }
        }
    }

    let find_rule = |name: &str| {
        spec.rule_index(name)
            .ok_or_else(|| AggregateError::InvalidSpec(format!("column '{name}' must be aggregated")))
    };
    let minutes_rule = find_rule(MINUTES_COLUMN)?;
    let in_rule = find_rule(TRANSFERS_IN_COLUMN)?;
    let out_rule = find_rule(TRANSFERS_OUT_COLUMN)?;
    let per90_rules = spec
        .per90
        .iter()
        .map(|c| find_rule(c.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let records = groups
        .into_iter()
        .map(|((player, element), accs)| {
            let values: Vec<Option<f64>> = spec
                .columns
                .iter()
                .zip(&accs)
                .map(|(rule, acc)| acc.finish(rule.reduction))
                .collect();

            let nineties = values[minutes_rule].unwrap_or(0.0) / MINUTES_PER_MATCH;
            let net_transfers = values[in_rule]
                .zip(values[out_rule])
                .map(|(tin, tout)| tin - tout);
            let per90 = per90_rules
                .iter()
                .map(|&i| per_ninety(values[i], nineties))
                .collect();

            AggregatedRecord {
                player,
                element,
                values,
                net_transfers,
                nineties,
                per90,
            }
        })
        .collect();

    Ok(AggregatedTable {
        columns: spec.columns.iter().map(|c| c.name.clone()).collect(),
        per90_columns: spec.per90_headers(),
        records,
    })
}
