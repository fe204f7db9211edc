//! Concatenate per-player tables into one weekly table.

use super::spec::{ColumnSelection, INVOLVED_COLUMN, PLAYER_COLUMN};
use crate::domain::{Cell, PlayerLabel, Table, WeeklyTable};

/// Concatenate tables in order, tagging each row with the player label and
/// the 0/1 `Involved` flag.
///
/// With `ColumnSelection::All` the output carries the union of every table's
/// columns (first-seen order) followed by `player` and `Involved`; cells a
/// table lacks are `Empty`. With `Only`, exactly the listed columns.
pub fn combine(tables: &[WeeklyTable], selection: &ColumnSelection, label: PlayerLabel) -> Table {
    let headers = match selection {
        ColumnSelection::All => {
            let mut headers: Vec<String> = Vec::new();
            for t in tables {
                for h in &t.table.headers {
                    if h != PLAYER_COLUMN && h != INVOLVED_COLUMN && !headers.contains(h) {
                        headers.push(h.clone());
                    }
                }
            }
            headers.push(PLAYER_COLUMN.to_string());
            headers.push(INVOLVED_COLUMN.to_string());
            headers
        }
        ColumnSelection::Only(cols) => cols.clone(),
    };

    let mut combined = Table::new(headers);
    for t in tables {
        let player = t.entity.label(label);
        let sources: Vec<Option<usize>> = combined
            .headers
            .iter()
            .map(|h| t.table.column_index(h))
            .collect();

        for record in t.records() {
            let involved = if record.involved() { 1.0 } else { 0.0 };
            let row = combined
                .headers
                .iter()
                .zip(&sources)
                .map(|(h, src)| match h.as_str() {
                    PLAYER_COLUMN => Cell::Text(player.clone()),
                    INVOLVED_COLUMN => Cell::Number(involved),
                    _ => src
                        .and_then(|i| record.get_index(i))
                        .cloned()
                        .unwrap_or(Cell::Empty),
                })
                .collect();
            combined.push_row(row);
        }
    }
    combined
}
