//! CSV text to `Table`.

use super::provider::DataError;
use crate::domain::{Cell, EntityFile, Table, WeeklyTable, ELEMENT_COLUMN, MINUTES_COLUMN};

/// Parse CSV text with a header row. `what` names the source in errors.
pub fn parse_table(text: &str, what: &str) -> Result<Table, DataError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::parse(what, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(headers);
    for record in reader.records() {
        let record = record.map_err(|e| DataError::parse(what, e))?;
        table.push_row(record.iter().map(Cell::parse).collect());
    }
    Ok(table)
}

/// Parse a player's `gw.csv`. The `element` and `minutes` columns are required.
pub fn parse_weekly_csv(entity: EntityFile, text: &str) -> Result<WeeklyTable, DataError> {
    let what = format!("{}/gw.csv", entity.name);
    let table = parse_table(text, &what)?;
    for required in [ELEMENT_COLUMN, MINUTES_COLUMN] {
        if !table.has_column(required) {
            return Err(DataError::parse(
                what,
                format!("missing required column '{required}'"),
            ));
        }
    }
    Ok(WeeklyTable::new(entity, table))
}
