//! Gameweek history for a single player.

use super::entity::EntityFile;
use super::table::{Cell, Table};

/// Column holding the player's element id.
pub const ELEMENT_COLUMN: &str = "element";
/// Column holding minutes played in the gameweek.
pub const MINUTES_COLUMN: &str = "minutes";

/// One fetched `gw.csv`: the player's rows, one per gameweek fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyTable {
    pub entity: EntityFile,
    pub table: Table,
}

impl WeeklyTable {
    pub fn new(entity: EntityFile, table: Table) -> Self {
        Self { entity, table }
    }

    pub fn records(&self) -> impl Iterator<Item = WeeklyRecord<'_>> {
        self.table.rows.iter().map(move |cells| WeeklyRecord {
            entity: &self.entity,
            headers: &self.table.headers,
            cells,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// A borrowed view of one gameweek row.
#[derive(Debug, Clone, Copy)]
pub struct WeeklyRecord<'a> {
    pub entity: &'a EntityFile,
    headers: &'a [String],
    cells: &'a [Cell],
}

impl<'a> WeeklyRecord<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.cells.get(idx)
    }

    pub fn get_index(&self, index: usize) -> Option<&'a Cell> {
        self.cells.get(index)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_number)
    }

    pub fn minutes(&self) -> f64 {
        self.number(MINUTES_COLUMN).unwrap_or(0.0)
    }

    /// The player took the pitch: strictly positive minutes.
    pub fn involved(&self) -> bool {
        self.minutes() > 0.0
    }
}
