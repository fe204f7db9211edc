//! Domain types: player directories, parsed tables, weekly rows, aggregated rows.

pub mod aggregated;
pub mod entity;
pub mod table;
pub mod weekly;

pub use aggregated::{per_ninety, AggregatedRecord, MINUTES_PER_MATCH};
pub use entity::{EntityFile, PlayerLabel};
pub use table::{Cell, Table};
pub use weekly::{WeeklyRecord, WeeklyTable, ELEMENT_COLUMN, MINUTES_COLUMN};
