//! Player directories in the remote collection.

use serde::{Deserialize, Serialize};

/// One player directory in the remote collection, e.g. `Aaron_Cresswell_411`.
///
/// The directory holds the player's `gw.csv` gameweek history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityFile {
    pub name: String,
}

impl EntityFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Directory name without the trailing `_<id>` segment, underscores as spaces.
    ///
    /// `Aaron_Cresswell_411` becomes `Aaron Cresswell`. A name without an
    /// underscore has no id segment and is returned unchanged.
    pub fn display_name(&self) -> String {
        match self.name.rsplit_once('_') {
            Some((head, _id)) => head.replace('_', " "),
            None => self.name.clone(),
        }
    }

    /// The value written to the `player` column for this entity's rows.
    pub fn label(&self, mode: PlayerLabel) -> String {
        match mode {
            PlayerLabel::Display => self.display_name(),
            PlayerLabel::Directory => self.name.clone(),
        }
    }
}

impl std::fmt::Display for EntityFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// How rows are tagged with their source player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerLabel {
    /// `Aaron Cresswell`
    #[default]
    Display,
    /// `Aaron_Cresswell_411`
    Directory,
}
