//! Aggregation spec: which columns survive, and how each one is reduced.
//!
//! Both season variants (full season summary, team-score subset) are presets
//! of the same spec type, so there is a single aggregator.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::AggregateError;
use crate::domain::{ELEMENT_COLUMN, MINUTES_COLUMN};

/// Derived 0/1 column: 1 when the row has positive minutes.
pub const INVOLVED_COLUMN: &str = "Involved";
/// Column carrying the player label on every combined row.
pub const PLAYER_COLUMN: &str = "player";
pub const TRANSFERS_IN_COLUMN: &str = "transfers_in";
pub const TRANSFERS_OUT_COLUMN: &str = "transfers_out";
pub const NET_TRANSFERS_COLUMN: &str = "Net Transfers";
pub const NINETIES_COLUMN: &str = "90s completed";
pub const PER90_SUFFIX: &str = "_per90";

/// How a column is reduced within a `(player, element)` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Sum of present values; a group with none sums to 0.
    Sum,
    /// Arithmetic mean of present values.
    Mean,
    /// Mean rounded to an integer, ties to even.
    MeanRounded,
}

/// Running state for one column of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    /// Adds a value. NaN and infinities count as missing.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.sum += value;
        self.count += 1;
    }

    pub fn finish(&self, reduction: Reduction) -> Option<f64> {
        match reduction {
            Reduction::Sum => Some(self.sum),
            Reduction::Mean => self.mean(),
            Reduction::MeanRounded => self.mean().map(f64::round_ties_even),
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    pub name: String,
    pub reduction: Reduction,
}

impl ColumnRule {
    pub fn sum(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reduction: Reduction::Sum,
        }
    }

    pub fn new(name: &str, reduction: Reduction) -> Self {
        Self {
            name: name.to_string(),
            reduction,
        }
    }
}

/// Columns kept in the combined weekly table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelection {
    /// Union of every player's columns, then `player` and `Involved`.
    All,
    /// Exactly these columns, in this order.
    Only(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub selection: ColumnSelection,
    /// Reduced columns, in output order.
    pub columns: Vec<ColumnRule>,
    /// Columns normalized per completed 90 minutes.
    pub per90: Vec<String>,
}

/// Additive gameweek columns shared by both presets, in output order.
const SEASON_SUMS_BEFORE_SELECTED: [&str; 19] = [
    "assists",
    "bonus",
    "bps",
    "clean_sheets",
    "creativity",
    "expected_assists",
    "expected_goal_involvements",
    "expected_goals",
    "expected_goals_conceded",
    "goals_conceded",
    "goals_scored",
    "ict_index",
    "influence",
    "minutes",
    "own_goals",
    "penalties_missed",
    "penalties_saved",
    "red_cards",
    "saves",
];

const SEASON_SUMS_AFTER_SELECTED: [&str; 7] = [
    "starts",
    "threat",
    "total_points",
    "transfers_in",
    "transfers_out",
    "value",
    "yellow_cards",
];

const PER90_COLUMNS: [&str; 4] = [
    "expected_assists",
    "expected_goal_involvements",
    "expected_goals",
    "expected_goals_conceded",
];

/// Columns kept by the team-score variant, `player` last.
const TEAM_SCORE_SELECTION: [&str; 31] = [
    "assists",
    "bonus",
    "bps",
    "clean_sheets",
    "creativity",
    "element",
    "expected_assists",
    "expected_goal_involvements",
    "expected_goals",
    "expected_goals_conceded",
    "goals_conceded",
    "goals_scored",
    "ict_index",
    "influence",
    "minutes",
    "own_goals",
    "penalties_missed",
    "penalties_saved",
    "red_cards",
    "saves",
    "selected",
    "starts",
    "team_a_score",
    "team_h_score",
    "threat",
    "total_points",
    "transfers_in",
    "transfers_out",
    "value",
    "yellow_cards",
    "player",
];

impl AggregationSpec {
    /// Every fetched column kept; 26 additive sums, rounded mean `selected`,
    /// and the `Involved` appearance count.
    pub fn season_summary() -> Self {
        let mut columns: Vec<ColumnRule> = SEASON_SUMS_BEFORE_SELECTED
            .iter()
            .map(|c| ColumnRule::sum(c))
            .collect();
        columns.push(ColumnRule::new("selected", Reduction::MeanRounded));
        columns.extend(SEASON_SUMS_AFTER_SELECTED.iter().map(|c| ColumnRule::sum(c)));
        columns.push(ColumnRule::sum(INVOLVED_COLUMN));

        Self {
            selection: ColumnSelection::All,
            columns,
            per90: PER90_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The fixed 30-column subset, additionally summing both team scores.
    pub fn with_team_scores() -> Self {
        let mut spec = Self::season_summary();
        let starts = spec
            .columns
            .iter()
            .position(|c| c.name == "starts")
            .map_or(spec.columns.len(), |i| i + 1);
        spec.columns.splice(
            starts..starts,
            [ColumnRule::sum("team_a_score"), ColumnRule::sum("team_h_score")],
        );

        let mut selection: Vec<String> =
            TEAM_SCORE_SELECTION.iter().map(|c| c.to_string()).collect();
        selection.push(INVOLVED_COLUMN.to_string());
        spec.selection = ColumnSelection::Only(selection);
        spec
    }

    /// Columns every fetched table must carry as numbers.
    pub fn required_input_columns(&self) -> Vec<&str> {
        let mut cols = vec![ELEMENT_COLUMN];
        for rule in &self.columns {
            if rule.name != INVOLVED_COLUMN && !cols.contains(&rule.name.as_str()) {
                cols.push(rule.name.as_str());
            }
        }
        cols
    }

    pub fn rule_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn per90_headers(&self) -> Vec<String> {
        self.per90
            .iter()
            .map(|c| format!("{c}{PER90_SUFFIX}"))
            .collect()
    }

    /// Every derived field must be computable from the reduced columns, and a
    /// restricted selection must keep everything the grouping reads.
    pub fn validate(&self) -> Result<(), AggregateError> {
        for needed in [MINUTES_COLUMN, TRANSFERS_IN_COLUMN, TRANSFERS_OUT_COLUMN] {
            if self.rule_index(needed).is_none() {
                return Err(AggregateError::InvalidSpec(format!(
                    "column '{needed}' must be aggregated"
                )));
            }
        }
        for col in &self.per90 {
            if self.rule_index(col).is_none() {
                return Err(AggregateError::InvalidSpec(format!(
                    "per-90 column '{col}' is not aggregated"
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for rule in &self.columns {
            if !seen.insert(rule.name.as_str()) {
                return Err(AggregateError::InvalidSpec(format!(
                    "column '{}' listed twice",
                    rule.name
                )));
            }
        }
        if let ColumnSelection::Only(keep) = &self.selection {
            let grouped = [PLAYER_COLUMN, ELEMENT_COLUMN]
                .into_iter()
                .chain(self.columns.iter().map(|c| c.name.as_str()));
            for col in grouped {
                if !keep.iter().any(|k| k == col) {
                    return Err(AggregateError::InvalidSpec(format!(
                        "selection drops grouped column '{col}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Named presets, selectable from config and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    SeasonSummary,
    WithTeamScores,
}

impl Preset {
    pub fn spec(self) -> AggregationSpec {
        match self {
            Preset::SeasonSummary => AggregationSpec::season_summary(),
            Preset::WithTeamScores => AggregationSpec::with_team_scores(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preset::SeasonSummary => "season_summary",
            Preset::WithTeamScores => "with_team_scores",
        }
    }
}

impl FromStr for Preset {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "season_summary" => Ok(Preset::SeasonSummary),
            "with_team_scores" => Ok(Preset::WithTeamScores),
            other => Err(AggregateError::InvalidSpec(format!(
                "unknown preset '{other}'. Valid: season_summary, with_team_scores"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        AggregationSpec::season_summary().validate().unwrap();
        AggregationSpec::with_team_scores().validate().unwrap();
    }

    #[test]
    fn season_summary_shape() {
        let spec = AggregationSpec::season_summary();
        assert_eq!(spec.columns.len(), 28);
        assert_eq!(spec.selection, ColumnSelection::All);
        assert_eq!(spec.columns[19], ColumnRule::new("selected", Reduction::MeanRounded));
        assert_eq!(spec.columns.last().unwrap().name, INVOLVED_COLUMN);
        assert!(spec.rule_index("team_a_score").is_none());
    }

    #[test]
    fn team_score_variant_adds_scores_after_starts() {
        let spec = AggregationSpec::with_team_scores();
        let starts = spec.rule_index("starts").unwrap();
        assert_eq!(spec.columns[starts + 1].name, "team_a_score");
        assert_eq!(spec.columns[starts + 2].name, "team_h_score");
        assert_eq!(spec.columns.len(), 30);
        match &spec.selection {
            ColumnSelection::Only(cols) => {
                assert_eq!(cols.len(), 32);
                assert_eq!(cols[30], PLAYER_COLUMN);
            }
            ColumnSelection::All => panic!("expected a restricted selection"),
        }
    }

    #[test]
    fn required_columns_exclude_derived() {
        let spec = AggregationSpec::season_summary();
        let req = spec.required_input_columns();
        assert_eq!(req[0], "element");
        assert!(req.contains(&"minutes"));
        assert!(!req.contains(&INVOLVED_COLUMN));
    }

    #[test]
    fn accumulator_rounds_ties_to_even() {
        let mut acc = Accumulator::default();
        acc.push(2.0);
        acc.push(3.0);
        assert_eq!(acc.finish(Reduction::Mean), Some(2.5));
        assert_eq!(acc.finish(Reduction::MeanRounded), Some(2.0));
        acc.push(9.0);
        acc.push(0.0);
        // mean 3.5 rounds up to 4
        assert_eq!(acc.finish(Reduction::MeanRounded), Some(4.0));
        assert_eq!(acc.finish(Reduction::Sum), Some(14.0));
    }

    #[test]
    fn empty_accumulator() {
        let acc = Accumulator::default();
        assert_eq!(acc.finish(Reduction::Sum), Some(0.0));
        assert_eq!(acc.finish(Reduction::Mean), None);
    }

    #[test]
    fn invalid_specs_rejected() {
        let mut spec = AggregationSpec::season_summary();
        spec.columns.retain(|c| c.name != "minutes");
        assert!(spec.validate().is_err());

        let mut spec = AggregationSpec::season_summary();
        spec.per90.push("goals_scored_but_not_really".into());
        assert!(spec.validate().is_err());

        let mut spec = AggregationSpec::with_team_scores();
        if let ColumnSelection::Only(cols) = &mut spec.selection {
            cols.retain(|c| c != "bonus");
        }
        assert!(spec.validate().is_err());
    }

    #[test]
    fn preset_from_str() {
        assert_eq!("season_summary".parse::<Preset>().unwrap(), Preset::SeasonSummary);
        assert_eq!("with_team_scores".parse::<Preset>().unwrap(), Preset::WithTeamScores);
        assert!("grouped".parse::<Preset>().is_err());
    }
}
