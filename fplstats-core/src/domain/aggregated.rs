//! One reduced row per player.

use serde::Serialize;

/// Minutes in a full match; `90s completed = minutes / MINUTES_PER_MATCH`.
pub const MINUTES_PER_MATCH: f64 = 90.0;

/// Season totals for one `(player, element)` key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    pub player: String,
    pub element: i64,
    /// Reduced values, aligned with the aggregation spec's column rules.
    /// `None` only for a mean over no values.
    pub values: Vec<Option<f64>>,
    /// `transfers_in - transfers_out`.
    pub net_transfers: Option<f64>,
    /// Total minutes divided by 90.
    pub nineties: f64,
    /// Per-90 ratios, aligned with `AggregationSpec::per90`.
    /// `None` when no full match equivalent was played (`nineties == 0`).
    pub per90: Vec<Option<f64>>,
}

/// Divide a season total by completed 90s.
///
/// Zero completed 90s has no meaningful rate and yields `None` rather than
/// an infinite or NaN value.
pub fn per_ninety(total: Option<f64>, nineties: f64) -> Option<f64> {
    if nineties > 0.0 {
        total.map(|t| t / nineties)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_ninety_zero_minutes_is_none() {
        assert_eq!(per_ninety(Some(1.2), 0.0), None);
        assert_eq!(per_ninety(Some(0.0), 0.0), None);
    }

    #[test]
    fn per_ninety_divides() {
        assert_eq!(per_ninety(Some(3.0), 1.5), Some(2.0));
        assert_eq!(per_ninety(None, 1.5), None);
    }
}
