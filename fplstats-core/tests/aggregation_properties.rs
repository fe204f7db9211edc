//! Property tests for aggregation invariants.
//!
//! Uses proptest to verify:
//! 1. `Involved` is 1 exactly when minutes are strictly positive
//! 2. A grouped sum equals the sum over every row sharing the key
//! 3. Net transfers are transfers in minus transfers out
//! 4. Completed 90s and per-90 ratios follow minutes, with no ratio at zero minutes

use fplstats_core::aggregate::{
    aggregate, combine, AggregationSpec, ColumnSelection, INVOLVED_COLUMN,
};
use fplstats_core::domain::{Cell, EntityFile, PlayerLabel, Table, WeeklyTable};
use proptest::prelude::*;
use std::collections::HashMap;

// ── Strategies (proptest) ────────────────────────────────────────────

const HEADERS: [&str; 5] = [
    "element",
    "minutes",
    "expected_goals",
    "transfers_in",
    "transfers_out",
];

#[derive(Debug, Clone)]
struct Row {
    player: usize,
    element: i64,
    minutes: u32,
    xg: f64,
    tin: u32,
    tout: u32,
}

fn arb_row() -> impl Strategy<Value = Row> {
    (0..4usize, 1..4i64, 0..=90u32, 0..200u32, 0..10_000u32, 0..10_000u32).prop_map(
        |(player, element, minutes, xg, tin, tout)| Row {
            player,
            element,
            minutes,
            // two-decimal xG values, as published
            xg: xg as f64 / 100.0,
            tin,
            tout,
        },
    )
}

fn spec() -> AggregationSpec {
    let mut spec = AggregationSpec::season_summary();
    spec.columns.retain(|c| {
        matches!(
            c.name.as_str(),
            "minutes" | "expected_goals" | "transfers_in" | "transfers_out" | "Involved"
        )
    });
    spec.per90 = vec!["expected_goals".into()];
    spec
}

fn tables(rows: &[Row]) -> Vec<WeeklyTable> {
    let mut by_player: Vec<Vec<Vec<Cell>>> = vec![Vec::new(); 4];
    for r in rows {
        by_player[r.player].push(vec![
            Cell::Number(r.element as f64),
            Cell::Number(r.minutes as f64),
            Cell::Number(r.xg),
            Cell::Number(r.tin as f64),
            Cell::Number(r.tout as f64),
        ]);
    }
    by_player
        .into_iter()
        .enumerate()
        .map(|(i, rows)| {
            WeeklyTable::new(
                EntityFile::new(format!("Player_{i}_{i}")),
                Table::with_rows(HEADERS.iter().map(|h| h.to_string()).collect(), rows),
            )
        })
        .collect()
}

fn label(player: usize) -> String {
    format!("Player {player}")
}

proptest! {
    #[test]
    fn involved_iff_positive_minutes(rows in prop::collection::vec(arb_row(), 0..40)) {
        let combined = combine(&tables(&rows), &ColumnSelection::All, PlayerLabel::Display);
        let minutes_idx = combined.column_index("minutes").unwrap();
        let involved_idx = combined.column_index(INVOLVED_COLUMN).unwrap();
        for row in &combined.rows {
            let minutes = row[minutes_idx].as_number().unwrap();
            let involved = row[involved_idx].as_number().unwrap();
            prop_assert_eq!(involved == 1.0, minutes > 0.0);
            prop_assert!(involved == 0.0 || involved == 1.0);
        }
    }

    #[test]
    fn grouped_sums_match_row_sums(rows in prop::collection::vec(arb_row(), 1..60)) {
        let out = aggregate(tables(&rows), &spec(), PlayerLabel::Display).unwrap();

        let mut expected: HashMap<(String, i64), (f64, f64, f64)> = HashMap::new();
        for r in &rows {
            let e = expected.entry((label(r.player), r.element)).or_default();
            e.0 += r.minutes as f64;
            e.1 += r.tin as f64;
            e.2 += r.tout as f64;
        }

        prop_assert_eq!(out.aggregated.records.len(), expected.len());
        for rec in &out.aggregated.records {
            let (minutes, tin, tout) = expected[&(rec.player.clone(), rec.element)];
            prop_assert_eq!(out.aggregated.value(rec, "minutes"), Some(minutes));
            prop_assert_eq!(out.aggregated.value(rec, "transfers_in"), Some(tin));
            prop_assert_eq!(rec.net_transfers, Some(tin - tout));
        }
    }

    #[test]
    fn keys_are_unique_and_sorted(rows in prop::collection::vec(arb_row(), 0..60)) {
        let out = aggregate(tables(&rows), &spec(), PlayerLabel::Display).unwrap();
        let keys: Vec<(&str, i64)> = out
            .aggregated
            .records
            .iter()
            .map(|r| (r.player.as_str(), r.element))
            .collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn per90_follows_minutes(rows in prop::collection::vec(arb_row(), 1..60)) {
        let out = aggregate(tables(&rows), &spec(), PlayerLabel::Display).unwrap();
        for rec in &out.aggregated.records {
            let minutes = out.aggregated.value(rec, "minutes").unwrap();
            prop_assert_eq!(rec.nineties, minutes / 90.0);
            let xg = out.aggregated.value(rec, "expected_goals").unwrap();
            if minutes == 0.0 {
                prop_assert_eq!(rec.per90[0], None);
            } else {
                prop_assert_eq!(rec.per90[0], Some(xg / rec.nineties));
            }
        }
    }

    #[test]
    fn aggregation_ignores_table_order(rows in prop::collection::vec(arb_row(), 1..40)) {
        let forward = aggregate(tables(&rows), &spec(), PlayerLabel::Display).unwrap();
        let mut reversed_tables = tables(&rows);
        reversed_tables.reverse();
        let backward = aggregate(reversed_tables, &spec(), PlayerLabel::Display).unwrap();
        prop_assert_eq!(forward.aggregated.records.len(), backward.aggregated.records.len());
        for (a, b) in forward.aggregated.records.iter().zip(&backward.aggregated.records) {
            prop_assert_eq!(&a.player, &b.player);
            prop_assert_eq!(a.element, b.element);
            prop_assert_eq!(a.net_transfers, b.net_transfers);
            prop_assert_eq!(a.nineties, b.nineties);
        }
    }
}

#[test]
fn end_to_end_two_gameweeks() {
    let rows = vec![
        vec![
            Cell::Number(1.0),
            Cell::Number(45.0),
            Cell::Number(0.1),
            Cell::Number(100.0),
            Cell::Number(30.0),
        ],
        vec![
            Cell::Number(1.0),
            Cell::Number(90.0),
            Cell::Number(0.2),
            Cell::Number(50.0),
            Cell::Number(10.0),
        ],
    ];
    let table = WeeklyTable::new(
        EntityFile::new("A"),
        Table::with_rows(HEADERS.iter().map(|h| h.to_string()).collect(), rows),
    );
    let out = aggregate(vec![table], &spec(), PlayerLabel::Display).unwrap();
    let rec = out.aggregated.find("A", 1).unwrap();
    assert_eq!(out.aggregated.value(rec, "minutes"), Some(135.0));
    assert_eq!(rec.net_transfers, Some(110.0));
    assert_eq!(rec.nineties, 1.5);
    assert_eq!(out.aggregated.value(rec, INVOLVED_COLUMN), Some(2.0));
}
