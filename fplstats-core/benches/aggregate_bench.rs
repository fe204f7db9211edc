use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fplstats_core::aggregate::{aggregate, AggregationSpec};
use fplstats_core::domain::{Cell, EntityFile, PlayerLabel, Table, WeeklyTable};

/// A season-sized fixture: 700 players, 38 gameweeks each.
fn season(players: usize, gameweeks: usize) -> Vec<WeeklyTable> {
    let spec = AggregationSpec::season_summary();
    let headers: Vec<String> = spec
        .required_input_columns()
        .iter()
        .map(|c| c.to_string())
        .collect();

    (0..players)
        .map(|p| {
            let rows = (0..gameweeks)
                .map(|gw| {
                    headers
                        .iter()
                        .map(|h| match h.as_str() {
                            "element" => Cell::Number(p as f64),
                            "minutes" => Cell::Number(((p + gw) % 91) as f64),
                            _ => Cell::Number((gw % 7) as f64 * 0.1),
                        })
                        .collect()
                })
                .collect();
            WeeklyTable::new(
                EntityFile::new(format!("Player_{p}")),
                Table::with_rows(headers.clone(), rows),
            )
        })
        .collect()
}

fn bench_aggregate(c: &mut Criterion) {
    let spec = AggregationSpec::season_summary();
    let tables = season(700, 38);
    c.bench_function("aggregate_season_700x38", |b| {
        b.iter(|| {
            let out = aggregate(black_box(tables.clone()), &spec, PlayerLabel::Display).unwrap();
            black_box(out.aggregated.records.len())
        })
    });
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
