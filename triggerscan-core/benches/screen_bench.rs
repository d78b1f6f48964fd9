//! Criterion benchmarks for the screening pass.
//!
//! Benchmarks:
//! 1. Predicate evaluation over a long weekly series
//! 2. Full screen (predicates, intersection, outcomes, report)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use triggerscan_core::{screen, PredicateEvaluator, ScreenParams, TimeSeriesTable, WeeklyRecord};

fn make_table(n: usize) -> TimeSeriesTable {
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.37).sin() * 10.0;
            let open = close - (i as f64 * 0.11).cos() * 2.0;
            let low = open.min(close) - 1.5 - (i % 7) as f64 * 0.3;
            WeeklyRecord {
                date: format!("w{i}"),
                open,
                high: open.max(close) + 1.5,
                low,
                close,
                volume: 1_000_000.0 + ((i * 7919) % 500_000) as f64,
                volume_average: 1_250_000.0,
            }
        })
        .collect::<Vec<_>>()
        .into()
}

fn bench_predicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicates");
    let evaluator = PredicateEvaluator::new(&ScreenParams::default()).unwrap();
    for n in [520, 5_200] {
        let table = make_table(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, table| {
            b.iter(|| evaluator.evaluate(black_box(table)))
        });
    }
    group.finish();
}

fn bench_screen(c: &mut Criterion) {
    let mut group = c.benchmark_group("screen");
    let params = ScreenParams::default();
    for n in [520, 5_200] {
        let table = make_table(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &table, |b, table| {
            b.iter(|| screen(black_box(table), &params))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_predicates, bench_screen);
criterion_main!(benches);
