use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rollstock_core::RollId;
use rollstock_inventory::{DailyOccupancy, Roll, StatsWindow, compute_stats};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
}

/// Deterministic synthetic stock: every third roll is still active, the rest
/// stay between 1 and 45 days.
fn synthetic_rolls(n: usize) -> Vec<Roll> {
    (0..n)
        .map(|i| {
            let added = base() + Duration::hours((i as i64 * 7) % (300 * 24));
            let removed = (i % 3 != 0).then(|| added + Duration::days(1 + (i as i64 % 45)));
            Roll {
                id: RollId::new(i as i64 + 1),
                length: 5.0 + (i % 50) as f64,
                weight: 100.0 + (i % 400) as f64,
                added_date: added,
                removed_date: removed,
            }
        })
        .collect()
}

fn bench_compute_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_stats");
    let window = StatsWindow::new(base(), base() + Duration::days(365)).unwrap();
    let as_of = base() + Duration::days(365);

    for size in [100usize, 1_000, 10_000] {
        let rolls = synthetic_rolls(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rolls, |b, rolls| {
            b.iter(|| compute_stats(black_box(rolls), &window, as_of).unwrap());
        });
    }

    group.finish();
}

fn bench_daily_occupancy(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_occupancy");
    let as_of = base() + Duration::days(365);

    // Long-lived active rolls dominate the per-day walk.
    let rolls: Vec<Roll> = synthetic_rolls(1_000)
        .into_iter()
        .map(|mut r| {
            r.removed_date = None;
            r
        })
        .collect();

    group.bench_function("active_rolls_one_year", |b| {
        b.iter(|| DailyOccupancy::from_rolls(black_box(&rolls), as_of));
    });

    group.finish();
}

criterion_group!(benches, bench_compute_stats, bench_daily_occupancy);
criterion_main!(benches);
