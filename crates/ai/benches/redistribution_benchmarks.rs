use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use shelfwise_ai::{DemandRecord, RedistributionPlanner};
use shelfwise_core::{BookId, BranchId};

/// Deterministic demand grid: alternating over- and under-stocked branches.
fn demand_grid(books: i64, branches: i64) -> Vec<DemandRecord> {
    let mut out = Vec::with_capacity((books * branches) as usize);
    for book in 1..=books {
        for branch in 1..=branches {
            let predicted = ((book * 7 + branch * 13) % 17) as f64 * 0.75;
            let copies = ((book * 3 + branch * 5) % 12) as u32;
            out.push(DemandRecord::new(
                BookId::new(book),
                BranchId::new(branch),
                predicted,
                copies,
                3000,
            ));
        }
    }
    out
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("redistribution_plan");

    for (books, branches) in [(80, 5), (500, 10), (2000, 25)] {
        let records = demand_grid(books, branches);
        group.throughput(Throughput::Elements(records.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("capped", format!("{books}x{branches}")),
            &records,
            |b, records| {
                let planner = RedistributionPlanner::new();
                b.iter(|| planner.plan(black_box(records)).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("uncapped", format!("{books}x{branches}")),
            &records,
            |b, records| {
                let planner = RedistributionPlanner::new().with_max_suggestions(usize::MAX);
                b.iter(|| planner.plan(black_box(records)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
