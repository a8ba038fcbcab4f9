//! Criterion benchmarks for u-disjunct.
//!
//! Uses seeded random instances so runs are comparable.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_disjunct::cp::Propagator;
use u_disjunct::schedule::{ResourceLayout, ScheduleProblem, TaskSpec};
use u_disjunct::search::SearchConfig;

// ===========================================================================
// Instances
// ===========================================================================

fn two_stage_tasks(n: usize, seed: u64) -> Vec<TaskSpec> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            TaskSpec::two_stage(
                format!("T{i}"),
                rng.random_range(1..10),
                rng.random_range(0..6),
                rng.random_range(1..10),
            )
        })
        .collect()
}

fn single_stage_tasks(n: usize, seed: u64) -> Vec<TaskSpec> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| TaskSpec::single(format!("J{i}"), rng.random_range(1..20)))
        .collect()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_root_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("root_propagation");

    for &n in &[5usize, 10, 20] {
        let built = ScheduleProblem::new(two_stage_tasks(n, 42))
            .build()
            .expect("valid instance");
        group.bench_with_input(BenchmarkId::from_parameter(n), &built, |b, built| {
            b.iter(|| {
                let mut domains = built.model.domains.clone();
                let mut orders = built.model.constraints.initial_orders();
                let stats =
                    Propagator::propagate(&built.model.constraints, &mut domains, &mut orders);
                black_box(stats)
            })
        });
    }
    group.finish();
}

fn bench_two_stage(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_stage");
    group.sample_size(10);

    for &n in &[3usize, 4, 5] {
        for layout in [ResourceLayout::PerStage, ResourceLayout::Shared] {
            let problem = ScheduleProblem::new(two_stage_tasks(n, 7)).with_layout(layout);
            let config = SearchConfig::default().with_node_limit(200_000);
            group.bench_with_input(
                BenchmarkId::new(format!("{layout:?}"), n),
                &(problem, config),
                |b, (p, c)| {
                    b.iter(|| {
                        let report = p.solve(black_box(c));
                        black_box(report)
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_single_machine(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_machine");
    group.sample_size(10);

    for &n in &[4usize, 5, 6] {
        let problem = ScheduleProblem::new(single_stage_tasks(n, 11));
        let config = SearchConfig::default();
        group.bench_with_input(BenchmarkId::from_parameter(n), &(problem, config), |b, (p, c)| {
            b.iter(|| {
                let report = p.solve(black_box(c));
                black_box(report)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_root_propagation,
    bench_two_stage,
    bench_single_machine
);
criterion_main!(benches);
