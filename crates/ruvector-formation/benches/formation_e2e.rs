//! End-to-end benchmarks for the transition planner.
//!
//! Measures the full `plan` path: validation, cost matrix, matching,
//! per-pair durations and synchronisation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ruvector_formation::{
    CardinalityPolicy, KinematicLimits, MatchingMethod, PlannerConfig, PointCloud, SyncMode,
    TransitionPlanner,
};

fn random_cloud(n: usize, extent: f64, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let triples: Vec<[f64; 3]> = (0..n)
        .map(|_| {
            [
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(0.0..extent),
            ]
        })
        .collect();
    PointCloud::from_triples(&triples).unwrap()
}

fn show_limits() -> KinematicLimits {
    KinematicLimits::new(6.0, 2.0, 3.0)
        .with_max_velocity_z_up(1.5)
        .with_max_jerk(8.0)
}

fn plan_optimal(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_e2e");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(1));

    let limits = show_limits();
    for &n in &[100usize, 500, 1_000] {
        let source = random_cloud(n, 60.0, 10);
        let target = random_cloud(n, 60.0, 11);
        group.throughput(Throughput::Elements(n as u64));

        for (label, method) in [("optimal", MatchingMethod::Optimal), ("greedy", MatchingMethod::Greedy)] {
            let planner = TransitionPlanner::new(PlannerConfig::new(method, SyncMode::Synchronized));
            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| black_box(planner.plan(&source, &target, &limits).unwrap()));
            });
        }
    }
    group.finish();
}

fn plan_partial(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_partial");
    group.sample_size(10);

    let limits = show_limits();
    let planner = TransitionPlanner::new(
        PlannerConfig::new(MatchingMethod::Optimal, SyncMode::Independent)
            .with_cardinality(CardinalityPolicy::Partial),
    );
    for &n in &[100usize, 400] {
        let source = random_cloud(n, 60.0, 20);
        let target = random_cloud(n + n / 4, 60.0, 21);
        group.bench_with_input(BenchmarkId::new("surplus_targets", n), &n, |b, _| {
            b.iter(|| black_box(planner.plan(&source, &target, &limits).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(e2e, plan_optimal, plan_partial);
criterion_main!(e2e);
