//! Criterion benchmarks of a single planning call on the reference glider.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use soar::glider::{GliderConfig, GliderModel, State, ThermalZone, Zone};
use soar::mcts::{Config, Planner};

fn plan(c: &mut Criterion) {
    let model = GliderModel::new(
        &GliderConfig::default(),
        Zone::Thermal(ThermalZone::default()),
        0.01,
    );
    let state = State::default();

    let mut group = c.benchmark_group("plan");
    for budget in [10, 100, 1000] {
        let _ = group.throughput(Throughput::Elements(u64::from(budget)));
        let mut planner = Planner::new(
            model.clone(),
            Config::with_budget(budget),
            ChaCha8Rng::seed_from_u64(0),
        );
        let _ = group.bench_with_input(BenchmarkId::from_parameter(budget), &state, |b, state| {
            b.iter(|| planner.plan(black_box(state)));
        });
    }
    group.finish();
}

fn rollout(c: &mut Criterion) {
    let model = GliderModel::new(&GliderConfig::default(), Zone::default(), 0.01);
    let mut planner = Planner::new(model, Config::default(), ChaCha8Rng::seed_from_u64(0));
    let state = State::default();
    let _ = c.bench_function("rollout", |b| {
        b.iter(|| planner.rollout(black_box(&state)));
    });
}

criterion_group! {
    name = planner;
    config = Criterion::default().sample_size(20);
    targets = plan, rollout
}
criterion_main!(planner);
