use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridworld_mdp::ml::rl::{
    policy_iteration_with, value_iteration_with, GridWorld, GridWorldConfig, State,
};
use std::collections::BTreeMap;

fn board(cols: i32, rows: i32) -> GridWorld {
    let mut terminals = BTreeMap::new();
    terminals.insert(State::new(cols, rows), 1.0);
    terminals.insert(State::new(cols, rows - 1), -1.0);
    GridWorld::new(GridWorldConfig {
        cols,
        rows,
        obstacle: State::new(2, 2),
        terminals,
        ..GridWorldConfig::default()
    })
    .unwrap()
}

fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_world");

    for &(cols, rows) in &[(4, 3), (10, 10), (25, 25)] {
        let world = board(cols, rows);
        let label = format!("{}x{}", cols, rows);

        group.bench_with_input(
            BenchmarkId::new("value_iteration", &label),
            &world,
            |b, world| b.iter(|| value_iteration_with(black_box(world), 1e-5)),
        );
        group.bench_with_input(
            BenchmarkId::new("policy_iteration", &label),
            &world,
            |b, world| b.iter(|| policy_iteration_with(black_box(world), 1e-5)),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_solvers);
criterion_main!(benches);
