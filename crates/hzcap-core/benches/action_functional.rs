//! Benchmarks of the action functional and manifold operations.
//!
//! The numerical Legendre oracle dominates a run, so `F`/`dF` are measured
//! with both the closed-form and the root-finding oracle.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hzcap_core::{
    hamiltonian::QuadraticHamiltonian,
    legendre::{LegendreTransform, NumericalLegendre},
    manifold::ConstraintManifold,
    objective::ActionFunctional,
};
use rand::{rngs::StdRng, SeedableRng};

fn bench_action_functional(c: &mut Criterion) {
    let mut group = c.benchmark_group("action_functional");
    let ball = QuadraticHamiltonian::unit_ball(2);
    let numerical = NumericalLegendre::default();

    for m in [10, 50, 200] {
        let manifold = ConstraintManifold::new(2, m);
        let mut rng = StdRng::seed_from_u64(0);
        let x = manifold
            .random_point(&mut rng, 1e-12, 1_000)
            .expect("sampling should succeed");

        let analytic = ActionFunctional::new(
            LegendreTransform::new(&ball, &ball, 4),
            manifold.symplectic(),
            m,
        );
        group.bench_with_input(BenchmarkId::new("analytic", m), &m, |b, _| {
            b.iter(|| analytic.value_and_gradient(black_box(&x)).unwrap());
        });

        let root_finding = ActionFunctional::new(
            LegendreTransform::new(&ball, &numerical, 4),
            manifold.symplectic(),
            m,
        );
        group.bench_with_input(BenchmarkId::new("numerical", m), &m, |b, _| {
            b.iter(|| root_finding.value_and_gradient(black_box(&x)).unwrap());
        });
    }

    group.finish();
}

fn bench_manifold_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifold_operations");

    for m in [10, 50, 200] {
        let manifold = ConstraintManifold::new(2, m);
        let mut rng = StdRng::seed_from_u64(1);
        let x = manifold
            .random_point(&mut rng, 1e-12, 1_000)
            .expect("sampling should succeed");
        let v = manifold
            .random_point(&mut rng, 1e-12, 1_000)
            .expect("sampling should succeed");

        group.bench_with_input(BenchmarkId::new("constraint_gradient", m), &m, |b, _| {
            b.iter(|| manifold.constraint_gradient(black_box(&x)));
        });
        group.bench_with_input(BenchmarkId::new("project_tangent", m), &m, |b, _| {
            b.iter(|| manifold.project_tangent(black_box(&x), black_box(&v)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_action_functional, bench_manifold_operations);
criterion_main!(benches);
