//! Property tests for the loop manifold.
//!
//! These check the algebraic identities the estimator relies on: the
//! zero-sum projection, the sign flip of the action under column reversal,
//! and that normalisation and retraction land on `f = 0`.

use hzcap_core::{manifold::ConstraintManifold, symplectic::flip_columns, types::Matrix};
use proptest::prelude::*;

/// Random `(n, m, x)` with `x` a `2n x m` configuration.
fn configuration() -> impl Strategy<Value = (usize, usize, Matrix)> {
    (1usize..=3, 3usize..=9).prop_flat_map(|(n, m)| {
        prop::collection::vec(-1.0f64..1.0, 2 * n * m)
            .prop_map(move |data| (n, m, Matrix::from_vec(2 * n, m, data)))
    })
}

/// Like [`configuration`], with a second matrix of the same shape.
fn configuration_pair() -> impl Strategy<Value = (usize, usize, Matrix, Matrix)> {
    (1usize..=3, 3usize..=9).prop_flat_map(|(n, m)| {
        (
            prop::collection::vec(-1.0f64..1.0, 2 * n * m),
            prop::collection::vec(-1.0f64..1.0, 2 * n * m),
        )
            .prop_map(move |(a, b)| {
                (
                    n,
                    m,
                    Matrix::from_vec(2 * n, m, a),
                    Matrix::from_vec(2 * n, m, b),
                )
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn projection_is_idempotent_and_zero_sum((n, m, x) in configuration()) {
        let manifold = ConstraintManifold::new(n, m);
        let once = manifold.project(&x);
        let twice = manifold.project(&once);

        prop_assert!(ConstraintManifold::column_sums(&once).amax() < 1e-12);
        prop_assert!((&twice - &once).amax() < 1e-12);
    }

    #[test]
    fn column_reversal_negates_the_action((n, m, x) in configuration()) {
        let manifold = ConstraintManifold::new(n, m);
        let flipped = flip_columns(&x);

        let action = manifold.constraint(&x) + 1.0;
        let flipped_action = manifold.constraint(&flipped) + 1.0;
        prop_assert!((action + flipped_action).abs() < 1e-12);
        prop_assert_eq!(flip_columns(&flipped), x);
    }

    #[test]
    fn normalisation_lands_on_the_manifold((n, m, x) in configuration()) {
        let manifold = ConstraintManifold::new(n, m);
        let x = manifold.project(&x);
        prop_assume!((manifold.constraint(&x) + 1.0).abs() > 1e-3);

        let normalized = manifold.normalize(&x).unwrap();
        prop_assert!(manifold.is_point_on_manifold(&normalized, 1e-9));
    }

    #[test]
    fn tangent_projection_removes_the_normal_component((n, m, x, v) in configuration_pair()) {
        let manifold = ConstraintManifold::new(n, m);
        let x = manifold.project(&x);
        prop_assume!((manifold.constraint(&x) + 1.0).abs() > 1e-3);
        let x = manifold.normalize(&x).unwrap();

        let tangent = manifold.project_tangent(&x, &v).unwrap();
        let normal = manifold.constraint_gradient(&x);

        prop_assert!(ConstraintManifold::column_sums(&tangent).amax() < 1e-10);
        prop_assert!(tangent.dot(&normal).abs() < 1e-9 * (1.0 + v.norm() * normal.norm()));

        let again = manifold.project_tangent(&x, &tangent).unwrap();
        prop_assert!((&again - &tangent).amax() < 1e-9 * (1.0 + tangent.amax()));
    }

    #[test]
    fn retraction_lands_on_the_manifold(
        (n, m, x, v) in configuration_pair(),
        fraction in 0.01f64..1.0,
    ) {
        let manifold = ConstraintManifold::new(n, m);
        let x = manifold.project(&x);
        prop_assume!((manifold.constraint(&x) + 1.0).abs() > 1e-3);
        let x = manifold.normalize(&x).unwrap();

        let direction = manifold.project_tangent(&x, &v).unwrap();
        let curvature = manifold.symplectic().action_pairing(&direction);
        prop_assume!(curvature.abs() > 1e-3 * direction.norm_squared());

        let max_step = m as f64 * (3.0 / curvature.abs()).sqrt() / 2.0;
        let retracted = manifold.retract(&x, &direction, fraction * max_step).unwrap();
        prop_assert!(manifold.is_point_on_manifold(&retracted, 1e-8));
    }
}
