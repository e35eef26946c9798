//! Consistency between closed-form and root-finding Legendre gradients.

use approx::assert_relative_eq;
use hzcap_core::{
    hamiltonian::{FnHamiltonian, Hamiltonian, QuadraticHamiltonian},
    legendre::{AnalyticLegendre, LegendreOracle, LegendreTransform, NumericalLegendre},
    manifold::ConstraintManifold,
    objective::ActionFunctional,
    root_finding::HybridConfig,
    types::Vector,
};
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn numerical_gradient_inverts_dh_for_convex_quartic() {
    // H(x) = sum x_i^2 / 2 + x_i^4 / 4 has dH(x)_i = x_i + x_i^3.
    let h = FnHamiltonian::new(
        |x: &Vector| x.iter().map(|v| 0.5 * v * v + 0.25 * v.powi(4)).sum(),
        |x: &Vector| x.map(|v| v + v.powi(3)),
    );
    let oracle = NumericalLegendre::default();
    let legendre = LegendreTransform::new(&h, &oracle, 4);

    let y = Vector::from_vec(vec![0.3, -1.2, 2.5, 0.0]);
    let x = legendre.gradient(&y).unwrap();
    assert!((h.gradient(&x) - &y).norm() < 1e-6);

    // Fenchel equality G(y) + H(x) = <x, y> at x = dG(y)
    let g = legendre.value(&y).unwrap();
    assert_relative_eq!(g + h.value(&x), x.dot(&y), epsilon = 1e-12);
}

#[test]
fn ellipsoid_oracles_agree() {
    let ellipsoid = QuadraticHamiltonian::ellipsoid(&[1.0, 3.0]).unwrap();
    let numerical = NumericalLegendre::new(HybridConfig::default().with_xtol(1e-12));
    let weights = ellipsoid.weights().clone();
    let closure = AnalyticLegendre::new(move |y: &Vector| y.component_div(&(&weights * 2.0)));

    let y = Vector::from_vec(vec![1.0, -0.5, 0.25, 2.0]);
    let exact = ellipsoid.dual_gradient(&y);
    assert_relative_eq!(
        LegendreOracle::dual_gradient(&ellipsoid, &ellipsoid, &y).unwrap(),
        exact,
        epsilon = 1e-14
    );
    assert_relative_eq!(
        closure.dual_gradient(&ellipsoid, &y).unwrap(),
        exact,
        epsilon = 1e-14
    );
    assert_relative_eq!(
        numerical.dual_gradient(&ellipsoid, &y).unwrap(),
        exact,
        epsilon = 1e-8
    );
}

#[test]
fn action_functional_is_oracle_independent() {
    let ball = QuadraticHamiltonian::unit_ball(1);
    let numerical = NumericalLegendre::default();
    let manifold = ConstraintManifold::new(1, 7);

    let mut rng = StdRng::seed_from_u64(3);
    let x = manifold.random_point(&mut rng, 1e-12, 100).unwrap();

    let exact = ActionFunctional::new(LegendreTransform::new(&ball, &ball, 2), manifold.symplectic(), 7);
    let solved = ActionFunctional::new(
        LegendreTransform::new(&ball, &numerical, 2),
        manifold.symplectic(),
        7,
    );

    let (f_exact, df_exact) = exact.value_and_gradient(&x).unwrap();
    let (f_approx, df_approx) = solved.value_and_gradient(&x).unwrap();
    assert_relative_eq!(f_exact, f_approx, epsilon = 1e-9);
    assert_relative_eq!(df_exact, df_approx, epsilon = 1e-8);

    // On the manifold the unit-ball action is |x|^2 / (4m)
    assert_relative_eq!(f_exact, x.norm_squared() / 28.0, epsilon = 1e-14);
}
