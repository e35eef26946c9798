//! Legendre transform of a convex Hamiltonian.
//!
//! For a strictly convex `H` the Legendre (Fenchel) transform is
//!
//! ```text
//! G(y) = sup_x <y, x> - H(x) = <y, x*> - H(x*),   dH(x*) = y
//! ```
//!
//! and its gradient is `dG(y) = x* = (dH)^{-1}(y)`. Computing `dG` is the
//! only nontrivial part: a [`LegendreOracle`] either evaluates a closed form
//! supplied by the user ([`AnalyticLegendre`]) or inverts `dH` numerically
//! with the Powell hybrid solver ([`NumericalLegendre`]).
//!
//! [`LegendreTransform`] pairs a Hamiltonian with an oracle and checks every
//! result for shape and finiteness.

use crate::{
    error::{ManifoldError, Result},
    hamiltonian::{Hamiltonian, QuadraticHamiltonian},
    root_finding::{HybridConfig, HybridSolution, HybridSolver},
    types::{constants, Vector},
};
use std::fmt::Debug;

/// Strategy for computing the Legendre gradient `dG = (dH)^{-1}`.
pub trait LegendreOracle: Debug {
    /// Returns `x` such that `dH(x) = y`.
    fn dual_gradient(&self, hamiltonian: &dyn Hamiltonian, y: &Vector) -> Result<Vector>;

    /// Whether the oracle inverts `dH` numerically.
    fn is_numerical(&self) -> bool {
        false
    }
}

impl<O: LegendreOracle + ?Sized> LegendreOracle for Box<O> {
    fn dual_gradient(&self, hamiltonian: &dyn Hamiltonian, y: &Vector) -> Result<Vector> {
        (**self).dual_gradient(hamiltonian, y)
    }

    fn is_numerical(&self) -> bool {
        (**self).is_numerical()
    }
}

/// User-supplied closed-form Legendre gradient.
pub struct AnalyticLegendre<F>
where
    F: Fn(&Vector) -> Vector,
{
    dual_gradient: F,
}

impl<F> AnalyticLegendre<F>
where
    F: Fn(&Vector) -> Vector,
{
    /// Wraps `dual_gradient` as `dG`.
    pub fn new(dual_gradient: F) -> Self {
        Self { dual_gradient }
    }
}

impl<F> Debug for AnalyticLegendre<F>
where
    F: Fn(&Vector) -> Vector,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticLegendre").finish_non_exhaustive()
    }
}

impl<F> LegendreOracle for AnalyticLegendre<F>
where
    F: Fn(&Vector) -> Vector,
{
    fn dual_gradient(&self, _hamiltonian: &dyn Hamiltonian, y: &Vector) -> Result<Vector> {
        Ok((self.dual_gradient)(y))
    }
}

/// A diagonal quadratic body is its own closed-form oracle.
///
/// The oracle is only valid for the body it was built from: the result is
/// checked against `dH` of the Hamiltonian it is paired with, and a mismatch
/// fails with [`ManifoldError::NumericalFailure`].
impl LegendreOracle for QuadraticHamiltonian {
    fn dual_gradient(&self, hamiltonian: &dyn Hamiltonian, y: &Vector) -> Result<Vector> {
        if y.len() != self.weights().len() {
            return Err(ManifoldError::dimension_mismatch(self.weights().len(), y.len()));
        }
        let x = QuadraticHamiltonian::dual_gradient(self, y);
        let mismatch = (hamiltonian.gradient(&x) - y).norm();
        if !(mismatch <= QUADRATIC_ORACLE_TOLERANCE * (1.0 + y.norm())) {
            return Err(ManifoldError::solver_failure(
                "quadratic Legendre oracle does not invert the gradient of the paired Hamiltonian",
                mismatch,
            ));
        }
        Ok(x)
    }
}

const QUADRATIC_ORACLE_TOLERANCE: f64 = 1e-10;

/// Inverts `dH` by solving `dH(x) - y = 0` with the Powell hybrid method.
///
/// Every solve starts from the constant vector
/// [`LEGENDRE_INITIAL_GUESS`](constants::LEGENDRE_INITIAL_GUESS). A solve the
/// solver reports as converged is returned as is. An unconverged solve is
/// still accepted, with a warning, when its residual norm is within the
/// configured `residual_tolerance`; otherwise the call fails with
/// [`ManifoldError::NumericalFailure`] carrying the residual norm.
#[derive(Debug, Clone)]
pub struct NumericalLegendre {
    solver: HybridSolver,
    initial_guess: f64,
}

impl Default for NumericalLegendre {
    fn default() -> Self {
        Self::new(HybridConfig::default())
    }
}

impl NumericalLegendre {
    /// Creates a numerical oracle with the given solver configuration.
    pub fn new(config: HybridConfig) -> Self {
        Self {
            solver: HybridSolver::new(config),
            initial_guess: constants::LEGENDRE_INITIAL_GUESS,
        }
    }

    /// Sets the value of every coordinate of the initial guess.
    pub fn with_initial_guess(mut self, value: f64) -> Self {
        self.initial_guess = value;
        self
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &HybridConfig {
        self.solver.config()
    }

    /// Runs the root finder for `dH(x) = y` and returns the raw solution.
    pub fn solve(&self, hamiltonian: &dyn Hamiltonian, y: &Vector) -> Result<HybridSolution> {
        let x0 = Vector::from_element(y.len(), self.initial_guess);
        self.solver.solve(|x| hamiltonian.gradient(x) - y, &x0)
    }
}

impl LegendreOracle for NumericalLegendre {
    fn dual_gradient(&self, hamiltonian: &dyn Hamiltonian, y: &Vector) -> Result<Vector> {
        let solution = self.solve(hamiltonian, y)?;
        let tolerance = self.solver.config().residual_tolerance;

        if solution.converged() && solution.residual_norm <= tolerance {
            return Ok(solution.x);
        }
        if solution.residual_norm <= tolerance {
            log::warn!(
                "Legendre inversion stopped with status {:?} after {} evaluations; accepting residual {:e}",
                solution.status,
                solution.function_evaluations,
                solution.residual_norm
            );
            return Ok(solution.x);
        }
        Err(ManifoldError::solver_failure(
            format!(
                "could not solve dH(x) = y (status {:?}, {} evaluations)",
                solution.status, solution.function_evaluations
            ),
            solution.residual_norm,
        ))
    }

    fn is_numerical(&self) -> bool {
        true
    }
}

/// The Legendre transform `G` of a Hamiltonian and its gradient `dG`.
#[derive(Debug, Clone, Copy)]
pub struct LegendreTransform<'a> {
    hamiltonian: &'a dyn Hamiltonian,
    oracle: &'a dyn LegendreOracle,
    dim: usize,
}

impl<'a> LegendreTransform<'a> {
    /// Pairs `hamiltonian` with `oracle` on R^{dim}.
    pub fn new(
        hamiltonian: &'a dyn Hamiltonian,
        oracle: &'a dyn LegendreOracle,
        dim: usize,
    ) -> Self {
        Self {
            hamiltonian,
            oracle,
            dim,
        }
    }

    /// Dimension of the phase space.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// Computes `dG(y)`, the point `x` with `dH(x) = y`.
    pub fn gradient(&self, y: &Vector) -> Result<Vector> {
        if y.len() != self.dim {
            return Err(ManifoldError::dimension_mismatch(self.dim, y.len()));
        }
        let x = self.oracle.dual_gradient(self.hamiltonian, y)?;
        if x.len() != self.dim {
            return Err(ManifoldError::dimension_mismatch(
                format!("Legendre gradient of length {}", self.dim),
                x.len(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ManifoldError::numerical_failure(
                "Legendre gradient returned a non-finite vector",
            ));
        }
        Ok(x)
    }

    /// Computes `G(y) = <y, x> - H(x)` together with `x = dG(y)`.
    pub fn value_and_gradient(&self, y: &Vector) -> Result<(f64, Vector)> {
        let x = self.gradient(y)?;
        let value = y.dot(&x) - self.hamiltonian.value(&x);
        if !value.is_finite() {
            return Err(ManifoldError::numerical_failure(format!(
                "Legendre transform is not finite at |y| = {}",
                y.norm()
            )));
        }
        Ok((value, x))
    }

    /// Computes `G(y)`.
    pub fn value(&self, y: &Vector) -> Result<f64> {
        self.value_and_gradient(y).map(|(value, _)| value)
    }
}
