//! Powell hybrid root finder for square nonlinear systems.
//!
//! Solves `F(x) = 0` for `F: R^N -> R^N` without derivatives, in the style of
//! MINPACK's `hybrd`:
//!
//! 1. Approximate the Jacobian by forward differences
//! 2. Compute a dogleg step between the Gauss-Newton step and the Cauchy
//!    point of `1/2 |F|^2`, restricted to the trust region
//! 3. Compare actual and predicted reduction of `|F|` to accept or reject
//!    the step and to resize the trust region
//! 4. Update the Jacobian with a Broyden rank-one correction after every
//!    step, and recompute it by finite differences after repeated failures
//!
//! The solver never fails on a bad system: it always reports the best point
//! it reached together with a [`SolverStatus`], leaving the acceptance policy
//! to the caller.

use crate::{
    error::{ManifoldError, Result},
    types::{constants, Matrix, Vector},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`HybridSolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HybridConfig {
    /// Relative tolerance on the trust-region radius: the solve stops once
    /// the radius drops below `xtol * |x|`.
    pub xtol: f64,
    /// Absolute tolerance on the residual norm `|F(x)|`.
    pub ftol: f64,
    /// Budget of function evaluations; `200 * (N + 1)` when unset.
    pub max_evaluations: Option<usize>,
    /// Initial trust radius as a multiple of `|x0|` (or absolute if `x0 = 0`).
    pub step_bound_factor: f64,
    /// Relative forward-difference step for the Jacobian.
    pub fd_step: f64,
    /// Largest residual norm accepted when the trust region collapses, and
    /// the largest a caller should accept from an unconverged solve.
    pub residual_tolerance: f64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            xtol: constants::ROOT_XTOL,
            ftol: 1e-14,
            max_evaluations: None,
            step_bound_factor: 100.0,
            fd_step: f64::EPSILON.sqrt(),
            residual_tolerance: 1e-6,
        }
    }
}

impl HybridConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relative step tolerance.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Sets the absolute residual tolerance.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Sets the function evaluation budget.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = Some(max_evaluations);
        self
    }

    /// Sets the initial trust radius factor.
    pub fn with_step_bound_factor(mut self, factor: f64) -> Self {
        self.step_bound_factor = factor;
        self
    }

    /// Sets the relative forward-difference step.
    pub fn with_fd_step(mut self, fd_step: f64) -> Self {
        self.fd_step = fd_step;
        self
    }

    /// Sets the largest residual norm accepted from an unconverged solve.
    pub fn with_residual_tolerance(mut self, tolerance: f64) -> Self {
        self.residual_tolerance = tolerance;
        self
    }
}

/// Why the hybrid solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SolverStatus {
    /// Residual below `ftol`, or trust radius below `xtol * |x|` with the
    /// residual within `residual_tolerance`.
    Converged,
    /// The function evaluation budget was exhausted.
    MaxEvaluations,
    /// Ten consecutive steps produced almost no reduction of `|F|`.
    NotMakingProgress,
    /// The trust radius fell below `xtol * |x|` while the residual was
    /// still above `residual_tolerance`.
    TrustRegionCollapsed,
    /// `F` returned a non-finite value at the initial point.
    NonFinite,
}

/// Outcome of a hybrid solve.
#[derive(Debug, Clone)]
pub struct HybridSolution {
    /// Best point found.
    pub x: Vector,
    /// `F(x)` at the best point.
    pub residual: Vector,
    /// `|F(x)|` at the best point.
    pub residual_norm: f64,
    /// Number of dogleg iterations performed.
    pub iterations: usize,
    /// Number of evaluations of `F` (including finite differences).
    pub function_evaluations: usize,
    /// Number of finite-difference Jacobians computed.
    pub jacobian_evaluations: usize,
    /// Stopping reason.
    pub status: SolverStatus,
}

impl HybridSolution {
    /// Whether the solver reported convergence.
    pub fn converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// Derivative-free Powell hybrid solver.
#[derive(Debug, Clone, Default)]
pub struct HybridSolver {
    config: HybridConfig,
}

struct Counters {
    evaluations: usize,
    jacobians: usize,
}

impl HybridSolver {
    /// Creates a solver with the given configuration.
    pub fn new(config: HybridConfig) -> Self {
        Self { config }
    }

    /// Returns the solver configuration.
    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Solves `system(x) = 0` starting from `x0`.
    ///
    /// Returns an error only when `system` returns a vector whose length
    /// differs from `x0`.
    pub fn solve<F>(&self, mut system: F, x0: &Vector) -> Result<HybridSolution>
    where
        F: FnMut(&Vector) -> Vector,
    {
        let dim = x0.len();
        let max_evaluations = self.config.max_evaluations.unwrap_or(200 * (dim + 1));
        let mut counters = Counters {
            evaluations: 0,
            jacobians: 0,
        };

        let mut x = x0.clone();
        let mut fx = evaluate(&mut system, &x, &mut counters)?;
        let mut fnorm = fx.norm();
        let finish = |x: Vector,
                      fx: Vector,
                      iterations: usize,
                      counters: &Counters,
                      status: SolverStatus|
         -> Result<HybridSolution> {
            let residual_norm = fx.norm();
            log::debug!(
                "hybrid solve: {status:?} after {iterations} iterations, {} evaluations, |F(x)| = {residual_norm:e}",
                counters.evaluations
            );
            Ok(HybridSolution {
                residual_norm,
                x,
                residual: fx,
                iterations,
                function_evaluations: counters.evaluations,
                jacobian_evaluations: counters.jacobians,
                status,
            })
        };

        if !fnorm.is_finite() {
            return finish(x, fx, 0, &counters, SolverStatus::NonFinite);
        }
        if fnorm <= self.config.ftol {
            return finish(x, fx, 0, &counters, SolverStatus::Converged);
        }

        let mut jac = self.forward_difference_jacobian(&mut system, &x, &fx, &mut counters)?;
        let mut delta = self.config.step_bound_factor * x.norm();
        if delta == 0.0 {
            delta = self.config.step_bound_factor;
        }

        let mut iterations = 0;
        let mut successes = 0usize;
        let mut failures = 0usize;
        let mut slow = 0usize;

        loop {
            if counters.evaluations >= max_evaluations {
                return finish(x, fx, iterations, &counters, SolverStatus::MaxEvaluations);
            }
            iterations += 1;

            let step = dogleg(&jac, &fx, delta);
            let pnorm = step.norm();
            if iterations == 1 {
                delta = delta.min(pnorm);
            }

            let x_trial = &x + &step;
            let f_trial = evaluate(&mut system, &x_trial, &mut counters)?;
            let trial_norm = f_trial.norm();

            let predicted_norm = (&fx + &jac * &step).norm();
            let actual_reduction = if trial_norm.is_finite() && trial_norm < fnorm {
                1.0 - (trial_norm / fnorm).powi(2)
            } else {
                -1.0
            };
            let predicted_reduction = if predicted_norm < fnorm {
                1.0 - (predicted_norm / fnorm).powi(2)
            } else {
                0.0
            };
            let ratio = if predicted_reduction > 0.0 {
                actual_reduction / predicted_reduction
            } else {
                0.0
            };

            if ratio < 0.1 {
                successes = 0;
                failures += 1;
                delta *= 0.5;
            } else {
                failures = 0;
                successes += 1;
                if ratio >= 0.5 || successes > 1 {
                    delta = delta.max(2.0 * pnorm);
                }
                if (ratio - 1.0).abs() <= 0.1 {
                    delta = 2.0 * pnorm;
                }
            }

            // Broyden update of the Jacobian along the attempted step.
            if trial_norm.is_finite() && pnorm > 0.0 {
                let secant_error = (&f_trial - &fx) - &jac * &step;
                jac += secant_error * step.transpose() / (pnorm * pnorm);
            }

            if ratio >= 1e-4 {
                x = x_trial;
                fx = f_trial;
                fnorm = trial_norm;
            }

            if fnorm <= self.config.ftol {
                return finish(x, fx, iterations, &counters, SolverStatus::Converged);
            }
            if delta <= self.config.xtol * x.norm() {
                let status = if fnorm <= self.config.residual_tolerance {
                    SolverStatus::Converged
                } else {
                    SolverStatus::TrustRegionCollapsed
                };
                return finish(x, fx, iterations, &counters, status);
            }

            if actual_reduction >= 1e-3 {
                slow = 0;
            } else {
                slow += 1;
            }
            if slow >= 10 {
                return finish(x, fx, iterations, &counters, SolverStatus::NotMakingProgress);
            }

            if failures >= 2 {
                jac = self.forward_difference_jacobian(&mut system, &x, &fx, &mut counters)?;
                failures = 0;
            }
        }
    }

    fn forward_difference_jacobian<F>(
        &self,
        system: &mut F,
        x: &Vector,
        fx: &Vector,
        counters: &mut Counters,
    ) -> Result<Matrix>
    where
        F: FnMut(&Vector) -> Vector,
    {
        counters.jacobians += 1;
        let dim = x.len();
        let mut jac = Matrix::zeros(fx.len(), dim);
        let mut shifted = x.clone();
        for j in 0..dim {
            let mut h = self.config.fd_step * x[j].abs();
            if h == 0.0 {
                h = self.config.fd_step;
            }
            shifted[j] = x[j] + h;
            let f_shifted = evaluate(system, &shifted, counters)?;
            jac.set_column(j, &((f_shifted - fx) / h));
            shifted[j] = x[j];
        }
        Ok(jac)
    }
}

fn evaluate<F>(system: &mut F, x: &Vector, counters: &mut Counters) -> Result<Vector>
where
    F: FnMut(&Vector) -> Vector,
{
    counters.evaluations += 1;
    let fx = system(x);
    if fx.len() != x.len() {
        return Err(ManifoldError::dimension_mismatch(x.len(), fx.len()));
    }
    Ok(fx)
}

/// Powell's dogleg step for the linear model `f + J p` within radius `delta`.
fn dogleg(jac: &Matrix, f: &Vector, delta: f64) -> Vector {
    let gauss_newton = jac
        .clone()
        .lu()
        .solve(&(-f))
        .filter(|p| p.iter().all(|v| v.is_finite()));

    if let Some(gn) = &gauss_newton {
        if gn.norm() <= delta {
            return gn.clone();
        }
    }

    // Steepest descent direction of 1/2 |f + J p|^2 at p = 0.
    let gradient = -(jac.transpose() * f);
    let gnorm = gradient.norm();
    if gnorm == 0.0 {
        return gauss_newton.map_or_else(|| Vector::zeros(f.len()), |gn| {
            let n = gn.norm();
            gn * (delta / n)
        });
    }

    let jg_norm_sq = (jac * &gradient).norm_squared();
    if jg_norm_sq == 0.0 {
        return gradient * (delta / gnorm);
    }
    let alpha = gnorm * gnorm / jg_norm_sq;
    let Some(gn) = gauss_newton else {
        return gradient * (delta.min(alpha * gnorm) / gnorm);
    };
    if alpha * gnorm >= delta {
        return gradient * (delta / gnorm);
    }

    // Walk from the Cauchy point towards the Gauss-Newton point until the
    // path leaves the trust region.
    let cauchy = gradient * alpha;
    let d = gn - &cauchy;
    let a = d.norm_squared();
    let b = 2.0 * cauchy.dot(&d);
    let c = cauchy.norm_squared() - delta * delta;
    let tau = (-b + (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
    cauchy + d * tau
}
