//! Projected-gradient estimator of the Hofer-Zehnder capacity.
//!
//! The estimator minimises the discrete action functional `F` over the
//! manifold of zero-sum loops with unit discrete action. Each iteration
//! projects `-dF` onto the tangent space of the manifold, picks a step size
//! from a curvature bound and a secant estimate, and backtracks on that step
//! until the retracted point keeps a quarter of the unretracted decrease.
//!
//! # Example
//!
//! ```rust,no_run
//! use hzcap_core::hamiltonian::QuadraticHamiltonian;
//! use hzcap_optim::{EstimateOptions, EstimatorConfig, HZCapacityEstimator};
//!
//! let ball = QuadraticHamiltonian::unit_ball(1);
//! let oracle = Box::new(ball.clone());
//! let estimator =
//!     HZCapacityEstimator::with_oracle(EstimatorConfig::new(1, 50)?, ball, oracle)?;
//! let result = estimator.estimate(&EstimateOptions::default())?;
//! println!("capacity ~ {}", result.capacity);
//! # Ok::<(), hzcap_core::EstimatorError>(())
//! ```

use crate::{
    callback::{EstimationCallback, EstimationSummary, IterationInfo, NoOpCallback, StartInfo, StepInfo},
    config::{EstimateOptions, EstimatorConfig},
    result::{EstimationResult, TerminationReason},
};
use hzcap_core::{
    error::{EstimatorError, EstimatorResult},
    hamiltonian::Hamiltonian,
    legendre::{AnalyticLegendre, LegendreOracle, LegendreTransform, NumericalLegendre},
    manifold::ConstraintManifold,
    objective::ActionFunctional,
    types::{Matrix, Vector},
};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Instant;

/// Hofer-Zehnder capacity estimator for the convex body `{H <= 1}`.
///
/// The estimator owns the Hamiltonian and the oracle computing `dG`; the
/// iterate lives only for the duration of one [`estimate`](Self::estimate)
/// call, so repeated calls are independent and reproducible for a fixed
/// seed.
#[derive(Debug)]
pub struct HZCapacityEstimator<H: Hamiltonian> {
    config: EstimatorConfig,
    hamiltonian: H,
    oracle: Box<dyn LegendreOracle>,
    manifold: ConstraintManifold,
}

impl<H: Hamiltonian> HZCapacityEstimator<H> {
    /// Creates an estimator that computes `dG` by inverting `dH` numerically.
    pub fn new(config: EstimatorConfig, hamiltonian: H) -> EstimatorResult<Self> {
        log::info!("Gradient of the Legendre transform of H will be estimated numerically.");
        Self::with_oracle(config, hamiltonian, Box::new(NumericalLegendre::default()))
    }

    /// Creates an estimator with a closed-form `dG`.
    pub fn with_legendre_gradient<F>(
        config: EstimatorConfig,
        hamiltonian: H,
        legendre_gradient: F,
    ) -> EstimatorResult<Self>
    where
        F: Fn(&Vector) -> Vector + 'static,
    {
        Self::with_oracle(
            config,
            hamiltonian,
            Box::new(AnalyticLegendre::new(legendre_gradient)),
        )
    }

    /// Creates an estimator with an arbitrary Legendre oracle.
    pub fn with_oracle(
        config: EstimatorConfig,
        hamiltonian: H,
        oracle: Box<dyn LegendreOracle>,
    ) -> EstimatorResult<Self> {
        config.validate()?;
        Ok(Self {
            manifold: ConstraintManifold::new(config.n, config.m),
            config,
            hamiltonian,
            oracle,
        })
    }

    /// Creates an estimator with a numerical `dG`, clamping `n` to at least 1
    /// and `m` to at least 3 instead of rejecting them.
    pub fn from_raw(n: usize, m: usize, hamiltonian: H) -> Self {
        let config = EstimatorConfig::clamped(n, m);
        log::info!("Gradient of the Legendre transform of H will be estimated numerically.");
        Self {
            manifold: ConstraintManifold::new(config.n, config.m),
            config,
            hamiltonian,
            oracle: Box::new(NumericalLegendre::default()),
        }
    }

    /// Problem size.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// The Hamiltonian defining the body.
    pub fn hamiltonian(&self) -> &H {
        &self.hamiltonian
    }

    /// The constraint manifold the iteration runs on.
    pub fn manifold(&self) -> &ConstraintManifold {
        &self.manifold
    }

    /// Whether `dG` is computed by root finding.
    pub fn uses_numerical_legendre(&self) -> bool {
        self.oracle.is_numerical()
    }

    fn legendre(&self) -> LegendreTransform<'_> {
        LegendreTransform::new(
            &self.hamiltonian,
            self.oracle.as_ref(),
            self.config.dimension(),
        )
    }

    /// Evaluates `dG(y)`.
    pub fn legendre_gradient(&self, y: &Vector) -> EstimatorResult<Vector> {
        Ok(self.legendre().gradient(y)?)
    }

    /// Evaluates `G(y)`.
    pub fn legendre_value(&self, y: &Vector) -> EstimatorResult<f64> {
        Ok(self.legendre().value(y)?)
    }

    /// Runs [`estimate`](Self::estimate) with default options and returns
    /// only the capacity.
    pub fn capacity(&self) -> EstimatorResult<f64> {
        self.estimate(&EstimateOptions::default())
            .map(|result| result.capacity)
    }

    /// Estimates the capacity.
    pub fn estimate(&self, options: &EstimateOptions) -> EstimatorResult<EstimationResult> {
        self.estimate_with_callback(options, &mut NoOpCallback)
    }

    /// Estimates the capacity, reporting progress to `callback`.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid, no starting point is
    /// found within the sampling budget, a Legendre gradient cannot be
    /// computed, the tangent direction degenerates, or the line search runs
    /// out of halvings.
    pub fn estimate_with_callback<C>(
        &self,
        options: &EstimateOptions,
        callback: &mut C,
    ) -> EstimatorResult<EstimationResult>
    where
        C: EstimationCallback + ?Sized,
    {
        options.validate()?;
        let start_time = Instant::now();

        let functional = ActionFunctional::new(
            self.legendre(),
            self.manifold.symplectic(),
            self.config.m,
        );
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut x = self.manifold.random_point(
            &mut rng,
            options.epsilon,
            options.max_sampling_attempts,
        )?;
        let (mut action, mut gradient) = functional.value_and_gradient(&x)?;

        callback.on_estimation_start(&StartInfo {
            initial_point: &x,
            initial_action: action,
            numerical_legendre: self.uses_numerical_legendre(),
        })?;

        let mut termination_reason = TerminationReason::MaxIterations;
        let mut tangent_norm_sq = f64::INFINITY;
        let mut total_backtracks = 0;
        let mut iterations = 0;

        for k in 1..=options.iterations {
            iterations = k;
            let constraint = self.manifold.constraint(&x);
            if options.verbose {
                log::info!("At k = {k}, F(x) = {action}, f(x) = {constraint}");
            }

            let y_hat = self.manifold.project_tangent(&x, &(-&gradient))?;
            tangent_norm_sq = y_hat.norm_squared();

            let keep_going = callback.on_iteration_end(&IterationInfo {
                iteration: k,
                action,
                constraint,
                tangent_gradient_norm_sq: tangent_norm_sq,
                point: &x,
                elapsed: start_time.elapsed(),
            })?;

            if tangent_norm_sq < options.epsilon {
                if options.verbose {
                    log::info!("Early stop at iteration {k}");
                }
                termination_reason = TerminationReason::Converged;
                break;
            }
            if !keep_going {
                termination_reason = TerminationReason::CallbackRequest;
                break;
            }

            let step = self.line_search(&functional, &x, action, &y_hat, k, options)?;
            total_backtracks += step.info.backtracks;
            callback.on_step_accepted(&step.info)?;

            x = step.point;
            (action, gradient) = functional.value_and_gradient(&x)?;
        }

        let capacity = 2.0 * action;
        if options.verbose {
            log::info!("Estimated capacity: {capacity}");
        }

        callback.on_estimation_end(&EstimationSummary {
            point: &x,
            capacity,
            iterations,
            termination_reason,
            elapsed: start_time.elapsed(),
        })?;

        Ok(EstimationResult {
            capacity,
            action,
            constraint_residual: self.manifold.constraint(&x),
            iterations,
            tangent_gradient_norm_sq: tangent_norm_sq,
            legendre_evaluations: functional.legendre_evaluations(),
            backtracks: total_backtracks,
            duration: start_time.elapsed(),
            termination_reason,
            converged: termination_reason == TerminationReason::Converged,
            point: x,
        })
    }

    /// Chooses a step along `y_hat` and backtracks until the retracted step
    /// satisfies `4 del_2 > del_1`.
    fn line_search(
        &self,
        functional: &ActionFunctional<'_>,
        x: &Matrix,
        action: f64,
        y_hat: &Matrix,
        iteration: usize,
        options: &EstimateOptions,
    ) -> EstimatorResult<AcceptedStep> {
        let curvature = self.manifold.symplectic().action_pairing(y_hat);
        if !(curvature.is_finite() && curvature != 0.0) {
            return Err(EstimatorError::numerical_failure(
                format!("zero or non-finite action along the search direction ({curvature:e})"),
                iteration,
            ));
        }

        let m = self.config.m as f64;
        let max_step = m * (3.0 / curvature.abs()).sqrt() / 2.0;

        // Secant estimate of the zero of the directional derivative on [0, L_max]
        let slope_at_max = -y_hat.dot(&functional.gradient(&(x + y_hat * max_step))?);
        let slope_at_zero = y_hat.norm_squared();
        let initial_step = if slope_at_max >= 0.0 {
            max_step
        } else {
            max_step * slope_at_zero / (slope_at_zero - slope_at_max)
        };

        let mut step_size = initial_step;
        for backtracks in 0..options.max_backtracks {
            let raw = x + y_hat * step_size;
            let retracted = self.manifold.retract(x, y_hat, step_size)?;
            let raw_decrease = action - functional.value(&raw)?;
            let retracted_decrease = action - functional.value(&retracted)?;

            log::debug!(
                "iteration {iteration}, trial {backtracks}: L = {step_size:e}, del_1 = {raw_decrease:e}, del_2 = {retracted_decrease:e}"
            );

            if 4.0 * retracted_decrease > raw_decrease {
                return Ok(AcceptedStep {
                    point: retracted,
                    info: StepInfo {
                        iteration,
                        step_size,
                        max_step_size: max_step,
                        initial_step_size: initial_step,
                        raw_decrease,
                        retracted_decrease,
                        backtracks,
                    },
                });
            }
            step_size *= 0.5;
        }

        Err(EstimatorError::line_search_exhausted(
            "no step satisfied 4 del_2 > del_1",
            iteration,
            options.max_backtracks,
            step_size,
        ))
    }
}

#[derive(Debug)]
struct AcceptedStep {
    point: Matrix,
    info: StepInfo,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::HistoryCallback;
    use approx::assert_relative_eq;
    use hzcap_core::{
        error::ManifoldError,
        hamiltonian::{FnHamiltonian, QuadraticHamiltonian},
    };

    fn unit_ball_estimator(m: usize) -> HZCapacityEstimator<QuadraticHamiltonian> {
        let ball = QuadraticHamiltonian::unit_ball(1);
        let oracle = Box::new(ball.clone());
        HZCapacityEstimator::with_oracle(EstimatorConfig::new(1, m).unwrap(), ball, oracle)
            .unwrap()
    }

    fn quiet() -> EstimateOptions {
        EstimateOptions::default().with_verbose(false)
    }

    #[test]
    fn test_unit_ball_discrete_optimum() {
        let m = 20;
        let result = unit_ball_estimator(m).estimate(&quiet()).unwrap();

        let expected = m as f64 * (std::f64::consts::PI / m as f64).tan();
        assert!(result.converged);
        assert_eq!(result.termination_reason, TerminationReason::Converged);
        assert_relative_eq!(result.capacity, expected, epsilon = 1e-4);
        assert_relative_eq!(result.capacity, 2.0 * result.action);
        assert!(result.constraint_residual.abs() < 1e-9);
        assert!(result.tangent_gradient_norm_sq < 1e-12);
        assert_eq!(result.point.shape(), (2, m));
    }

    #[test]
    fn test_accepted_steps_keep_a_quarter_of_the_decrease() {
        let mut history = HistoryCallback::new();
        let result = unit_ball_estimator(12)
            .estimate_with_callback(&quiet(), &mut history)
            .unwrap();

        assert!(!history.steps.is_empty());
        for step in &history.steps {
            assert!(step.is_sufficient(), "rejected step accepted: {step:?}");
            assert!(step.step_size <= step.max_step_size);
        }
        assert_eq!(history.iterations.len(), result.iterations);
        assert_eq!(history.final_point.as_ref(), Some(&result.point));
        assert_eq!(
            result.backtracks,
            history.steps.iter().map(|s| s.backtracks).sum::<usize>()
        );
    }

    #[test]
    fn test_zero_iterations_returns_initial_estimate() {
        let estimator = unit_ball_estimator(6);
        let result = estimator.estimate(&quiet().with_iterations(0)).unwrap();

        assert_eq!(result.iterations, 0);
        assert_eq!(result.termination_reason, TerminationReason::MaxIterations);
        assert!(!result.is_reliable());
        assert!(result.tangent_gradient_norm_sq.is_infinite());
        assert!(estimator.manifold().is_point_on_manifold(&result.point, 1e-9));
    }

    #[test]
    fn test_callback_stop() {
        let mut history = HistoryCallback::stopping_after(2);
        let result = unit_ball_estimator(30)
            .estimate_with_callback(&quiet(), &mut history)
            .unwrap();
        assert_eq!(result.termination_reason, TerminationReason::CallbackRequest);
        assert_eq!(result.iterations, 2);
        assert_eq!(history.steps.len(), 1);
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let estimator = unit_ball_estimator(5);
        let err = estimator
            .estimate(&quiet().with_epsilon(-1.0))
            .unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_dimension_mismatch_surfaces_as_manifold_error() {
        let ball = QuadraticHamiltonian::unit_ball(2);
        let oracle = Box::new(ball.clone());
        let estimator =
            HZCapacityEstimator::with_oracle(EstimatorConfig::new(1, 5).unwrap(), ball, oracle)
                .unwrap();
        let err = estimator.estimate(&quiet()).unwrap_err();
        assert!(matches!(
            err,
            EstimatorError::Manifold(ManifoldError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_exhausted_line_search() {
        // H(x) = |x|^2 + sum x_i^4 / 2 with a single trial per iteration.
        let h = FnHamiltonian::new(
            |x: &Vector| x.norm_squared() + 0.5 * x.iter().map(|v| v.powi(4)).sum::<f64>(),
            |x: &Vector| x.map(|v| 2.0 * v + 2.0 * v.powi(3)),
        );
        let estimator = HZCapacityEstimator::new(EstimatorConfig::new(2, 10).unwrap(), h).unwrap();

        let err = estimator
            .estimate(&quiet().with_max_backtracks(1))
            .unwrap_err();
        match err {
            EstimatorError::NonConvergence {
                iteration,
                backtracks,
                last_step_size,
                ..
            } => {
                assert!(iteration >= 1);
                assert_eq!(backtracks, 1);
                assert!(last_step_size > 0.0);
            }
            other => panic!("Expected NonConvergence, got {other:?}"),
        }
    }

    #[test]
    fn test_line_search_rejects_flat_direction() {
        let estimator = unit_ball_estimator(5);
        let manifold = estimator.manifold();
        let functional =
            ActionFunctional::new(estimator.legendre(), manifold.symplectic(), 5);
        let x = manifold
            .random_point(&mut StdRng::seed_from_u64(0), 1e-12, 100)
            .unwrap();
        let action = functional.value(&x).unwrap();

        let err = estimator
            .line_search(&functional, &x, action, &Matrix::zeros(2, 5), 3, &quiet())
            .unwrap_err();
        match err {
            EstimatorError::NumericalFailure { iteration, .. } => assert_eq!(iteration, 3),
            other => panic!("Expected NumericalFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_legendre_accessors() {
        let estimator = unit_ball_estimator(5);
        let y = Vector::from_vec(vec![2.0, -4.0]);
        assert_relative_eq!(
            estimator.legendre_gradient(&y).unwrap(),
            Vector::from_vec(vec![1.0, -2.0])
        );
        assert_relative_eq!(estimator.legendre_value(&y).unwrap(), 5.0);
        assert!(!estimator.uses_numerical_legendre());
    }

    #[test]
    fn test_from_raw_clamps() {
        let estimator = HZCapacityEstimator::from_raw(0, 1, QuadraticHamiltonian::unit_ball(1));
        assert_eq!(*estimator.config(), EstimatorConfig { n: 1, m: 3 });
        assert!(estimator.uses_numerical_legendre());
        assert_eq!(estimator.manifold().shape(), (2, 3));
    }
}
