//! Estimator configuration and per-run options.

use hzcap_core::{
    error::{EstimatorError, EstimatorResult},
    types::constants,
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Problem size of an estimator.
///
/// `n` is the half-dimension of the phase space R^{2n} and `m` the number of
/// points of the discrete loop. Larger `m` gives a finer discretisation: for
/// the unit ball the discrete optimum is `m tan(pi / m)`, which tends to `pi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimatorConfig {
    /// Half-dimension `n >= 1`
    pub n: usize,
    /// Number of sample points `m >= 3`
    pub m: usize,
}

impl EstimatorConfig {
    /// Creates a configuration, rejecting `n < 1` or `m < 3`.
    pub fn new(n: usize, m: usize) -> EstimatorResult<Self> {
        let config = Self { n, m };
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration, raising `n` to 1 and `m` to 3 when smaller.
    pub fn clamped(n: usize, m: usize) -> Self {
        let clamped = Self {
            n: n.max(constants::MIN_HALF_DIMENSION),
            m: m.max(constants::MIN_SAMPLES),
        };
        if clamped.n != n || clamped.m != m {
            log::warn!(
                "Estimator configuration (n = {n}, m = {m}) clamped to (n = {}, m = {})",
                clamped.n,
                clamped.m
            );
        }
        clamped
    }

    /// Checks `n >= 1` and `m >= 3`.
    pub fn validate(&self) -> EstimatorResult<()> {
        if self.n < constants::MIN_HALF_DIMENSION {
            return Err(EstimatorError::invalid_configuration(
                format!("half-dimension must be at least {}", constants::MIN_HALF_DIMENSION),
                "n",
                self.n.to_string(),
            ));
        }
        if self.m < constants::MIN_SAMPLES {
            return Err(EstimatorError::invalid_configuration(
                format!("number of sample points must be at least {}", constants::MIN_SAMPLES),
                "m",
                self.m.to_string(),
            ));
        }
        Ok(())
    }

    /// Dimension `2n` of the phase space.
    pub fn dimension(&self) -> usize {
        2 * self.n
    }
}

/// Options of a single [`estimate`](crate::HZCapacityEstimator::estimate) run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimateOptions {
    /// Maximum number of projected-gradient iterations
    pub iterations: usize,
    /// Threshold on the squared tangent gradient norm, also used as the
    /// minimum action accepted by the starting-point sampler
    pub epsilon: f64,
    /// Log the iterate metrics and the final estimate at info level
    pub verbose: bool,
    /// Seed of the starting-point sampler
    pub seed: u64,
    /// Maximum number of step halvings per iteration
    pub max_backtracks: usize,
    /// Maximum number of draws when sampling the starting point
    pub max_sampling_attempts: usize,
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            iterations: constants::DEFAULT_ITERATIONS,
            epsilon: constants::DEFAULT_EPSILON,
            verbose: true,
            seed: constants::DEFAULT_SEED,
            max_backtracks: constants::DEFAULT_MAX_BACKTRACKS,
            max_sampling_attempts: constants::DEFAULT_MAX_SAMPLING_ATTEMPTS,
        }
    }
}

impl EstimateOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the convergence threshold.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Enables or disables per-iteration logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Sets the sampler seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the maximum number of step halvings per iteration.
    pub fn with_max_backtracks(mut self, max_backtracks: usize) -> Self {
        self.max_backtracks = max_backtracks;
        self
    }

    /// Sets the maximum number of starting-point draws.
    pub fn with_max_sampling_attempts(mut self, attempts: usize) -> Self {
        self.max_sampling_attempts = attempts;
        self
    }

    /// Checks that epsilon is positive and finite and the loop budgets are non-zero.
    pub fn validate(&self) -> EstimatorResult<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(EstimatorError::invalid_configuration(
                "epsilon must be positive and finite",
                "epsilon",
                self.epsilon.to_string(),
            ));
        }
        if self.max_backtracks == 0 {
            return Err(EstimatorError::invalid_configuration(
                "at least one line-search trial is required",
                "max_backtracks",
                "0",
            ));
        }
        if self.max_sampling_attempts == 0 {
            return Err(EstimatorError::invalid_configuration(
                "at least one sampling attempt is required",
                "max_sampling_attempts",
                "0",
            ));
        }
        Ok(())
    }
}
