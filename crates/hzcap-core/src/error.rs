//! Error types for capacity estimation.
//!
//! This module defines the error types shared by the numeric layers
//! (Legendre inversion, constraint manifold, action functional) and by the
//! estimator that drives them.

use thiserror::Error;

/// Errors raised by the numeric layers below the estimator.
#[derive(Debug, Clone, Error)]
pub enum ManifoldError {
    /// Point is not on the constraint manifold.
    ///
    /// This error occurs when a configuration matrix has non-zero column sum
    /// or violates the quadratic constraint beyond the requested tolerance.
    #[error("Point is not on the constraint manifold: {reason}")]
    InvalidPoint {
        /// Description of why the point is invalid
        reason: String,
    },

    /// Dimension mismatch between vectors or matrices.
    ///
    /// Raised when a user-supplied gradient returns a vector of the wrong
    /// length, or when a matrix does not have the `2n x m` shape.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// A numerical computation failed or produced a meaningless value.
    ///
    /// Covers root-finder non-convergence (with the final residual norm),
    /// infeasible retractions and non-finite intermediate values.
    #[error("Numerical failure: {reason}{}", residual_suffix(.residual_norm))]
    NumericalFailure {
        /// Description of the numerical issue
        reason: String,
        /// Residual norm reached by an iterative solver, if any
        residual_norm: Option<f64>,
    },

    /// A bounded loop ran out of attempts.
    #[error("No convergence after {attempts} attempts: {reason}")]
    NonConvergence {
        /// Description of the loop that gave up
        reason: String,
        /// Number of attempts made
        attempts: usize,
    },
}

fn residual_suffix(residual_norm: &Option<f64>) -> String {
    residual_norm.map_or_else(String::new, |r| format!(" (residual norm {r:e})"))
}

impl ManifoldError {
    /// Create an InvalidPoint error with a custom reason.
    pub fn invalid_point<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NumericalFailure without residual information.
    pub fn numerical_failure<S: Into<String>>(reason: S) -> Self {
        Self::NumericalFailure {
            reason: reason.into(),
            residual_norm: None,
        }
    }

    /// Create a NumericalFailure carrying the residual norm of a solver.
    pub fn solver_failure<S: Into<String>>(reason: S, residual_norm: f64) -> Self {
        Self::NumericalFailure {
            reason: reason.into(),
            residual_norm: Some(residual_norm),
        }
    }

    /// Create a NonConvergence error.
    pub fn non_convergence<S: Into<String>>(reason: S, attempts: usize) -> Self {
        Self::NonConvergence {
            reason: reason.into(),
            attempts,
        }
    }
}

/// Errors that can occur while running the estimator.
#[derive(Debug, Clone, Error)]
pub enum EstimatorError {
    /// Invalid estimator configuration.
    ///
    /// Raised when `n < 1`, `m < 3`, or an option such as epsilon is not a
    /// positive finite number.
    #[error("Invalid estimator configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The backtracking line search exhausted its halving budget.
    #[error(
        "Line search did not converge at iteration {iteration} after {backtracks} halvings (last step {last_step_size:e}): {reason}"
    )]
    NonConvergence {
        /// Description of why the search gave up
        reason: String,
        /// Outer iteration at which the search failed
        iteration: usize,
        /// Number of step halvings performed
        backtracks: usize,
        /// Last step size tried
        last_step_size: f64,
    },

    /// A numerical failure detected by the optimizer itself.
    #[error("Numerical failure at iteration {iteration}: {reason}")]
    NumericalFailure {
        /// Description of the numerical issue
        reason: String,
        /// Outer iteration at which it happened
        iteration: usize,
    },

    /// Propagated error from the numeric layers.
    #[error("Manifold operation failed: {0}")]
    Manifold(#[from] ManifoldError),

    /// A callback reported an error.
    #[error("Callback failed: {0}")]
    Callback(String),
}

impl EstimatorError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a NonConvergence error for an exhausted line search.
    pub fn line_search_exhausted<S: Into<String>>(
        reason: S,
        iteration: usize,
        backtracks: usize,
        last_step_size: f64,
    ) -> Self {
        Self::NonConvergence {
            reason: reason.into(),
            iteration,
            backtracks,
            last_step_size,
        }
    }

    /// Create a NumericalFailure error.
    pub fn numerical_failure<S: Into<String>>(reason: S, iteration: usize) -> Self {
        Self::NumericalFailure {
            reason: reason.into(),
            iteration,
        }
    }

    /// Create a Callback error.
    pub fn callback<S: Into<String>>(reason: S) -> Self {
        Self::Callback(reason.into())
    }
}

/// Result type alias for operations that can produce ManifoldError.
pub type Result<T> = std::result::Result<T, ManifoldError>;

/// Result type alias for estimator operations.
pub type EstimatorResult<T> = std::result::Result<T, EstimatorError>;
