//! Outcome of a capacity estimation run.

use hzcap_core::types::Matrix;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why the projected-gradient iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    /// The squared tangent gradient norm dropped below epsilon
    Converged,
    /// The iteration budget was exhausted; the estimate is best-effort
    MaxIterations,
    /// A callback asked to stop
    CallbackRequest,
}

/// Result of [`HZCapacityEstimator::estimate`](crate::HZCapacityEstimator::estimate).
#[derive(Debug, Clone)]
pub struct EstimationResult {
    /// Estimated capacity `2 F(x)` at the final iterate
    pub capacity: f64,
    /// Action `F(x)` at the final iterate
    pub action: f64,
    /// Constraint value `f(x)` at the final iterate
    pub constraint_residual: f64,
    /// Number of iterations started
    pub iterations: usize,
    /// Squared norm of the last computed tangent gradient, infinite when no
    /// iteration ran
    pub tangent_gradient_norm_sq: f64,
    /// Legendre gradients computed during the run
    pub legendre_evaluations: usize,
    /// Step halvings performed over all iterations
    pub backtracks: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Why the run stopped
    pub termination_reason: TerminationReason,
    /// True if the run stopped on the gradient criterion
    pub converged: bool,
    /// Final iterate
    pub point: Matrix,
}

impl EstimationResult {
    /// Whether the capacity estimate comes from a converged run.
    pub fn is_reliable(&self) -> bool {
        self.converged
    }
}
