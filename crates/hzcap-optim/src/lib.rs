//! HZCap Optim - Projected-gradient estimation of the Hofer-Zehnder capacity.
//!
//! This crate drives the numerics of `hzcap-core`: it samples a random loop
//! on the constraint manifold and minimises the discrete action on it with a
//! projected-gradient method whose steps are retracted back onto the
//! manifold.
//!
//! # Components
//!
//! - **Configuration**: [`EstimatorConfig`] for the problem size and
//!   [`EstimateOptions`] for a single run
//! - **Estimator**: [`HZCapacityEstimator`]
//! - **Callbacks**: observe iterations, accepted steps and the final loop
//! - **Results**: [`EstimationResult`] with the capacity and run statistics
//!
//! # Examples
//!
//! ```rust
//! use hzcap_core::hamiltonian::QuadraticHamiltonian;
//! use hzcap_optim::{EstimateOptions, EstimatorConfig, HZCapacityEstimator};
//!
//! let ball = QuadraticHamiltonian::unit_ball(1);
//! let oracle = Box::new(ball.clone());
//! let estimator =
//!     HZCapacityEstimator::with_oracle(EstimatorConfig::new(1, 20)?, ball, oracle)?;
//!
//! let result = estimator.estimate(&EstimateOptions::new().with_verbose(false))?;
//! assert!((result.capacity - std::f64::consts::PI).abs() < 0.05);
//! # Ok::<(), hzcap_core::EstimatorError>(())
//! ```

pub mod callback;
pub mod config;
pub mod estimator;
pub mod result;

pub use callback::{
    EstimationCallback, EstimationSummary, HistoryCallback, IterationInfo, IterationRecord,
    LoggingCallback, NoOpCallback, StartInfo, StepInfo,
};
pub use config::{EstimateOptions, EstimatorConfig};
pub use estimator::HZCapacityEstimator;
pub use result::{EstimationResult, TerminationReason};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::callback::{
        EstimationCallback, HistoryCallback, LoggingCallback, NoOpCallback,
    };
    pub use crate::config::{EstimateOptions, EstimatorConfig};
    pub use crate::estimator::HZCapacityEstimator;
    pub use crate::result::{EstimationResult, TerminationReason};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let _options = EstimateOptions::new().with_iterations(10);
        let _config = EstimatorConfig::clamped(1, 3);
        let _callback = LoggingCallback::new(5);
        assert_ne!(TerminationReason::Converged, TerminationReason::MaxIterations);
    }
}
