//! # HZCap
//!
//! Numerical estimation of the Hofer-Zehnder capacity of convex bodies in
//! R^{2n}.
//!
//! A body is given as the sublevel set `{H <= 1}` of a convex Hamiltonian.
//! The capacity is approximated by minimising the discrete symplectic action
//! of closed polygonal loops with `m` vertices: the loops live on a manifold
//! cut out by a zero-sum condition and a quadratic normalisation, and the
//! action is evaluated through the Legendre transform of `H`.
//!
//! This crate re-exports the two workspace crates:
//!
//! - [`hzcap_core`]: symplectic primitives, Hamiltonians, Legendre
//!   oracles, the root finder, the constraint manifold and the action
//! - [`hzcap_optim`]: the projected-gradient estimator
//!
//! ## Quick Start
//!
//! ```rust
//! use hzcap::prelude::*;
//!
//! // Euclidean unit ball in R^2, H(x) = |x|^2
//! let ball = QuadraticHamiltonian::unit_ball(1);
//! let estimator = HZCapacityEstimator::with_legendre_gradient(
//!     EstimatorConfig::new(1, 50)?,
//!     ball,
//!     |y: &Vector| y / 2.0,
//! )?;
//!
//! let result = estimator.estimate(&EstimateOptions::new().with_verbose(false))?;
//! assert!((result.capacity - std::f64::consts::PI).abs() < 0.05);
//! # Ok::<(), hzcap::hzcap_core::EstimatorError>(())
//! ```
//!
//! Without a closed-form Legendre gradient, [`HZCapacityEstimator::new`]
//! inverts `dH` numerically at every evaluation.
//!
//! [`HZCapacityEstimator::new`]: hzcap_optim::HZCapacityEstimator::new

pub use hzcap_core;
pub use hzcap_optim;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use hzcap_core::prelude::*;
    pub use hzcap_optim::prelude::*;
    pub use hzcap_optim::{EstimationSummary, IterationInfo, StartInfo, StepInfo};
}

pub use nalgebra;
