//! Core numerics for Hofer-Zehnder capacity estimation.
//!
//! This crate provides the building blocks of the capacity estimator: the
//! symplectic structure of R^{2n}, the Legendre transform of a convex
//! Hamiltonian, the constraint manifold of discrete loops, and the discrete
//! action functional minimised on it.
//!
//! # Key Concepts
//!
//! - **Hamiltonian**: a convex function `H` whose sublevel set `{H <= 1}` is the body
//! - **Legendre transform**: `G(y) = sup_x <y, x> - H(x)`, with gradient `dG = (dH)^{-1}`
//! - **Constraint manifold**: zero-sum configurations of `m` points with unit discrete action
//! - **Action functional**: `F(x) = (1/m) sum_i G(-J x_i)`, whose minimum doubled is the capacity
//!
//! # Modules
//!
//! - [`error`]: Error types for numerical failures and configuration errors
//! - [`hamiltonian`]: The Hamiltonian trait and closed-form bodies
//! - [`legendre`]: Legendre oracles and the transform `G`, `dG`
//! - [`manifold`]: Projection, constraint and retraction on the loop manifold
//! - [`objective`]: The action functional `F` and its gradient
//! - [`root_finding`]: Powell hybrid solver used to invert `dH`
//! - [`symplectic`]: The matrix `J` and the shift operator `A_{2n}`
//! - [`types`]: Type aliases and numerical constants

pub mod error;
pub mod hamiltonian;
pub mod legendre;
pub mod manifold;
pub mod objective;
pub mod root_finding;
pub mod symplectic;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{EstimatorError, EstimatorResult, ManifoldError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use hzcap_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{EstimatorError, EstimatorResult, ManifoldError};
    pub use crate::hamiltonian::{FnHamiltonian, Hamiltonian, QuadraticHamiltonian};
    pub use crate::legendre::{
        AnalyticLegendre, LegendreOracle, LegendreTransform, NumericalLegendre,
    };
    pub use crate::manifold::ConstraintManifold;
    pub use crate::objective::ActionFunctional;
    pub use crate::root_finding::{HybridConfig, HybridSolution, HybridSolver, SolverStatus};
    pub use crate::symplectic::{flip_columns, SymplecticForm};
    pub use crate::types::{constants, Matrix, Vector};
}
