//! Type aliases and numerical constants.
//!
//! All computations are carried out in `f64`. Points of the phase space
//! R^{2n} are column vectors; a configuration of `m` sample points is a
//! `2n x m` matrix whose columns are the points.

use nalgebra::{DMatrix, DVector};

/// A point (or covector) of R^{2n}.
pub type Vector = DVector<f64>;

/// A `2n x m` configuration matrix, one sample point per column.
pub type Matrix = DMatrix<f64>;

/// Numerical constants and defaults used across the workspace.
pub mod constants {
    /// Default termination threshold on the squared tangent gradient norm.
    pub const DEFAULT_EPSILON: f64 = 1e-12;

    /// Default number of projected-gradient iterations.
    pub const DEFAULT_ITERATIONS: usize = 100;

    /// Default seed for the starting-point sampler.
    pub const DEFAULT_SEED: u64 = 0;

    /// Default bound on step-size halvings per iteration.
    pub const DEFAULT_MAX_BACKTRACKS: usize = 64;

    /// Default bound on rejection-sampling draws for the starting point.
    pub const DEFAULT_MAX_SAMPLING_ATTEMPTS: usize = 10_000;

    /// Value of every coordinate of the root-finder initial guess.
    pub const LEGENDRE_INITIAL_GUESS: f64 = 0.1;

    /// Smallest admissible half-dimension `n`.
    pub const MIN_HALF_DIMENSION: usize = 1;

    /// Smallest admissible number of sample points `m`.
    pub const MIN_SAMPLES: usize = 3;

    /// Tolerance for manifold membership checks.
    pub const MANIFOLD_TOLERANCE: f64 = 1e-9;

    /// Relative step tolerance of the hybrid root finder.
    ///
    /// Square root of machine epsilon, the classic MINPACK default.
    pub const ROOT_XTOL: f64 = 1.490_116_119_384_765_6e-8;
}
