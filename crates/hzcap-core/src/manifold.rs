//! The constraint manifold of closed polygonal loops.
//!
//! A configuration is a `2n x m` matrix `x` whose columns `x_0, ..., x_{m-1}`
//! are points of R^{2n}. The estimator works on
//!
//! ```text
//! M = { x : sum_k x_k = 0,  f(x) = <x, A_{2n} x> / m^2 - 1 = 0 }
//! ```
//!
//! The linear condition is handled by the orthogonal projection
//! [`project`](ConstraintManifold::project) onto the zero column-sum
//! subspace. The quadratic condition is a normalisation of the discrete
//! symplectic action: since `f + 1` is 2-homogeneous, rescaling by
//! `1/sqrt(f + 1)` puts any configuration of positive action on `M`, and
//! reversing the column order flips the sign of the action.

use crate::{
    error::{ManifoldError, Result},
    symplectic::{flip_columns, SymplecticForm},
    types::{Matrix, Vector},
};
use rand::Rng;

/// Zero-sum, unit-action configurations of `m` points in R^{2n}.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintManifold {
    m: usize,
    symplectic: SymplecticForm,
}

impl ConstraintManifold {
    /// Creates the manifold for half-dimension `n` and `m` sample points.
    pub fn new(n: usize, m: usize) -> Self {
        Self {
            m,
            symplectic: SymplecticForm::new(n),
        }
    }

    /// Half-dimension `n`.
    pub fn half_dimension(&self) -> usize {
        self.symplectic.half_dimension()
    }

    /// Number of sample points `m`.
    pub fn samples(&self) -> usize {
        self.m
    }

    /// Shape `(2n, m)` of a configuration.
    pub fn shape(&self) -> (usize, usize) {
        (self.symplectic.dimension(), self.m)
    }

    /// The symplectic primitives on R^{2n}.
    pub fn symplectic(&self) -> &SymplecticForm {
        &self.symplectic
    }

    /// Fails with `DimensionMismatch` unless `x` is `2n x m`.
    pub fn check_shape(&self, x: &Matrix) -> Result<()> {
        if x.shape() == self.shape() {
            Ok(())
        } else {
            Err(ManifoldError::dimension_mismatch(
                format!("{:?}", self.shape()),
                format!("{:?}", x.shape()),
            ))
        }
    }

    /// Sum of the columns of `x`.
    pub fn column_sums(x: &Matrix) -> Vector {
        x.column_sum()
    }

    /// Orthogonal projection onto the zero column-sum subspace.
    pub fn project(&self, x: &Matrix) -> Matrix {
        let mean = x.column_mean();
        let mut out = x.clone();
        for mut col in out.column_iter_mut() {
            col -= &mean;
        }
        out
    }

    /// The product `A_{2n} x`.
    pub fn shift_sum(&self, x: &Matrix) -> Matrix {
        self.symplectic.shift_sum(x)
    }

    fn scale(&self) -> f64 {
        let m = self.m as f64;
        m * m
    }

    /// The constraint `f(x) = <x, A_{2n} x> / m^2 - 1`.
    pub fn constraint(&self, x: &Matrix) -> f64 {
        self.symplectic.action_pairing(x) / self.scale() - 1.0
    }

    /// Gradient of the constraint, `(A_{2n} + A_{2n}^T) x / m^2`.
    ///
    /// The transpose is applied by reversing the column order before and
    /// after `A_{2n}`.
    pub fn constraint_gradient(&self, x: &Matrix) -> Matrix {
        let forward = self.shift_sum(x);
        let backward = flip_columns(&self.shift_sum(&flip_columns(x)));
        (forward - backward) / self.scale()
    }

    /// Projects `v` onto the tangent space of the manifold at `x`.
    ///
    /// With `a_H` the projected constraint gradient, returns
    /// `proj(v) - a_H <a_H, v> / <a_H, a_H>`.
    pub fn project_tangent(&self, x: &Matrix, v: &Matrix) -> Result<Matrix> {
        let a_h = self.project(&self.constraint_gradient(x));
        let a_h_sq = a_h.norm_squared();
        if !(a_h_sq.is_finite() && a_h_sq > 0.0) {
            return Err(ManifoldError::numerical_failure(format!(
                "degenerate constraint gradient (|a_H|^2 = {a_h_sq:e})"
            )));
        }
        let coefficient = a_h.dot(v) / a_h_sq;
        Ok(self.project(v) - a_h * coefficient)
    }

    /// Rescales a zero-sum configuration onto `f = 0`.
    ///
    /// For `c = f(x) + 1 > 0` returns `x / sqrt(c)`; for `c < 0` returns the
    /// column-reversed configuration divided by `sqrt(-c)`.
    pub fn normalize(&self, x: &Matrix) -> Result<Matrix> {
        let c = self.constraint(x) + 1.0;
        if !c.is_finite() || c == 0.0 {
            return Err(ManifoldError::numerical_failure(format!(
                "cannot normalise a configuration with action {c}"
            )));
        }
        if c > 0.0 {
            Ok(x / c.sqrt())
        } else {
            Ok(flip_columns(x) / (-c).sqrt())
        }
    }

    /// Draws a random point of the manifold.
    ///
    /// Entries are sampled uniformly from `(-0.5, 0.5]`, projected onto the
    /// zero-sum subspace and redrawn while `|f(x) + 1| < epsilon`; the
    /// accepted draw is then [`normalize`](Self::normalize)d. Gives up with
    /// `NonConvergence` after `max_attempts` draws.
    pub fn random_point<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        epsilon: f64,
        max_attempts: usize,
    ) -> Result<Matrix> {
        let (rows, cols) = self.shape();
        for _ in 0..max_attempts {
            let raw = Matrix::from_fn(rows, cols, |_, _| 0.5 - rng.gen::<f64>());
            let x = self.project(&raw);
            let c = self.constraint(&x) + 1.0;
            if c.abs() >= epsilon {
                return self.normalize(&x);
            }
        }
        Err(ManifoldError::non_convergence(
            format!("no starting configuration with |action| >= {epsilon:e}"),
            max_attempts,
        ))
    }

    /// Moves from `x` along the tangent `direction` and rescales back.
    ///
    /// Computes `c = f(step * direction) + 2` and returns
    /// `(x + step * direction) / sqrt(c)`. For `x` on the manifold and a
    /// tangent direction, `c` is exactly the action of the raw step, so the
    /// result lies on `f = 0`. Fails when `c <= 0`.
    pub fn retract(&self, x: &Matrix, direction: &Matrix, step: f64) -> Result<Matrix> {
        let scaled = direction * step;
        let c = self.constraint(&scaled) + 2.0;
        if !(c.is_finite() && c > 0.0) {
            return Err(ManifoldError::numerical_failure(format!(
                "retraction infeasible: action {c} at step {step:e}"
            )));
        }
        Ok((x + scaled) / c.sqrt())
    }

    /// Whether `x` has the right shape, zero column sums and `|f(x)| < tol`.
    pub fn is_point_on_manifold(&self, x: &Matrix, tol: f64) -> bool {
        self.check_point(x, tol).is_ok()
    }

    /// Like [`is_point_on_manifold`](Self::is_point_on_manifold), but
    /// reports which condition failed.
    pub fn check_point(&self, x: &Matrix, tol: f64) -> Result<()> {
        self.check_shape(x)?;
        let sums = Self::column_sums(x);
        if sums.amax() >= tol {
            return Err(ManifoldError::invalid_point(format!(
                "column sum has magnitude {:e}",
                sums.amax()
            )));
        }
        let f = self.constraint(x);
        if f.abs() >= tol {
            return Err(ManifoldError::invalid_point(format!(
                "constraint value is {f:e}"
            )));
        }
        Ok(())
    }
}
