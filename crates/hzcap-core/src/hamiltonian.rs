//! Hamiltonian functions describing convex bodies.
//!
//! A convex body is described by a convex function `H: R^{2n} -> R` together
//! with its gradient. The estimator only ever evaluates `H` and `dH` at
//! points returned by the Legendre layer, so both must be defined on all of
//! R^{2n}.
//!
//! Implementations must be pure: the estimator may call them any number of
//! times, in any order, and concurrent estimations on separate instances are
//! only independent when the Hamiltonian has no side effects.

use crate::{
    error::{ManifoldError, Result},
    types::Vector,
};
use std::fmt::Debug;

/// A Hamiltonian `H` with gradient `dH`.
pub trait Hamiltonian: Debug {
    /// Evaluates `H(x)`.
    fn value(&self, x: &Vector) -> f64;

    /// Evaluates the gradient `dH(x)`.
    fn gradient(&self, x: &Vector) -> Vector;
}

impl<H: Hamiltonian + ?Sized> Hamiltonian for &H {
    fn value(&self, x: &Vector) -> f64 {
        (**self).value(x)
    }

    fn gradient(&self, x: &Vector) -> Vector {
        (**self).gradient(x)
    }
}

impl<H: Hamiltonian + ?Sized> Hamiltonian for Box<H> {
    fn value(&self, x: &Vector) -> f64 {
        (**self).value(x)
    }

    fn gradient(&self, x: &Vector) -> Vector {
        (**self).gradient(x)
    }
}

/// Adapts a pair of closures `(H, dH)` to the [`Hamiltonian`] trait.
pub struct FnHamiltonian<F, G>
where
    F: Fn(&Vector) -> f64,
    G: Fn(&Vector) -> Vector,
{
    value: F,
    gradient: G,
}

impl<F, G> FnHamiltonian<F, G>
where
    F: Fn(&Vector) -> f64,
    G: Fn(&Vector) -> Vector,
{
    /// Wraps `value` as `H` and `gradient` as `dH`.
    pub fn new(value: F, gradient: G) -> Self {
        Self { value, gradient }
    }
}

impl<F, G> Debug for FnHamiltonian<F, G>
where
    F: Fn(&Vector) -> f64,
    G: Fn(&Vector) -> Vector,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHamiltonian").finish_non_exhaustive()
    }
}

impl<F, G> Hamiltonian for FnHamiltonian<F, G>
where
    F: Fn(&Vector) -> f64,
    G: Fn(&Vector) -> Vector,
{
    fn value(&self, x: &Vector) -> f64 {
        (self.value)(x)
    }

    fn gradient(&self, x: &Vector) -> Vector {
        (self.gradient)(x)
    }
}

/// Diagonal quadratic Hamiltonian `H(x) = sum_i w_i x_i^2`.
///
/// With equal weights on each `(q_i, p_i)` pair this describes an ellipsoid
/// whose level set `H = 1` has radii `1 / sqrt(w_i)`. Its Legendre transform
/// is available in closed form: `dG(y) = y / (2 w)`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticHamiltonian {
    weights: Vector,
}

impl QuadraticHamiltonian {
    /// Creates the Hamiltonian from strictly positive weights.
    pub fn new(weights: Vector) -> Result<Self> {
        if weights.is_empty() || weights.len() % 2 != 0 {
            return Err(ManifoldError::dimension_mismatch(
                "a non-empty even number of weights",
                weights.len(),
            ));
        }
        if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(ManifoldError::invalid_point(format!(
                "quadratic weights must be positive and finite, got {bad}"
            )));
        }
        Ok(Self { weights })
    }

    /// `H(x) = |x|^2` on R^{2n}: the unit ball, of capacity `pi`.
    pub fn unit_ball(n: usize) -> Self {
        Self {
            weights: Vector::from_element(2 * n, 1.0),
        }
    }

    /// Ellipsoid with radius `radii[i]` in the `(q_i, p_i)` plane.
    ///
    /// Its Hofer-Zehnder capacity is `pi * min(radii)^2`.
    pub fn ellipsoid(radii: &[f64]) -> Result<Self> {
        let n = radii.len();
        let weights = Vector::from_fn(2 * n, |i, _| {
            let r = radii[i % n];
            1.0 / (r * r)
        });
        Self::new(weights)
    }

    /// The diagonal weights.
    pub fn weights(&self) -> &Vector {
        &self.weights
    }

    /// Closed-form Legendre gradient `dG(y) = y / (2 w)`.
    pub fn dual_gradient(&self, y: &Vector) -> Vector {
        y.zip_map(&self.weights, |yi, wi| 0.5 * yi / wi)
    }

    /// Closed-form Legendre transform `G(y) = sum_i y_i^2 / (4 w_i)`.
    pub fn dual_value(&self, y: &Vector) -> f64 {
        y.iter()
            .zip(self.weights.iter())
            .map(|(yi, wi)| 0.25 * yi * yi / wi)
            .sum()
    }
}

impl Hamiltonian for QuadraticHamiltonian {
    fn value(&self, x: &Vector) -> f64 {
        x.iter()
            .zip(self.weights.iter())
            .map(|(xi, wi)| wi * xi * xi)
            .sum()
    }

    fn gradient(&self, x: &Vector) -> Vector {
        x.zip_map(&self.weights, |xi, wi| 2.0 * wi * xi)
    }
}
