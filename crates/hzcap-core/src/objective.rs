//! Discrete action functional.
//!
//! For a configuration `x` of `m` points,
//!
//! ```text
//! F(x)  = (1/m) sum_i G(-J x_i)
//! dF(x) = (1/m) [ J dG(-J x_0) | ... | J dG(-J x_{m-1}) ]
//! ```
//!
//! where `G` is the Legendre transform of the Hamiltonian. On the constraint
//! manifold the minimum of `F`, doubled, approximates the Hofer-Zehnder
//! capacity of the body `{H <= 1}`. Every evaluation costs `m` Legendre
//! gradients, which dominate the run time when `dG` is computed numerically.

use crate::{
    error::{ManifoldError, Result},
    legendre::LegendreTransform,
    symplectic::SymplecticForm,
    types::Matrix,
};
use std::cell::Cell;

/// The action functional `F` and its gradient `dF`.
#[derive(Debug)]
pub struct ActionFunctional<'a> {
    legendre: LegendreTransform<'a>,
    symplectic: &'a SymplecticForm,
    m: usize,
    evaluations: Cell<usize>,
}

impl<'a> ActionFunctional<'a> {
    /// Builds `F` over configurations of `m` points.
    pub fn new(legendre: LegendreTransform<'a>, symplectic: &'a SymplecticForm, m: usize) -> Self {
        Self {
            legendre,
            symplectic,
            m,
            evaluations: Cell::new(0),
        }
    }

    /// Number of Legendre gradients computed so far.
    pub fn legendre_evaluations(&self) -> usize {
        self.evaluations.get()
    }

    fn check_shape(&self, x: &Matrix) -> Result<()> {
        let expected = (self.symplectic.dimension(), self.m);
        if x.shape() == expected {
            Ok(())
        } else {
            Err(ManifoldError::dimension_mismatch(
                format!("{expected:?}"),
                format!("{:?}", x.shape()),
            ))
        }
    }

    /// Evaluates `F(x)`.
    pub fn value(&self, x: &Matrix) -> Result<f64> {
        self.check_shape(x)?;
        let rotated = self.symplectic.rotate(x);
        let mut sum = 0.0;
        for col in rotated.column_iter() {
            sum += self.legendre.value(&col.into_owned())?;
            self.evaluations.set(self.evaluations.get() + 1);
        }
        Ok(sum / self.m as f64)
    }

    /// Evaluates `dF(x)`.
    pub fn gradient(&self, x: &Matrix) -> Result<Matrix> {
        self.value_and_gradient(x).map(|(_, grad)| grad)
    }

    /// Evaluates `F(x)` and `dF(x)` sharing the Legendre solves.
    pub fn value_and_gradient(&self, x: &Matrix) -> Result<(f64, Matrix)> {
        self.check_shape(x)?;
        let rotated = self.symplectic.rotate(x);
        let mut grad = Matrix::zeros(x.nrows(), x.ncols());
        let mut sum = 0.0;
        for (i, col) in rotated.column_iter().enumerate() {
            let (g, dual) = self.legendre.value_and_gradient(&col.into_owned())?;
            self.evaluations.set(self.evaluations.get() + 1);
            sum += g;
            grad.set_column(i, &self.symplectic.apply(&dual));
        }
        let m = self.m as f64;
        Ok((sum / m, grad / m))
    }
}
