//! Linear algebra primitives of the standard symplectic structure.
//!
//! The phase space R^{2n} is ordered as `(q_1, ..., q_n, p_1, ..., p_n)` and
//! carries the block matrix
//!
//! ```text
//! J = [  0  I ]
//!     [ -I  0 ]
//! ```
//!
//! which satisfies `J^2 = -I` and `J^T = -J`. Configurations of `m` points are
//! `2n x m` matrices; the operators here act on all columns at once.

use crate::types::{Matrix, Vector};

/// The symplectic matrix `J` of R^{2n} and the operators built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SymplecticForm {
    n: usize,
    j: Matrix,
}

impl SymplecticForm {
    /// Builds `J` for the half-dimension `n`.
    pub fn new(n: usize) -> Self {
        let dim = 2 * n;
        let j = Matrix::from_fn(dim, dim, |row, col| {
            if row < n && col == row + n {
                1.0
            } else if row >= n && col + n == row {
                -1.0
            } else {
                0.0
            }
        });
        Self { n, j }
    }

    /// Half-dimension `n`.
    pub fn half_dimension(&self) -> usize {
        self.n
    }

    /// Dimension `2n` of the phase space.
    pub fn dimension(&self) -> usize {
        2 * self.n
    }

    /// The matrix `J`.
    pub fn matrix(&self) -> &Matrix {
        &self.j
    }

    /// Computes `J v`.
    pub fn apply(&self, v: &Vector) -> Vector {
        &self.j * v
    }

    /// Computes `-J x` for every column of `x`.
    ///
    /// This maps sample points to the coordinates in which the Legendre
    /// transform is evaluated.
    pub fn rotate(&self, x: &Matrix) -> Matrix {
        -(&self.j * x)
    }

    /// Computes the product `A_{2n} x`.
    ///
    /// Column `k` of the result is the sum of the rotated columns `-J x_j`
    /// over all `j > k`; the last column is zero. The sum is accumulated
    /// from the right so the cost is linear in `m`.
    pub fn shift_sum(&self, x: &Matrix) -> Matrix {
        let rotated = self.rotate(x);
        let mut out = Matrix::zeros(x.nrows(), x.ncols());
        let mut acc = Vector::zeros(x.nrows());
        for k in (0..x.ncols()).rev() {
            out.set_column(k, &acc);
            acc += rotated.column(k);
        }
        out
    }

    /// Quadratic action pairing `<x, A_{2n} x>`.
    pub fn action_pairing(&self, x: &Matrix) -> f64 {
        x.dot(&self.shift_sum(x))
    }
}

/// Reverses the order of the columns of `x`.
pub fn flip_columns(x: &Matrix) -> Matrix {
    let cols = x.ncols();
    Matrix::from_fn(x.nrows(), cols, |i, j| x[(i, cols - 1 - j)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(rows: usize, cols: usize) -> Matrix {
        Matrix::from_fn(rows, cols, |i, j| {
            ((i * 7 + j * 3) as f64).sin() + 0.25 * (j as f64)
        })
    }

    #[test]
    fn test_j_structure() {
        let form = SymplecticForm::new(2);
        let j = form.matrix();
        assert_eq!(j.nrows(), 4);
        assert_eq!(j[(0, 2)], 1.0);
        assert_eq!(j[(1, 3)], 1.0);
        assert_eq!(j[(2, 0)], -1.0);
        assert_eq!(j[(3, 1)], -1.0);
        assert_eq!(j.iter().filter(|v| **v != 0.0).count(), 4);

        let j_sq = j * j;
        assert_relative_eq!(j_sq, -Matrix::identity(4, 4), epsilon = 1e-15);
        assert_relative_eq!(j.transpose(), -j.clone(), epsilon = 1e-15);
    }

    #[test]
    fn test_rotate_matches_columnwise_apply() {
        let form = SymplecticForm::new(1);
        let x = sample(2, 4);
        let rotated = form.rotate(&x);
        for k in 0..4 {
            let expected = -form.apply(&x.column(k).into_owned());
            assert_relative_eq!(rotated.column(k).into_owned(), expected, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_shift_sum_matches_double_loop() {
        let form = SymplecticForm::new(2);
        let x = sample(4, 6);
        let rotated = form.rotate(&x);

        let mut expected = Matrix::zeros(4, 6);
        for k in 0..6 {
            for j in (k + 1)..6 {
                let col = expected.column(k) + rotated.column(j);
                expected.set_column(k, &col);
            }
        }

        let b = form.shift_sum(&x);
        assert_relative_eq!(b, expected, epsilon = 1e-12);
        assert_eq!(b.column(5).norm(), 0.0);
    }

    #[test]
    fn test_flip_reverses_action_sign() {
        let form = SymplecticForm::new(2);
        let x = sample(4, 5);
        let q = form.action_pairing(&x);
        let q_flipped = form.action_pairing(&flip_columns(&x));
        assert_relative_eq!(q_flipped, -q, epsilon = 1e-12);
    }

    #[test]
    fn test_flip_is_involution() {
        let x = sample(2, 7);
        assert_eq!(flip_columns(&flip_columns(&x)), x);
        assert_eq!(flip_columns(&x).column(0), x.column(6));
    }
}
