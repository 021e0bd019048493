//! Reusable LU factorization.

use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};

use crate::error::{InterconnectError, MatrixRole, Result};

use super::checks::is_singular;

/// LU decomposition of a square matrix, factored once and solved many times.
///
/// A `Factorization` lives only as long as the analysis call that creates it;
/// nothing caches one across calls.
pub struct Factorization {
    lu: LU<f64, Dyn, Dyn>,
    dim: usize,
    role: MatrixRole,
}

impl Factorization {
    /// Factor `m`, failing with [`InterconnectError::SingularMatrix`] tagged
    /// with `role` if it is not of full numeric rank.
    pub fn new(m: &DMatrix<f64>, role: MatrixRole) -> Result<Self> {
        if is_singular(m)? {
            return Err(InterconnectError::singular(role));
        }
        Ok(Self {
            lu: m.clone().lu(),
            dim: m.nrows(),
            role,
        })
    }

    /// Dimension of the factored matrix.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Solve M·X = rhs for X.
    pub fn solve(&self, rhs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if rhs.nrows() != self.dim {
            return Err(InterconnectError::dimension_mismatch(
                format!("{} solve right-hand side rows", self.role),
                self.dim,
                rhs.nrows(),
            ));
        }
        self.lu
            .solve(rhs)
            .ok_or(InterconnectError::singular(self.role))
    }

    /// Solve M·x = rhs for a single vector.
    pub fn solve_vector(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        if rhs.len() != self.dim {
            return Err(InterconnectError::dimension_mismatch(
                format!("{} solve right-hand side length", self.role),
                self.dim,
                rhs.len(),
            ));
        }
        self.lu
            .solve(rhs)
            .ok_or(InterconnectError::singular(self.role))
    }
}
