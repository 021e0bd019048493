//! Regularization of the MNA system into a pure ODE.
//!
//! State variables whose row of C is entirely zero carry no dynamics: the
//! system C·dX/dt = −G·X + B·u is then differential-algebraic and cannot be
//! handed to an explicit integrator. Following Su (Proc. 15th ASP-DAC, 2002),
//! the algebraic states are permuted to the bottom of the system,
//!
//! ```text
//! [ C11 0 ] d  [ X1 ]     [ G11 G12 ] [ X1 ]   [ B1 ]
//! [ 0   0 ] dt [ X2 ] = − [ G21 G22 ] [ X2 ] + [ B2 ] u
//! ```
//!
//! and eliminated through the Schur complement of G22:
//!
//! ```text
//! Greg = G11 − G12·G22⁻¹·G21
//! Breg = B1  − G12·G22⁻¹·B2
//! Lreg = (L1ᵗ − L2ᵗ·G22⁻¹·G21)ᵗ
//! Creg = C11
//! ```

use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::error::{MatrixRole, Result};

use super::factor::Factorization;
use super::mna::MnaSystem;

/// Largest feedthrough entry tolerated without a warning.
pub const FEEDTHROUGH_TOLERANCE: f64 = 1e-12;

/// Mark the rows of `c` that are entirely zero.
pub fn zero_rows(c: &DMatrix<f64>) -> Vec<bool> {
    c.row_iter().map(|row| row.iter().all(|&v| v == 0.0)).collect()
}

/// A state permutation built from disjoint transpositions.
///
/// `map[new] = old`. Because every swap is disjoint the permutation is its
/// own inverse: P·P = I.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    map: Vec<usize>,
}

impl Permutation {
    /// The identity permutation on `n` states.
    pub fn identity(n: usize) -> Self {
        Self {
            map: (0..n).collect(),
        }
    }

    /// Move every `true` entry of `zero_rows` into a trailing block.
    ///
    /// A forward index looks for the first zero row, a backward index for the
    /// last nonzero row, and the two are exchanged until the indices meet.
    pub fn partition_zero_rows(zero_rows: &[bool]) -> Self {
        let n = zero_rows.len();
        let mut perm = Self::identity(n);
        if n == 0 {
            return perm;
        }

        let (mut i, mut j) = (0usize, n - 1);
        // rows > j are all zero; rows < i are not
        while i < j {
            while i < n && !zero_rows[i] {
                i += 1;
            }
            while j > 0 && zero_rows[j] {
                j -= 1;
            }
            if i < j {
                perm.map.swap(i, j);
                i += 1;
                j -= 1;
            }
        }
        perm
    }

    /// Number of states permuted.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the permutation is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Check if no state moves.
    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(new, &old)| new == old)
    }

    /// Original state index for each permuted position.
    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }

    /// Materialize P as an n×n matrix.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let n = self.map.len();
        let mut p = DMatrix::zeros(n, n);
        for (new, &old) in self.map.iter().enumerate() {
            p[(new, old)] = 1.0;
        }
        p
    }

    /// P·M
    pub fn permute_rows(&self, m: &DMatrix<f64>) -> DMatrix<f64> {
        m.select_rows(self.map.iter())
    }

    /// P·M·Pᵗ
    pub fn permute_symmetric(&self, m: &DMatrix<f64>) -> DMatrix<f64> {
        m.select_rows(self.map.iter()).select_columns(self.map.iter())
    }
}

/// A regularized system together with the permutation that produced it.
#[derive(Debug, Clone)]
pub struct Regularized {
    /// Reduced system (Greg, Creg, Breg, Lreg) of dimension k
    pub system: MnaSystem,
    /// Permutation applied before partitioning
    pub permutation: Permutation,
    /// Direct input-to-output term L2ᵗ·G22⁻¹·B2 (p×m) dropped by the reduction
    pub feedthrough: DMatrix<f64>,
    retained: usize,
}

impl Regularized {
    /// Number of dynamic states kept (k).
    pub fn dim(&self) -> usize {
        self.retained
    }

    /// Original state indices of the reduced states, in reduced order.
    pub fn retained_states(&self) -> &[usize] {
        &self.permutation.as_slice()[..self.retained]
    }

    /// Original state indices that were eliminated.
    pub fn eliminated_states(&self) -> &[usize] {
        &self.permutation.as_slice()[self.retained..]
    }

    /// Check if the reduction dropped a nonzero input-to-output term.
    pub fn has_feedthrough(&self) -> bool {
        self.feedthrough.amax() > FEEDTHROUGH_TOLERANCE
    }
}

/// Eliminate the algebraic states of `system`, producing a reduced system
/// whose C matrix has no zero rows.
///
/// Fails with `SingularMatrix { G22 }` when the algebraic block cannot be
/// solved in isolation, e.g. a cluster of uncapacitated nodes with no
/// conductive path to any capacitively anchored node.
pub fn regularize(system: &MnaSystem) -> Result<Regularized> {
    system.validate()?;
    let n = system.size();
    let zero_rows = zero_rows(&system.c);
    let zero_count = zero_rows.iter().filter(|&&z| z).count();
    let k = n - zero_count;

    debug!(states = n, dynamic = k, algebraic = zero_count, "regularizing MNA system");

    if zero_count == 0 {
        return Ok(Regularized {
            system: system.clone(),
            permutation: Permutation::identity(n),
            feedthrough: DMatrix::zeros(system.num_outputs(), system.num_inputs()),
            retained: n,
        });
    }

    // 1. Permutation moving zero rows to the bottom
    let permutation = Permutation::partition_zero_rows(&zero_rows);

    // 2. Apply permutation to MNA matrices
    let gp = permutation.permute_symmetric(&system.g);
    let cp = permutation.permute_symmetric(&system.c);
    let bp = permutation.permute_rows(&system.b);
    let lp = permutation.permute_rows(&system.l);

    // 3. Partition at k
    let g11 = gp.view((0, 0), (k, k)).clone_owned();
    let g12 = gp.view((0, k), (k, zero_count)).clone_owned();
    let g21 = gp.view((k, 0), (zero_count, k)).clone_owned();
    let g22 = gp.view((k, k), (zero_count, zero_count)).clone_owned();

    let l1 = lp.rows(0, k).clone_owned();
    let l2 = lp.rows(k, zero_count).clone_owned();

    let b1 = bp.rows(0, k).clone_owned();
    let b2 = bp.rows(k, zero_count).clone_owned();

    let c_reg = cp.view((0, 0), (k, k)).clone_owned();

    // 4. Schur complement of G22, factored once for both solves
    let g22_lu = Factorization::new(&g22, MatrixRole::G22)?;
    let g22inv_g21 = g22_lu.solve(&g21)?;
    let g22inv_b2 = g22_lu.solve(&b2)?;

    let g_reg = &g11 - &g12 * &g22inv_g21;
    let l_reg = (l1.transpose() - l2.transpose() * &g22inv_g21).transpose();
    let b_reg = &b1 - &g12 * &g22inv_b2;

    // The reduced form has no place for an input-to-output term
    let feedthrough = l2.transpose() * &g22inv_b2;
    if feedthrough.amax() > FEEDTHROUGH_TOLERANCE {
        warn!(
            max = feedthrough.amax(),
            "regularization dropped a nonzero feedthrough term"
        );
    }

    Ok(Regularized {
        system: MnaSystem {
            g: g_reg,
            c: c_reg,
            b: b_reg,
            l: l_reg,
        },
        permutation,
        feedthrough,
        retained: k,
    })
}
