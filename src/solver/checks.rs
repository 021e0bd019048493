//! Matrix attribute checks used as preconditions before inversion.

use nalgebra::DMatrix;

use crate::error::{InterconnectError, Result};

/// Numeric rank of `m`.
///
/// Counts singular values above `σ_max · max(rows, cols) · ε`.
pub fn numeric_rank(m: &DMatrix<f64>) -> usize {
    if m.is_empty() {
        return 0;
    }
    let sv = m.singular_values();
    let sigma_max = sv.iter().copied().fold(0.0, f64::max);
    let tol = sigma_max * (m.nrows().max(m.ncols()) as f64) * f64::EPSILON;
    sv.iter().filter(|&&s| s > tol).count()
}

/// Check whether a square matrix is singular (not of full numeric rank).
pub fn is_singular(m: &DMatrix<f64>) -> Result<bool> {
    if !m.is_square() {
        return Err(InterconnectError::Shape {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(numeric_rank(m) < m.nrows())
}

/// Check whether `m` is positive or negative semidefinite.
///
/// True when every eigenvalue is real and they are either all non-negative or
/// all non-positive.
pub fn can_ldlt_decompose(m: &DMatrix<f64>) -> Result<bool> {
    if !m.is_square() {
        return Err(InterconnectError::Shape {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    if m.is_empty() {
        return Ok(true);
    }
    let eigenvalues = m.complex_eigenvalues();
    let all_real = eigenvalues.iter().all(|e| e.im == 0.0);
    let non_negative = eigenvalues.iter().all(|e| e.re >= 0.0);
    let non_positive = eigenvalues.iter().all(|e| e.re <= 0.0);
    Ok(all_real && (non_negative || non_positive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_never_singular() {
        for n in 0..=12 {
            let id = DMatrix::<f64>::identity(n, n);
            assert!(!is_singular(&id).unwrap(), "identity({n})");
        }
    }

    #[test]
    fn test_zero_row_is_singular() {
        for n in 1..=6 {
            for zero in 0..n {
                let mut m = DMatrix::<f64>::from_fn(n, n, |i, j| 1.0 + (i * n + j) as f64 * 0.37);
                m.fill_diagonal(10.0);
                m.row_mut(zero).fill(0.0);
                assert!(is_singular(&m).unwrap(), "n = {n}, zero row {zero}");
            }
        }
    }

    #[test]
    fn test_rank_deficient_but_nonzero() {
        // Row 2 = row 0 + row 1
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 5.0, 7.0, 9.0]);
        assert_eq!(numeric_rank(&m), 2);
        assert!(is_singular(&m).unwrap());
    }

    #[test]
    fn test_tiny_conductances_are_not_singular() {
        // Femtofarad-scale entries must not be mistaken for rank loss
        let m = DMatrix::from_diagonal_element(4, 4, 1e-15);
        assert!(!is_singular(&m).unwrap());
    }

    #[test]
    fn test_non_square_is_shape_error() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert_eq!(
            is_singular(&m),
            Err(InterconnectError::Shape { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn test_ldlt_checks() {
        // Conductance Laplacian with a grounded node: positive definite
        let g = DMatrix::from_row_slice(2, 2, &[2.0, -1.0, -1.0, 1.0]);
        assert!(can_ldlt_decompose(&g).unwrap());
        assert!(can_ldlt_decompose(&(-g)).unwrap());

        // Indefinite
        let d = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![1.0, -1.0]));
        assert!(!can_ldlt_decompose(&d).unwrap());

        // Rotation: complex eigenvalues
        let r = DMatrix::from_row_slice(2, 2, &[0.0, -1.0, 1.0, 0.0]);
        assert!(!can_ldlt_decompose(&r).unwrap());

        assert!(can_ldlt_decompose(&DMatrix::zeros(1, 2)).is_err());
    }
}
