//! Transfer-function moments.
//!
//! H(s) = Lᵗ·(sC + G)⁻¹·B expanded at s = 0 gives
//!
//! ```text
//! H(s) = Σ mᵢ sⁱ,   mᵢ = Lᵗ·Aⁱ·R,   A = −G⁻¹·C,   R = G⁻¹·B
//! ```
//!
//! m₀ is the DC gain; the higher moments feed AWE-style reduced-order models.
//! Precision degrades as Aⁱ grows ill-conditioned, which is not corrected.

use nalgebra::DMatrix;
use tracing::{debug, trace};

use crate::error::{InterconnectError, MatrixRole, Result};

use super::factor::Factorization;
use super::mna::MnaSystem;

/// Compute the first `count` moments of `system`, each a p×m matrix.
///
/// Fails with `SingularMatrix { G }` when G cannot be inverted.
pub fn moments(system: &MnaSystem, count: usize) -> Result<Vec<DMatrix<f64>>> {
    system.validate()?;
    debug!(states = system.size(), count, "computing moments");

    let g_lu = Factorization::new(&system.g, MatrixRole::G)?;
    let a = -g_lu.solve(&system.c)?;
    let r = g_lu.solve(&system.b)?;
    let lt = system.l.transpose();

    let mut result = Vec::with_capacity(count);
    let mut a_pow_r = r;
    for i in 0..count {
        let moment = &lt * &a_pow_r;
        trace!(index = i, max = moment.amax(), "moment");
        result.push(moment);
        if i + 1 < count {
            a_pow_r = &a * a_pow_r;
        }
    }
    Ok(result)
}

/// Like [`moments`], with a direct input-to-output term `feedthrough` (p×m)
/// folded into the first moment.
pub fn moments_with_feedthrough(
    system: &MnaSystem,
    feedthrough: &DMatrix<f64>,
    count: usize,
) -> Result<Vec<DMatrix<f64>>> {
    system.validate()?;
    let expected = (system.num_outputs(), system.num_inputs());
    if feedthrough.shape() != expected {
        return Err(InterconnectError::dimension_mismatch(
            "feedthrough",
            format!("{}x{}", expected.0, expected.1),
            format!("{}x{}", feedthrough.nrows(), feedthrough.ncols()),
        ));
    }

    let mut result = moments(system, count)?;
    if let Some(first) = result.first_mut() {
        *first += feedthrough;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::reference;
    use crate::solver::mna::{stamp_branch, stamp_lumped};
    use approx::assert_relative_eq;

    #[test]
    fn test_rc_divider_moments() {
        let (r1, r2, c) = (1e3, 1e3, 1e-15);
        let circuit = reference::rc_divider(r1, r2, c).unwrap();
        let m = moments(&circuit.system, 3).unwrap();

        assert_eq!(m.len(), 3);
        assert_eq!(m[0].shape(), (1, 1));

        let h0 = r2 / (r1 + r2);
        let tau = (r1 * r2 / (r1 + r2)) * c;
        assert_relative_eq!(m[0][(0, 0)], h0, max_relative = 1e-12);
        assert_relative_eq!(m[1][(0, 0)], -h0 * tau, max_relative = 1e-9);
        assert_relative_eq!(m[2][(0, 0)], h0 * tau * tau, max_relative = 1e-9);
    }

    #[test]
    fn test_coupled_lines_dc_gain_is_identity() {
        let circuit = reference::coupled_lines().unwrap();
        let m = moments(&circuit.system, 2).unwrap();

        assert_eq!(m.len(), 2);
        for moment in &m {
            assert_eq!(moment.shape(), (2, 2));
        }

        // Coupling is purely capacitive, so the lines are independent at DC
        assert_relative_eq!(m[0][(0, 0)], 1.0, max_relative = 1e-12);
        assert_relative_eq!(m[0][(1, 1)], 1.0, max_relative = 1e-12);
        assert!(m[0][(0, 1)].abs() < 1e-12);
        assert!(m[0][(1, 0)].abs() < 1e-12);

        // First moment is minus the Elmore delay on the diagonal
        assert!(m[1][(0, 0)] < 0.0);
        assert_relative_eq!(m[1][(0, 0)], m[1][(1, 1)], max_relative = 1e-9);
        // Coupling pulls the quiet line toward the switching one
        assert!(m[1][(1, 0)] > 0.0);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let circuit = reference::rc_divider(1e3, 1e3, 1e-15).unwrap();
        assert!(moments(&circuit.system, 0).unwrap().is_empty());
    }

    #[test]
    fn test_singular_g_rejected() {
        // Node 1 floats at DC: only a capacitor touches it
        let mut sys = MnaSystem::zeros(2, 1, 1);
        stamp_lumped(&mut sys.g, 0, 1e-3);
        stamp_branch(&mut sys.c, 0, 1, 1e-15);
        sys.b[(0, 0)] = 1.0;
        sys.l[(1, 0)] = 1.0;

        assert_eq!(
            moments(&sys, 2).unwrap_err(),
            InterconnectError::SingularMatrix {
                matrix: MatrixRole::G
            }
        );
    }

    #[test]
    fn test_mismatched_shapes_rejected() {
        let mut sys = reference::rc_divider(1e3, 1e3, 1e-15).unwrap().system;
        sys.b = DMatrix::zeros(1, 1);
        assert!(matches!(
            moments(&sys, 2),
            Err(InterconnectError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_feedthrough_added_to_first_moment_only() {
        let circuit = reference::rc_divider(1e3, 1e3, 1e-15).unwrap();
        let plain = moments(&circuit.system, 2).unwrap();
        let e = DMatrix::from_element(1, 1, 0.25);
        let with = moments_with_feedthrough(&circuit.system, &e, 2).unwrap();

        assert_relative_eq!(with[0][(0, 0)], plain[0][(0, 0)] + 0.25);
        assert_eq!(with[1], plain[1]);

        let bad = DMatrix::zeros(2, 1);
        assert!(moments_with_feedthrough(&circuit.system, &bad, 2).is_err());
    }
}
