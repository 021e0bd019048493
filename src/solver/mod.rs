//! MNA analysis engine.
//!
//! This module provides the numerical core for interconnect analysis.
//!
//! ## Modified Nodal Analysis
//!
//! A linear RC network with ideal voltage sources is described by
//! ```text
//! C·dX/dt = −G·X + B·u
//!       Y = Lᵗ·X
//! ```
//! where:
//! - X holds node voltages followed by voltage source branch currents
//! - G holds conductances and source couplings, C holds capacitances
//! - B maps the source vector u onto the state equations
//! - L selects the observed quantities Y
//!
//! ## Pipeline
//!
//! 1. [`stamp_components`] (or the raw stamp primitives) fills G, C, B, L
//! 2. [`is_singular`] gates every inversion
//! 3. [`regularize`] eliminates states without capacitance
//! 4. [`moments`] expands the transfer function at DC, or
//!    [`simulate`] integrates the regularized system in time

mod checks;
mod factor;
mod mna;
mod moments;
mod regularize;
mod transient;

pub use checks::{can_ldlt_decompose, is_singular, numeric_rank};
pub use factor::Factorization;
pub use mna::{stamp_branch, stamp_branch_current, stamp_components, stamp_lumped, MnaSystem};
pub use moments::{moments, moments_with_feedthrough};
pub use regularize::{regularize, zero_rows, Permutation, Regularized, FEEDTHROUGH_TOLERANCE};
pub use transient::{
    simulate, uniform_grid, waveform_input, CircuitOde, TimePoint, TransientConfig, Waveform,
    DEFAULT_MAX_STEP_SCALE, DEFAULT_MAX_SUBSTEPS, MAX_GRID_POINTS, TRBDF2_GAMMA,
};
