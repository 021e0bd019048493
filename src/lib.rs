//! # Interconnect Core
//!
//! Modified Nodal Analysis of linear RC interconnect.
//!
//! This library provides:
//! - Element stamping of resistors, capacitors and ideal voltage sources into
//!   the MNA form C·dX/dt = −G·X + B·u, Y = Lᵗ·X
//! - Numeric singularity checks that gate every matrix inversion
//! - Regularization of the resulting differential-algebraic system into a
//!   pure ODE by Schur-complement elimination of uncapacitated states
//! - Transfer-function moments at DC for AWE-style macromodels
//! - Transient simulation of the regularized system
//!
//! ## Architecture
//!
//! - [`circuit`] - Named-node circuit builder and reference circuits
//! - [`components`] - Element models (resistor, capacitor, voltage source)
//! - [`solver`] - Stamping, checks, regularization, moments and simulation
//! - [`error`] - Error type shared by every stage
//!
//! ## Usage
//!
//! ```no_run
//! use interconnect_core::circuit::reference;
//! use interconnect_core::solver::{
//!     moments, regularize, simulate, uniform_grid, waveform_input, TransientConfig, Waveform,
//! };
//!
//! # fn main() -> interconnect_core::Result<()> {
//! let circuit = reference::coupled_lines()?;
//! let m = moments(&circuit.system, 2)?;
//! println!("DC gain:\n{}", m[0]);
//!
//! let reduced = regularize(&circuit.system)?;
//! let times = uniform_grid(0.0, 1e-9, 1e-12)?;
//! let input = waveform_input(vec![
//!     Waveform::Step { at: 0.0, level: 1.0 },
//!     Waveform::Constant(0.0),
//! ]);
//! let points = simulate(&reduced.system, input, &times, &TransientConfig::default())?;
//! # let _ = points;
//! # Ok(())
//! # }
//! ```
//!
//! ## Analysis Method
//!
//! Any state whose row of C is zero (driver nodes, source currents) makes the
//! system algebraic in that variable. Those states are permuted to the end,
//! the conductance block G22 they form is factored once, and its Schur
//! complement gives a reduced system with no zero rows in C (Su, ASP-DAC
//! 2002). Moments are computed on the full system, which only needs G to be
//! invertible.

pub mod circuit;
pub mod components;
pub mod error;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{Circuit, CircuitBuilder};
pub use error::{InterconnectError, MatrixRole, Result};
pub use solver::MnaSystem;
