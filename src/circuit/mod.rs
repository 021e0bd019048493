//! Circuit representation and construction.
//!
//! This module maps named nodes and typed elements onto MNA state indices.
//! [`CircuitBuilder`] collects resistors, capacitors, voltage sources and
//! output probes, then stamps them into an [`MnaSystem`](crate::solver::MnaSystem)
//! so that no caller has to track matrix rows by hand.

mod builder;
pub mod reference;
mod types;

pub use builder::{Circuit, CircuitBuilder, GROUND_NAMES};
pub use types::*;
