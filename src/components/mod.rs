//! Component models for interconnect analysis.
//!
//! This module provides models for all supported circuit elements:
//! - Linear: Resistor, Capacitor
//! - Sources: ideal Voltage Source (to ground)
//! - Probes: observed node voltages
//!
//! Each component is stamped into the MNA matrices by
//! [`crate::solver::stamp_components`].

mod linear;
mod sources;

pub use linear::{Capacitor, Resistor};
pub use sources::{Probe, VoltageSource};

/// A circuit component.
#[derive(Debug, Clone)]
pub enum Component {
    Resistor(Resistor),
    Capacitor(Capacitor),
    VoltageSource(VoltageSource),
}

impl Component {
    /// Get the component name.
    pub fn name(&self) -> &str {
        match self {
            Component::Resistor(r) => &r.name,
            Component::Capacitor(c) => &c.name,
            Component::VoltageSource(v) => &v.name,
        }
    }

    /// Check if this component adds a branch current state.
    pub fn has_branch(&self) -> bool {
        matches!(self, Component::VoltageSource(_))
    }
}
