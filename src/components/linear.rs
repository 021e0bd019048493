//! Linear passive components: Resistor, Capacitor.

use crate::circuit::Terminal;
use crate::error::{InterconnectError, Result};

/// A resistor component.
///
/// Contributes its conductance 1/R to the G matrix.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    pub terminals: [Terminal; 2],
    pub resistance: f64,
}

impl Resistor {
    /// Create a new resistor.
    ///
    /// The resistance must be finite and strictly positive; an ideal short
    /// has no conductance to stamp.
    pub fn new(name: impl Into<String>, terminals: [Terminal; 2], resistance: f64) -> Result<Self> {
        let name = name.into();
        if !resistance.is_finite() || resistance <= 0.0 {
            return Err(InterconnectError::invalid_element(
                name,
                format!("resistance must be finite and positive (got {resistance})"),
            ));
        }
        Ok(Self {
            name,
            terminals,
            resistance,
        })
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        1.0 / self.resistance
    }
}

/// A capacitor component.
///
/// Contributes its capacitance to the C matrix. A zero capacitance is
/// allowed and leaves the matrix unchanged.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub name: String,
    pub terminals: [Terminal; 2],
    pub capacitance: f64,
}

impl Capacitor {
    /// Create a new capacitor.
    pub fn new(name: impl Into<String>, terminals: [Terminal; 2], capacitance: f64) -> Result<Self> {
        let name = name.into();
        if !capacitance.is_finite() || capacitance < 0.0 {
            return Err(InterconnectError::invalid_element(
                name,
                format!("capacitance must be finite and non-negative (got {capacitance})"),
            ));
        }
        Ok(Self {
            name,
            terminals,
            capacitance,
        })
    }
}
