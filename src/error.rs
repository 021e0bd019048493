//! Error types for the interconnect analysis engine.
//!
//! This module provides a unified error type [`InterconnectError`] that covers
//! all error conditions that can occur while building a circuit, checking its
//! matrices, regularizing it, and computing moments or transient responses.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`InterconnectError`].
pub type Result<T> = std::result::Result<T, InterconnectError>;

/// Which matrix of the analysis pipeline failed a singularity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixRole {
    /// Full conductance matrix, inverted for moment computation
    G,
    /// Algebraic block of the permuted conductance matrix
    G22,
    /// Capacitance matrix of the regularized system
    Creg,
    /// Implicit step matrix I − κ·Creg⁻¹·(−Greg) of the transient integrator
    Step,
}

impl fmt::Display for MatrixRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixRole::G => write!(f, "G"),
            MatrixRole::G22 => write!(f, "G22"),
            MatrixRole::Creg => write!(f, "Creg"),
            MatrixRole::Step => write!(f, "transient step"),
        }
    }
}

/// Unified error type for all analysis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterconnectError {
    // ============ Matrix Errors ============
    /// A square-only operation received a rectangular matrix
    #[error("Singularity test only works on square matrices (got {rows}x{cols})")]
    Shape { rows: usize, cols: usize },

    /// Matrix is singular and cannot be inverted
    #[error("Supplied {matrix} matrix is singular - circuit may contain a node cluster with no DC path to a driver or ground")]
    SingularMatrix { matrix: MatrixRole },

    /// Matrix dimensions do not agree
    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: String,
        expected: String,
        found: String,
    },

    // ============ Circuit Construction Errors ============
    /// Invalid element value or connection
    #[error("Invalid element '{name}': {message}")]
    InvalidElement { name: String, message: String },

    /// Duplicate element name
    #[error("Duplicate element name '{name}'")]
    DuplicateElement { name: String },

    /// Invalid circuit topology
    #[error("Invalid circuit topology: {message}")]
    InvalidTopology { message: String },

    // ============ Simulation Errors ============
    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ I/O Errors ============
    /// Error writing analysis results
    #[error("Output error: {message}")]
    OutputError { message: String },
}

impl InterconnectError {
    /// Create a singular matrix error
    pub fn singular(matrix: MatrixRole) -> Self {
        Self::SingularMatrix { matrix }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(
        context: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create an invalid element error
    pub fn invalid_element(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidElement {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an output error from an I/O failure
    pub fn output(err: std::io::Error) -> Self {
        Self::OutputError {
            message: err.to_string(),
        }
    }

    /// Create an invalid simulation parameter error
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }
}
