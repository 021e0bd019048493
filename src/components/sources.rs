//! Voltage sources and output probes.

use crate::circuit::{BranchId, NodeId};

/// An ideal voltage source from ground to a node.
///
/// Voltage sources require an extra row/column in the MNA matrices for the
/// branch current. The source enforces V(node) = u[input], where `input`
/// is the source's column in the B matrix.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub name: String,
    pub node: NodeId,
    pub branch: BranchId,
    pub input: usize,
}

impl VoltageSource {
    /// Create a new voltage source.
    pub fn new(name: impl Into<String>, node: NodeId, branch: BranchId, input: usize) -> Self {
        Self {
            name: name.into(),
            node,
            branch,
            input,
        }
    }
}

/// An observed node voltage.
///
/// Each probe is one column of the L matrix: Y[output] = V(node).
#[derive(Debug, Clone)]
pub struct Probe {
    pub node: NodeId,
    pub output: usize,
}

impl Probe {
    /// Create a new probe.
    pub fn new(node: NodeId, output: usize) -> Self {
        Self { node, output }
    }
}
