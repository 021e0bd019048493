//! MNA matrix assembly.

use nalgebra::DMatrix;

use crate::components::{Component, Probe};
use crate::error::{InterconnectError, Result};

/// MNA system C·dX/dt = −G·X + B·u, Y = Lᵗ·X.
#[derive(Debug, Clone, PartialEq)]
pub struct MnaSystem {
    /// Conductance matrix (n×n)
    pub g: DMatrix<f64>,
    /// Capacitance matrix (n×n)
    pub c: DMatrix<f64>,
    /// Input matrix (n×m)
    pub b: DMatrix<f64>,
    /// Output matrix (n×p)
    pub l: DMatrix<f64>,
}

impl MnaSystem {
    /// Create a system from its four matrices, checking that their shapes agree.
    pub fn new(g: DMatrix<f64>, c: DMatrix<f64>, b: DMatrix<f64>, l: DMatrix<f64>) -> Result<Self> {
        let system = Self { g, c, b, l };
        system.validate()?;
        Ok(system)
    }

    /// Check that G and C are square of the same size and that B and L have
    /// one row per state.
    ///
    /// The fields are public, so every analysis entry point re-checks.
    pub fn validate(&self) -> Result<()> {
        let n = self.g.nrows();
        if n == 0 {
            return Err(InterconnectError::InvalidTopology {
                message: "MNA system has no state variables".to_string(),
            });
        }
        if self.g.ncols() != n {
            return Err(InterconnectError::dimension_mismatch(
                "G",
                format!("{n}x{n}"),
                format!("{}x{}", self.g.nrows(), self.g.ncols()),
            ));
        }
        if self.c.shape() != (n, n) {
            return Err(InterconnectError::dimension_mismatch(
                "C",
                format!("{n}x{n}"),
                format!("{}x{}", self.c.nrows(), self.c.ncols()),
            ));
        }
        if self.b.nrows() != n {
            return Err(InterconnectError::dimension_mismatch("B rows", n, self.b.nrows()));
        }
        if self.l.nrows() != n {
            return Err(InterconnectError::dimension_mismatch("L rows", n, self.l.nrows()));
        }
        Ok(())
    }

    /// Create a zero-initialized system with `size` states, `inputs` sources and `outputs` probes.
    pub fn zeros(size: usize, inputs: usize, outputs: usize) -> Self {
        Self {
            g: DMatrix::zeros(size, size),
            c: DMatrix::zeros(size, size),
            b: DMatrix::zeros(size, inputs),
            l: DMatrix::zeros(size, outputs),
        }
    }

    /// Number of state variables (n).
    pub fn size(&self) -> usize {
        self.g.nrows()
    }

    /// Number of inputs (m).
    pub fn num_inputs(&self) -> usize {
        self.b.ncols()
    }

    /// Number of outputs (p).
    pub fn num_outputs(&self) -> usize {
        self.l.ncols()
    }
}

/// Stamp a single-terminal (to-ground) element.
///   M[i,i] += value
pub fn stamp_lumped(m: &mut DMatrix<f64>, i: usize, value: f64) {
    m[(i, i)] += value;
}

/// Stamp an element between two nodes.
///   M[i,i] += value
///   M[j,j] += value
///   M[i,j] -= value
///   M[j,i] -= value
pub fn stamp_branch(m: &mut DMatrix<f64>, i: usize, j: usize, value: f64) {
    m[(i, i)] += value;
    m[(j, j)] += value;
    m[(i, j)] -= value;
    m[(j, i)] -= value;
}

/// Couple a voltage source's branch-current state to its node.
///   M[branch,node] = 1
///   M[node,branch] = -1
pub fn stamp_branch_current(m: &mut DMatrix<f64>, branch: usize, node: usize) {
    m[(branch, node)] = 1.0;
    m[(node, branch)] = -1.0;
}

/// Stamp a two-terminal value into `m`, lumped when one end is ground.
fn stamp_two_terminal(m: &mut DMatrix<f64>, n1: Option<usize>, n2: Option<usize>, value: f64) {
    match (n1, n2) {
        (Some(i), Some(j)) => stamp_branch(m, i, j, value),
        (Some(i), None) | (None, Some(i)) => stamp_lumped(m, i, value),
        (None, None) => {}
    }
}

/// Stamp all components and probes into a zero-initialized system.
///
/// `num_nodes` is the number of non-ground nodes; branch currents occupy the
/// rows after them.
pub fn stamp_components(
    components: &[Component],
    probes: &[Probe],
    num_nodes: usize,
    system: &mut MnaSystem,
) {
    for component in components {
        match component {
            Component::Resistor(r) => {
                let n1 = r.terminals[0].index();
                let n2 = r.terminals[1].index();
                stamp_two_terminal(&mut system.g, n1, n2, r.conductance());
            }

            Component::Capacitor(c) => {
                let n1 = c.terminals[0].index();
                let n2 = c.terminals[1].index();
                stamp_two_terminal(&mut system.c, n1, n2, c.capacitance);
            }

            Component::VoltageSource(v) => {
                let br = num_nodes + v.branch.0;
                stamp_branch_current(&mut system.g, br, v.node.0);
                // Branch row reads 0 = -(V(node)) + u, so V(node) = u
                system.b[(br, v.input)] = 1.0;
            }
        }
    }

    for probe in probes {
        system.l[(probe.node.0, probe.output)] = 1.0;
    }
}
