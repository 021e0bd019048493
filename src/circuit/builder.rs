//! Circuit construction by element.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::types::{BranchId, NodeId, Terminal};
use crate::components::{Capacitor, Component, Probe, Resistor, VoltageSource};
use crate::error::{InterconnectError, Result};
use crate::solver::{stamp_components, MnaSystem};

/// Names that refer to the ground node.
pub const GROUND_NAMES: [&str; 3] = ["0", "gnd", "GND"];

/// Incrementally describes a circuit by named nodes and typed elements.
///
/// Node rows are assigned in order of first use; branch currents for voltage
/// sources follow all node voltages in the state vector.
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    node_map: HashMap<String, NodeId>,
    node_names: Vec<String>,
    components: Vec<Component>,
    probes: Vec<Probe>,
    element_names: HashSet<String>,
    num_branches: usize,
}

impl CircuitBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by name, creating it on first use.
    pub fn node(&mut self, name: &str) -> Terminal {
        if GROUND_NAMES.contains(&name) {
            return Terminal::Ground;
        }
        if let Some(&id) = self.node_map.get(name) {
            return Terminal::Node(id);
        }
        let id = NodeId(self.node_names.len());
        self.node_map.insert(name.to_string(), id);
        self.node_names.push(name.to_string());
        Terminal::Node(id)
    }

    /// Find an existing node by name.
    pub fn find_node(&self, name: &str) -> Option<Terminal> {
        if GROUND_NAMES.contains(&name) {
            return Some(Terminal::Ground);
        }
        self.node_map.get(name).map(|&id| Terminal::Node(id))
    }

    fn claim_name(&mut self, name: &str) -> Result<()> {
        if !self.element_names.insert(name.to_string()) {
            return Err(InterconnectError::DuplicateElement {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Add a resistor between `a` and `b`.
    pub fn add_resistor(&mut self, name: &str, a: Terminal, b: Terminal, ohms: f64) -> Result<()> {
        let resistor = Resistor::new(name, [a, b], ohms)?;
        self.claim_name(name)?;
        self.components.push(Component::Resistor(resistor));
        Ok(())
    }

    /// Add a capacitor between `a` and `b`.
    pub fn add_capacitor(&mut self, name: &str, a: Terminal, b: Terminal, farads: f64) -> Result<()> {
        let capacitor = Capacitor::new(name, [a, b], farads)?;
        self.claim_name(name)?;
        self.components.push(Component::Capacitor(capacitor));
        Ok(())
    }

    /// Add an ideal voltage source from ground to `node`.
    ///
    /// Returns the source's input index (its column of B).
    pub fn add_voltage_source(&mut self, name: &str, node: Terminal) -> Result<usize> {
        let node = match node {
            Terminal::Node(id) => id,
            Terminal::Ground => {
                return Err(InterconnectError::invalid_element(
                    name,
                    "voltage source cannot drive the ground node",
                ))
            }
        };
        self.claim_name(name)?;
        let input = self.num_branches;
        let branch = BranchId(self.num_branches);
        self.num_branches += 1;
        self.components
            .push(Component::VoltageSource(VoltageSource::new(name, node, branch, input)));
        Ok(input)
    }

    /// Observe the voltage at `node`.
    ///
    /// Returns the output index (its column of L).
    pub fn add_output(&mut self, node: Terminal) -> Result<usize> {
        let node = match node {
            Terminal::Node(id) => id,
            Terminal::Ground => {
                return Err(InterconnectError::invalid_element(
                    "output",
                    "ground voltage is identically zero",
                ))
            }
        };
        let output = self.probes.len();
        self.probes.push(Probe::new(node, output));
        Ok(output)
    }

    /// Stamp every element into a fresh MNA system.
    pub fn build(self) -> Result<Circuit> {
        if self.components.is_empty() {
            return Err(InterconnectError::InvalidTopology {
                message: "Circuit has no components".to_string(),
            });
        }
        let num_nodes = self.node_names.len();
        let size = num_nodes + self.num_branches;
        if size == 0 {
            return Err(InterconnectError::InvalidTopology {
                message: "Circuit has no non-ground nodes".to_string(),
            });
        }

        let mut system = MnaSystem::zeros(size, self.num_branches, self.probes.len());
        stamp_components(&self.components, &self.probes, num_nodes, &mut system);

        let mut labels: Vec<String> = self.node_names.iter().map(|n| format!("v({n})")).collect();
        let mut input_names = Vec::with_capacity(self.num_branches);
        for component in self.components.iter().filter(|c| c.has_branch()) {
            labels.push(format!("i({})", component.name()));
            input_names.push(component.name().to_string());
        }

        debug!(
            nodes = num_nodes,
            branches = self.num_branches,
            outputs = self.probes.len(),
            "built MNA system"
        );

        Ok(Circuit {
            system,
            node_names: self.node_names,
            labels,
            input_names,
        })
    }
}

/// A circuit stamped into MNA form.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// G, C, B, L matrices
    pub system: MnaSystem,

    /// Node names in row order
    pub node_names: Vec<String>,

    /// One label per state variable, `v(<node>)` or `i(<source>)`
    pub labels: Vec<String>,

    /// Voltage source names in input order
    pub input_names: Vec<String>,
}

impl Circuit {
    /// Get the label of a state variable.
    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }
}
