//! Core types for circuit representation.

/// A non-ground node of the circuit.
/// The wrapped value is the node's row in the MNA matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One end of a two-terminal element.
///
/// Ground is its own variant rather than a reserved node number, so it can
/// never be given a matrix row or stamped into by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// The reference node
    Ground,
    /// An ordinary node with a row in the MNA system
    Node(NodeId),
}

impl Terminal {
    /// Get the matrix index for this terminal.
    /// Returns None for ground.
    pub fn index(&self) -> Option<usize> {
        match self {
            Terminal::Ground => None,
            Terminal::Node(NodeId(n)) => Some(*n),
        }
    }
}

/// Index for extra variables in the MNA matrix (voltage source currents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_has_no_index() {
        assert_eq!(Terminal::Ground.index(), None);
        assert_eq!(Terminal::Node(NodeId(3)).index(), Some(3));
    }
}
