//! Classification of circuit nodes into solver unknowns.
//!
//! Provides contiguous solver indices for the static and dynamic unknown
//! sets, and the bookkeeping to move potentials between the circuit and
//! solver state vectors.

use rf_core::NodeId;
use rf_network::{Circuit, NetworkError};

use crate::error::{SolverError, SolverResult};

/// Index partition of a circuit's nodes.
///
/// - boundary nodes are inputs and excluded from every unknown set
/// - dynamic nodes (capacity > 0) are ODE states
/// - static nodes (capacity == 0) are Newton unknowns
///
/// Built once from a circuit; it records the circuit revision it was built
/// at so later topology changes can be detected.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    boundary: Vec<NodeId>,
    dynamics: Vec<NodeId>,
    statics: Vec<NodeId>,
    /// `capacity` of each dynamic node, aligned with `dynamics`.
    capacities: Vec<f64>,
    revision: u64,
}

impl Partition {
    pub fn from_circuit(circuit: &Circuit) -> Self {
        let mut boundary = Vec::new();
        let mut dynamics = Vec::new();
        let mut statics = Vec::new();
        let mut capacities = Vec::new();

        for node in circuit.nodes() {
            if node.is_boundary() {
                boundary.push(node.id());
            } else if node.is_dynamic() {
                dynamics.push(node.id());
                capacities.push(node.capacity());
            } else {
                statics.push(node.id());
            }
        }

        Self {
            boundary,
            dynamics,
            statics,
            capacities,
            revision: circuit.revision(),
        }
    }

    pub fn boundary(&self) -> &[NodeId] {
        &self.boundary
    }

    pub fn dynamics(&self) -> &[NodeId] {
        &self.dynamics
    }

    pub fn statics(&self) -> &[NodeId] {
        &self.statics
    }

    pub fn capacities(&self) -> &[f64] {
        &self.capacities
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    /// Total unknowns: dynamic first, then static.
    pub fn unknown_count(&self) -> usize {
        self.dynamics.len() + self.statics.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Fail if the circuit changed structurally since this partition was built.
    pub fn ensure_current(&self, circuit: &Circuit) -> SolverResult<()> {
        if circuit.revision() == self.revision {
            Ok(())
        } else {
            Err(SolverError::StalePartition {
                built: self.revision,
                current: circuit.revision(),
            })
        }
    }

    /// Solver index of a static node.
    pub fn static_index(&self, id: NodeId) -> Option<usize> {
        self.statics.iter().position(|&n| n == id)
    }

    /// Solver index of a dynamic node.
    pub fn dynamic_index(&self, id: NodeId) -> Option<usize> {
        self.dynamics.iter().position(|&n| n == id)
    }

    /// State vector `[dynamic..., static...]` from current circuit potentials.
    pub fn gather(&self, circuit: &Circuit, state: &mut [f64]) -> SolverResult<()> {
        if state.len() != self.unknown_count() {
            return Err(SolverError::Dimension {
                what: "unknown state",
                expected: self.unknown_count(),
                actual: state.len(),
            });
        }
        for (slot, &id) in state
            .iter_mut()
            .zip(self.dynamics.iter().chain(self.statics.iter()))
        {
            *slot = circuit
                .node(id)
                .ok_or(NetworkError::UnknownNode { node: id })?
                .potential();
        }
        Ok(())
    }
}

/// Write `values[i]` as the potential of `nodes[i]`.
pub(crate) fn scatter(circuit: &mut Circuit, nodes: &[NodeId], values: &[f64]) {
    for (&id, &value) in nodes.iter().zip(values) {
        circuit.set_potential(id, value);
    }
}

/// `out[i]` = net flow at `nodes[i]`.
pub(crate) fn net_flows(circuit: &Circuit, nodes: &[NodeId], out: &mut [f64]) -> SolverResult<()> {
    for (o, &id) in out.iter_mut().zip(nodes) {
        *o = circuit
            .total_flow(id)
            .ok_or(NetworkError::UnknownNode { node: id })?;
    }
    Ok(())
}
