//! Value-type descriptions used to create nodes and channels.
//!
//! The circuit builds and owns the canonical entity from a spec; the spec
//! itself is never aliased by the circuit.

use rf_core::{ensure_finite, ensure_non_negative, ensure_positive};

use crate::error::{NetworkError, NetworkResult};

/// Smallest accepted flow exponent (linear conductor).
pub const ETA_MIN: f64 = 1.0;
/// Largest accepted flow exponent (square-law conductor).
pub const ETA_MAX: f64 = 2.0;

/// Clamp a flow exponent into `[ETA_MIN, ETA_MAX]`.
pub(crate) fn clamp_eta(eta: f64) -> NetworkResult<f64> {
    let eta = ensure_finite(eta, "eta").map_err(NetworkError::spec("channel eta"))?;
    Ok(eta.clamp(ETA_MIN, ETA_MAX))
}

pub(crate) fn check_resistance(resistance: f64) -> NetworkResult<f64> {
    ensure_positive(resistance, "resistance").map_err(NetworkError::spec("channel resistance"))
}

/// Description of a node to add to a circuit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeSpec {
    pub name: String,
    /// Initial potential.
    pub potential: f64,
    /// Capacity (>= 0); zero means the node carries no dynamic state.
    pub capacity: f64,
    /// Forcing term, positive = outflow to outside the network.
    pub external_flow: f64,
    /// Boundary nodes have a prescribed potential and are never solved for.
    pub boundary: bool,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            potential: 0.0,
            capacity: 0.0,
            external_flow: 0.0,
            boundary: false,
        }
    }

    pub fn with_potential(mut self, potential: f64) -> Self {
        self.potential = potential;
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_external_flow(mut self, external_flow: f64) -> Self {
        self.external_flow = external_flow;
        self
    }

    pub fn boundary(mut self) -> Self {
        self.boundary = true;
        self
    }

    pub(crate) fn validate(&self) -> NetworkResult<()> {
        ensure_finite(self.potential, "potential").map_err(NetworkError::spec("node potential"))?;
        ensure_non_negative(self.capacity, "capacity")
            .map_err(NetworkError::spec("node capacity"))?;
        ensure_finite(self.external_flow, "external flow")
            .map_err(NetworkError::spec("node external flow"))?;
        Ok(())
    }
}

/// Description of a channel to connect between two nodes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelSpec {
    pub name: String,
    /// Resistance (> 0).
    pub resistance: f64,
    /// Flow exponent; clamped to `[1, 2]` when the channel is built.
    pub eta: f64,
}

impl ChannelSpec {
    /// Linear channel (`eta = 1`).
    pub fn new(name: impl Into<String>, resistance: f64) -> Self {
        Self {
            name: name.into(),
            resistance,
            eta: ETA_MIN,
        }
    }

    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }
}
