//! Read-only network access for downstream consumers.

use rf_core::{ChannelId, NodeId};

use crate::channel::Channel;
use crate::circuit::Circuit;
use crate::node::Node;

/// Shared, non-mutating view of a circuit.
///
/// Handed to boundary-condition drivers and models that consume node
/// potentials; nothing reachable from here can change network state.
#[derive(Clone, Copy, Debug)]
pub struct NetworkView<'a> {
    circuit: &'a Circuit,
}

impl<'a> NetworkView<'a> {
    pub(crate) fn new(circuit: &'a Circuit) -> Self {
        Self { circuit }
    }

    pub fn nodes(&self) -> &'a [Node] {
        self.circuit.nodes()
    }

    pub fn channels(&self) -> &'a [Channel] {
        self.circuit.channels()
    }

    pub fn node(&self, id: NodeId) -> Option<&'a Node> {
        self.circuit.node(id)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&'a Channel> {
        self.circuit.channel(id)
    }

    pub fn node_count(&self) -> usize {
        self.circuit.node_count()
    }

    pub fn channel_count(&self) -> usize {
        self.circuit.channel_count()
    }

    pub fn potential(&self, id: NodeId) -> Option<f64> {
        self.node(id).map(Node::potential)
    }

    pub fn capacity(&self, id: NodeId) -> Option<f64> {
        self.node(id).map(Node::capacity)
    }

    pub fn is_boundary(&self, id: NodeId) -> Option<bool> {
        self.node(id).map(Node::is_boundary)
    }

    pub fn total_flow(&self, id: NodeId) -> Option<f64> {
        self.circuit.total_flow(id)
    }

    pub fn flow(&self, id: ChannelId) -> Option<f64> {
        self.circuit.channel_flow(id)
    }

    pub fn resistance(&self, id: ChannelId) -> Option<f64> {
        self.channel(id).map(Channel::resistance)
    }

    pub fn eta(&self, id: ChannelId) -> Option<f64> {
        self.channel(id).map(Channel::eta)
    }

    pub fn potentials(&self) -> Vec<f64> {
        self.circuit.potentials()
    }
}
