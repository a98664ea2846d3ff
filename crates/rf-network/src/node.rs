//! Potential/capacity points of the network.

use rf_core::{ChannelId, NodeId};

use crate::spec::NodeSpec;

/// A node: holds a potential and, optionally, a capacity.
///
/// Nodes never own their channels; `channels()` lists the ids of incident
/// channels in connection order. All mutation goes through the owning
/// [`Circuit`](crate::Circuit).
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) potential: f64,
    pub(crate) capacity: f64,
    pub(crate) external_flow: f64,
    pub(crate) boundary: bool,
    pub(crate) channels: Vec<ChannelId>,
    /// Circuit clock value of the last potential write.
    pub(crate) stamp: u64,
}

impl Node {
    pub(crate) fn from_spec(id: NodeId, spec: NodeSpec, stamp: u64) -> Self {
        Self {
            id,
            name: spec.name,
            potential: spec.potential,
            capacity: spec.capacity,
            external_flow: spec.external_flow,
            boundary: spec.boundary,
            channels: Vec::new(),
            stamp,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn potential(&self) -> f64 {
        self.potential
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Forcing term, positive = outflow to outside the network.
    pub fn external_flow(&self) -> f64 {
        self.external_flow
    }

    pub fn is_boundary(&self) -> bool {
        self.boundary
    }

    /// Non-boundary node with positive capacity.
    pub fn is_dynamic(&self) -> bool {
        !self.boundary && self.capacity > 0.0
    }

    /// Non-boundary node without capacity.
    pub fn is_static(&self) -> bool {
        !self.boundary && self.capacity == 0.0
    }

    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Number of channels with this node as an endpoint.
    pub fn channel_number(&self) -> usize {
        self.channels.len()
    }

    /// Generation stamp; changes on every potential write.
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub(crate) fn detach_channel(&mut self, channel: ChannelId) {
        if let Some(pos) = self.channels.iter().position(|&c| c == channel) {
            self.channels.remove(pos);
        }
    }

    pub(crate) fn relabel_channel(&mut self, from: ChannelId, to: ChannelId) {
        for c in &mut self.channels {
            if *c == from {
                *c = to;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let id = NodeId::from_index(0);
        let dynamic = Node::from_spec(id, NodeSpec::new("a").with_capacity(2.0), 0);
        let algebraic = Node::from_spec(id, NodeSpec::new("b"), 0);
        let boundary = Node::from_spec(id, NodeSpec::new("c").with_capacity(2.0).boundary(), 0);

        assert!(dynamic.is_dynamic() && !dynamic.is_static());
        assert!(algebraic.is_static() && !algebraic.is_dynamic());
        assert!(!boundary.is_static() && !boundary.is_dynamic());
    }

    #[test]
    fn channel_list_edits() {
        let mut node = Node::from_spec(NodeId::from_index(0), NodeSpec::new("n"), 0);
        let c0 = ChannelId::from_index(0);
        let c1 = ChannelId::from_index(1);
        let c2 = ChannelId::from_index(2);
        node.channels = vec![c0, c1, c2];

        node.detach_channel(c1);
        assert_eq!(node.channels(), &[c0, c2]);

        node.relabel_channel(c2, c1);
        assert_eq!(node.channels(), &[c0, c1]);
        assert_eq!(node.channel_number(), 2);
    }
}
