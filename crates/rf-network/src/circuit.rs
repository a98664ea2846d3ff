//! The circuit: arena owning all nodes and channels.

use std::fmt;

use rf_core::{ChannelId, NodeId};
use tracing::trace;

use crate::channel::Channel;
use crate::error::{NetworkError, NetworkResult};
use crate::events::{ObserverId, Observers, Relabel, TopologyEvent};
use crate::node::Node;
use crate::spec::{ChannelSpec, NodeSpec, check_resistance, clamp_eta};
use crate::view::NetworkView;

/// Owner of the canonical nodes and channels.
///
/// Node ids and channel ids are each dense over `0..count`. Removing an
/// entity moves the holder of the largest id into the freed slot, so at most
/// one id changes per removal; the change is reported through
/// [`TopologyEvent`]s.
///
/// Every potential write draws a fresh value from a circuit-wide clock and
/// stamps the node with it; channels compare those stamps against the ones
/// their cached flow was computed from.
pub struct Circuit {
    nodes: Vec<Node>,
    channels: Vec<Channel>,
    clock: u64,
    revision: u64,
    observers: Observers,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Circuit")
            .field("nodes", &self.nodes)
            .field("channels", &self.channels)
            .field("revision", &self.revision)
            .field("observers", &self.observers)
            .finish()
    }
}

impl Circuit {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            channels: Vec::new(),
            clock: 0,
            revision: 0,
            observers: Observers::default(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Return all nodes, indexed by id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all channels, indexed by id.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(id.slot())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        id.slot() < self.nodes.len()
    }

    pub fn contains_channel(&self, id: ChannelId) -> bool {
        id.slot() < self.channels.len()
    }

    /// Structural revision; bumped by every add, remove, connect,
    /// disconnect and boundary-flag change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    pub fn channel_by_name(&self, name: &str) -> Option<ChannelId> {
        self.channels.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Read-only access for consumers that must not mutate the network.
    pub fn view(&self) -> NetworkView<'_> {
        NetworkView::new(self)
    }

    /// Register a topology observer. Observers run synchronously, in
    /// registration order, before the mutating call returns.
    pub fn subscribe(&mut self, observer: impl FnMut(&TopologyEvent) + 'static) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn changed(&mut self, event: TopologyEvent) {
        self.revision += 1;
        trace!(revision = self.revision, ?event, "topology changed");
        self.observers.notify(&event);
    }

    /// Build a node from `spec` and append it with the next free id.
    pub fn add_node(&mut self, spec: NodeSpec) -> NetworkResult<NodeId> {
        spec.validate()?;
        let id = NodeId::from_usize(self.nodes.len());
        let stamp = self.tick();
        self.nodes.push(Node::from_spec(id, spec, stamp));
        self.changed(TopologyEvent::NodeAdded { node: id });
        Ok(id)
    }

    /// Disconnect every incident channel, then remove the node.
    ///
    /// The node holding the largest id (if it is not the removed one) takes
    /// over `id`. Returns the removed node with an empty channel list.
    pub fn remove_node(&mut self, id: NodeId) -> NetworkResult<Node> {
        if !self.contains_node(id) {
            return Err(NetworkError::UnknownNode { node: id });
        }

        while let Some(&channel) = self.nodes[id.slot()].channels.last() {
            self.disconnect_nodes(channel)?;
        }

        let removed = self.nodes.swap_remove(id.slot());
        let relabeled = if id.slot() < self.nodes.len() {
            let from = NodeId::from_usize(self.nodes.len());
            let moved = &mut self.nodes[id.slot()];
            moved.id = id;
            for &c in &moved.channels {
                self.channels[c.slot()].relabel_endpoint(from, id);
            }
            Some(Relabel { from, to: id })
        } else {
            None
        };

        self.changed(TopologyEvent::NodeRemoved {
            node: id,
            relabeled,
        });
        Ok(removed)
    }

    /// Build a channel from `spec` and connect it from `n1` to `n2`.
    pub fn connect_nodes(
        &mut self,
        n1: NodeId,
        n2: NodeId,
        spec: ChannelSpec,
    ) -> NetworkResult<ChannelId> {
        for node in [n1, n2] {
            if !self.contains_node(node) {
                return Err(NetworkError::UnknownNode { node });
            }
        }
        if n1 == n2 {
            return Err(NetworkError::SelfLoop { node: n1 });
        }
        let resistance = check_resistance(spec.resistance)?;
        let eta = clamp_eta(spec.eta)?;

        let id = ChannelId::from_usize(self.channels.len());
        let mut channel = Channel::from_spec(
            id,
            ChannelSpec {
                resistance,
                eta,
                ..spec
            },
        );
        channel.attach(n1, n2);
        self.channels.push(channel);
        self.nodes[n1.slot()].channels.push(id);
        self.nodes[n2.slot()].channels.push(id);

        self.changed(TopologyEvent::Connected {
            channel: id,
            node1: n1,
            node2: n2,
        });
        Ok(id)
    }

    /// Disconnect and remove a channel.
    ///
    /// The channel holding the largest id (if it is not the removed one)
    /// takes over `id`. Returns the detached channel.
    pub fn disconnect_nodes(&mut self, id: ChannelId) -> NetworkResult<Channel> {
        let [n1, n2] = self
            .channel(id)
            .and_then(|c| c.endpoints)
            .ok_or(NetworkError::UnknownChannel { channel: id })?;

        self.nodes[n1.slot()].detach_channel(id);
        self.nodes[n2.slot()].detach_channel(id);

        let mut removed = self.channels.swap_remove(id.slot());
        removed.detach();

        let relabeled = if id.slot() < self.channels.len() {
            let from = ChannelId::from_usize(self.channels.len());
            let moved = &mut self.channels[id.slot()];
            moved.id = id;
            if let Some(ends) = moved.endpoints {
                for end in ends {
                    self.nodes[end.slot()].relabel_channel(from, id);
                }
            }
            Some(Relabel { from, to: id })
        } else {
            None
        };

        self.changed(TopologyEvent::Disconnected {
            channel: id,
            node1: n1,
            node2: n2,
            relabeled,
        });
        Ok(removed)
    }

    /// Write a node potential. Returns `false` (and does nothing) if the
    /// node is unknown.
    pub fn set_potential(&mut self, id: NodeId, potential: f64) -> bool {
        if !self.contains_node(id) {
            return false;
        }
        let stamp = self.tick();
        let node = &mut self.nodes[id.slot()];
        node.potential = potential;
        node.stamp = stamp;
        true
    }

    /// Write the forcing term of a node. No-op on unknown nodes.
    pub fn set_external_flow(&mut self, id: NodeId, external_flow: f64) -> bool {
        match self.nodes.get_mut(id.slot()) {
            Some(node) => {
                node.external_flow = external_flow;
                true
            }
            None => false,
        }
    }

    /// Mark or unmark a boundary node. No-op on unknown nodes.
    pub fn set_boundary_node(&mut self, id: NodeId, boundary: bool) -> bool {
        let Some(node) = self.nodes.get_mut(id.slot()) else {
            return false;
        };
        if node.boundary != boundary {
            node.boundary = boundary;
            self.changed(TopologyEvent::BoundaryChanged { node: id, boundary });
        }
        true
    }

    pub fn set_resistance(&mut self, id: ChannelId, resistance: f64) -> NetworkResult<()> {
        let resistance = check_resistance(resistance)?;
        let channel = self
            .channels
            .get_mut(id.slot())
            .ok_or(NetworkError::UnknownChannel { channel: id })?;
        channel.set_resistance(resistance);
        Ok(())
    }

    /// Set the flow exponent, clamped to `[1, 2]`.
    pub fn set_eta(&mut self, id: ChannelId, eta: f64) -> NetworkResult<()> {
        let eta = clamp_eta(eta)?;
        let channel = self
            .channels
            .get_mut(id.slot())
            .ok_or(NetworkError::UnknownChannel { channel: id })?;
        channel.set_eta(eta);
        Ok(())
    }

    fn endpoints(&self, channel: &Channel) -> Option<(&Node, &Node)> {
        let [n1, n2] = channel.endpoints?;
        Some((self.nodes.get(n1.slot())?, self.nodes.get(n2.slot())?))
    }

    /// Flow through a channel, positive from node1 to node2.
    pub fn channel_flow(&self, id: ChannelId) -> Option<f64> {
        let channel = self.channel(id)?;
        let (n1, n2) = self.endpoints(channel)?;
        Some(channel.flow(n1, n2))
    }

    /// Flow through `channel` into `node`; `None` if `node` is not an endpoint.
    pub fn flow_into(&self, channel: ChannelId, node: NodeId) -> Option<f64> {
        let ch = self.channel(channel)?;
        let [n1, n2] = ch.endpoints?;
        let flow = self.channel_flow(channel)?;
        if node == n2 {
            Some(flow)
        } else if node == n1 {
            Some(-flow)
        } else {
            None
        }
    }

    /// Net inflow over all incident channels minus the external outflow.
    ///
    /// This is the flow-balance residual: zero at steady state, and
    /// `capacity * d(potential)/dt` for a dynamic node.
    pub fn total_flow(&self, id: NodeId) -> Option<f64> {
        let node = self.node(id)?;
        let inflow: f64 = node
            .channels
            .iter()
            .filter_map(|&c| self.flow_into(c, id))
            .sum();
        Some(inflow - node.external_flow)
    }

    /// Whether the next `channel_flow` call will recompute.
    pub fn is_flow_stale(&self, id: ChannelId) -> Option<bool> {
        let channel = self.channel(id)?;
        let (n1, n2) = self.endpoints(channel)?;
        Some(channel.is_stale(n1, n2))
    }

    /// Potentials of all nodes, indexed by id.
    pub fn potentials(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.potential).collect()
    }

    /// Verify the arena's bookkeeping: dense ids, endpoint back-references
    /// and channel counts.
    pub fn check_bookkeeping(&self) -> NetworkResult<()> {
        crate::validate::check_bookkeeping(&self.nodes, &self.channels)
    }
}
