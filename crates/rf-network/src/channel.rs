//! Power-law flow conductors.

use std::cell::Cell;

use rf_core::{ChannelId, NodeId};

use crate::node::Node;
use crate::spec::ChannelSpec;

/// Signed power-law flow from potential `p1` to `p2`:
/// `sign(p1 - p2) * (|p1 - p2| / resistance)^(1/eta)`.
pub fn power_law_flow(p1: f64, p2: f64, resistance: f64, eta: f64) -> f64 {
    let dp = p1 - p2;
    if dp == 0.0 {
        return 0.0;
    }
    dp.signum() * (dp.abs() / resistance).powf(1.0 / eta)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FlowCache {
    flow: f64,
    /// Endpoint stamps the cached flow was computed from; `None` = dirty.
    stamps: Option<[u64; 2]>,
}

impl FlowCache {
    const DIRTY: FlowCache = FlowCache {
        flow: 0.0,
        stamps: None,
    };
}

/// A conductor between exactly two nodes.
///
/// Flow is positive from `node1` to `node2`. The computed flow is memoized
/// against the generation stamps of both endpoints: it is recomputed only
/// when either endpoint's potential was written since, or when
/// `resistance`/`eta` changed.
#[derive(Clone, Debug)]
pub struct Channel {
    pub(crate) id: ChannelId,
    pub(crate) name: String,
    pub(crate) resistance: f64,
    pub(crate) eta: f64,
    pub(crate) endpoints: Option<[NodeId; 2]>,
    cache: Cell<FlowCache>,
    evaluations: Cell<u64>,
}

impl Channel {
    /// Build a detached channel; `spec` must already be validated and clamped.
    pub(crate) fn from_spec(id: ChannelId, spec: ChannelSpec) -> Self {
        Self {
            id,
            name: spec.name,
            resistance: spec.resistance,
            eta: spec.eta,
            endpoints: None,
            cache: Cell::new(FlowCache::DIRTY),
            evaluations: Cell::new(0),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn is_connected(&self) -> bool {
        self.endpoints.is_some()
    }

    pub fn node1(&self) -> Option<NodeId> {
        self.endpoints.map(|[n1, _]| n1)
    }

    pub fn node2(&self) -> Option<NodeId> {
        self.endpoints.map(|[_, n2]| n2)
    }

    /// Last computed flow, without recomputing. `None` until first evaluated
    /// and after a parameter change or reconnection.
    pub fn cached_flow(&self) -> Option<f64> {
        let cache = self.cache.get();
        cache.stamps.map(|_| cache.flow)
    }

    /// Number of times the flow law has actually been evaluated.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }

    pub(crate) fn invalidate(&self) {
        self.cache.set(FlowCache::DIRTY);
    }

    pub(crate) fn is_stale(&self, n1: &Node, n2: &Node) -> bool {
        self.cache.get().stamps != Some([n1.stamp, n2.stamp])
    }

    /// Flow from `n1` to `n2`; the caller passes the current endpoint nodes.
    pub(crate) fn flow(&self, n1: &Node, n2: &Node) -> f64 {
        if !self.is_stale(n1, n2) {
            return self.cache.get().flow;
        }
        let flow = power_law_flow(n1.potential, n2.potential, self.resistance, self.eta);
        self.cache.set(FlowCache {
            flow,
            stamps: Some([n1.stamp, n2.stamp]),
        });
        self.evaluations.set(self.evaluations.get() + 1);
        flow
    }

    pub(crate) fn set_resistance(&mut self, resistance: f64) {
        self.resistance = resistance;
        self.invalidate();
    }

    pub(crate) fn set_eta(&mut self, eta: f64) {
        self.eta = eta;
        self.invalidate();
    }

    /// Attach to two nodes, dropping any previous attachment first.
    pub(crate) fn attach(&mut self, n1: NodeId, n2: NodeId) {
        if self.endpoints.is_some() {
            self.detach();
        }
        self.endpoints = Some([n1, n2]);
        self.invalidate();
    }

    pub(crate) fn detach(&mut self) {
        self.endpoints = None;
        self.invalidate();
    }

    pub(crate) fn relabel_endpoint(&mut self, from: NodeId, to: NodeId) {
        if let Some(ends) = self.endpoints.as_mut() {
            for end in ends.iter_mut() {
                if *end == from {
                    *end = to;
                }
            }
        }
    }
}
