//! Topology change notifications.

use std::fmt;

use rf_core::{ChannelId, Id, NodeId};

/// An entity that moved from the largest id down to a freed slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relabel {
    pub from: Id,
    pub to: Id,
}

/// Structural change to a circuit, delivered after the change is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum TopologyEvent {
    NodeAdded {
        node: NodeId,
    },
    NodeRemoved {
        node: NodeId,
        relabeled: Option<Relabel>,
    },
    Connected {
        channel: ChannelId,
        node1: NodeId,
        node2: NodeId,
    },
    Disconnected {
        channel: ChannelId,
        node1: NodeId,
        node2: NodeId,
        relabeled: Option<Relabel>,
    },
    BoundaryChanged {
        node: NodeId,
        boundary: bool,
    },
}

/// Handle returned by `Circuit::subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Box<dyn FnMut(&TopologyEvent)>;

/// Observers in registration order.
#[derive(Default)]
pub(crate) struct Observers {
    next: u64,
    list: Vec<(ObserverId, Callback)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.list.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.list.len();
        self.list.retain(|(oid, _)| *oid != id);
        self.list.len() != before
    }

    pub(crate) fn notify(&mut self, event: &TopologyEvent) {
        for (_, callback) in &mut self.list {
            callback(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.list.len()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.list.len())
            .finish()
    }
}
