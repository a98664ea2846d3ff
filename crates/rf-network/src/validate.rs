//! Arena bookkeeping checks.

use crate::channel::Channel;
use crate::error::{NetworkError, NetworkResult};
use crate::node::Node;

fn violated(what: String) -> NetworkResult<()> {
    Err(NetworkError::Bookkeeping { what })
}

/// Check that ids are dense and that node/channel back-references agree.
pub(crate) fn check_bookkeeping(nodes: &[Node], channels: &[Channel]) -> NetworkResult<()> {
    // Ids must match their slots
    for (i, node) in nodes.iter().enumerate() {
        if node.id.slot() != i {
            return violated(format!("node in slot {i} has id {}", node.id));
        }
    }
    for (i, channel) in channels.iter().enumerate() {
        if channel.id.slot() != i {
            return violated(format!("channel in slot {i} has id {}", channel.id));
        }
    }

    // Each channel is connected to two distinct member nodes that list it
    let mut incidence = vec![0_usize; nodes.len()];
    for channel in channels {
        let Some([n1, n2]) = channel.endpoints else {
            return violated(format!("channel {} is stored but detached", channel.id));
        };
        if n1 == n2 {
            return violated(format!("channel {} is a self-loop", channel.id));
        }
        for end in [n1, n2] {
            let Some(node) = nodes.get(end.slot()) else {
                return violated(format!(
                    "channel {} refers to missing node {end}",
                    channel.id
                ));
            };
            if !node.channels.contains(&channel.id) {
                return violated(format!(
                    "node {end} does not list incident channel {}",
                    channel.id
                ));
            }
            incidence[end.slot()] += 1;
        }
    }

    // Channel number equals the count of channels naming the node
    for node in nodes {
        let expected = incidence[node.id.slot()];
        if node.channel_number() != expected {
            return violated(format!(
                "node {} lists {} channels but is an endpoint of {expected}",
                node.id,
                node.channel_number()
            ));
        }
    }

    Ok(())
}
