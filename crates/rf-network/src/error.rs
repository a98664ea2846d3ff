//! Network-specific error types.

use rf_core::{ChannelId, NodeId, RfError};
use thiserror::Error;

/// Topology and parameter errors. All of them leave the circuit unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Node {node} is not a member of this circuit")]
    UnknownNode { node: NodeId },

    #[error("Channel {channel} is not a member of this circuit")]
    UnknownChannel { channel: ChannelId },

    #[error("Channel cannot connect node {node} to itself")]
    SelfLoop { node: NodeId },

    #[error("Invalid {what}: {source}")]
    InvalidSpec {
        what: &'static str,
        #[source]
        source: RfError,
    },

    #[error("Bookkeeping violated: {what}")]
    Bookkeeping { what: String },
}

pub type NetworkResult<T> = Result<T, NetworkError>;

impl NetworkError {
    pub(crate) fn spec(what: &'static str) -> impl FnOnce(RfError) -> NetworkError {
        move |source| NetworkError::InvalidSpec { what, source }
    }
}
