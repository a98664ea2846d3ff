//! rf-network: the resistive flow network model.
//!
//! Provides:
//! - `Node` (potential/capacity points) and `Channel` (power-law conductors)
//! - `Circuit`, the arena that owns both and keeps ids dense
//! - value-type specs used to create entities (`NodeSpec`, `ChannelSpec`)
//! - topology observers and a read-only `NetworkView`
//!
//! # Example
//!
//! ```
//! use rf_network::{ChannelSpec, Circuit, NodeSpec};
//!
//! let mut circuit = Circuit::new();
//! let hot = circuit.add_node(NodeSpec::new("hot").with_potential(10.0)).unwrap();
//! let cold = circuit.add_node(NodeSpec::new("cold").with_potential(4.0)).unwrap();
//! let wall = circuit.connect_nodes(hot, cold, ChannelSpec::new("wall", 2.0)).unwrap();
//!
//! assert_eq!(circuit.channel_flow(wall), Some(3.0));
//! assert_eq!(circuit.flow_into(wall, hot), Some(-3.0));
//! ```

pub mod channel;
pub mod circuit;
pub mod error;
pub mod events;
pub mod node;
pub mod spec;
pub(crate) mod validate;
pub mod view;

// Re-exports for ergonomics
pub use channel::{Channel, power_law_flow};
pub use circuit::Circuit;
pub use error::{NetworkError, NetworkResult};
pub use events::{ObserverId, Relabel, TopologyEvent};
pub use node::Node;
pub use spec::{ChannelSpec, ETA_MAX, ETA_MIN, NodeSpec};
pub use view::NetworkView;
