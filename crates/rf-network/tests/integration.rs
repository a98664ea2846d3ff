//! Integration tests for rf-network.

use proptest::prelude::*;
use rf_core::{ChannelId, NodeId};
use rf_network::{ChannelSpec, Circuit, NetworkError, NodeSpec};

#[test]
fn chain_bookkeeping() {
    // Build: N1 -[C1]- N2 -[C2]- N3
    let mut circuit = Circuit::new();
    let n1 = circuit.add_node(NodeSpec::new("N1")).unwrap();
    let n2 = circuit.add_node(NodeSpec::new("N2")).unwrap();
    let n3 = circuit.add_node(NodeSpec::new("N3")).unwrap();
    let c1 = circuit.connect_nodes(n1, n2, ChannelSpec::new("C1", 1.0)).unwrap();
    let c2 = circuit.connect_nodes(n2, n3, ChannelSpec::new("C2", 1.0)).unwrap();

    assert_eq!(circuit.node(n1).unwrap().channel_number(), 1);
    assert_eq!(circuit.node(n2).unwrap().channels(), &[c1, c2]);
    assert_eq!(circuit.node(n3).unwrap().channel_number(), 1);
    assert_eq!(circuit.channel(c2).unwrap().node2(), Some(n3));
    circuit.check_bookkeeping().unwrap();
}

#[test]
fn dirty_bit_example() {
    let mut circuit = Circuit::new();
    let n1 = circuit.add_node(NodeSpec::new("n1").with_potential(10.0)).unwrap();
    let n2 = circuit.add_node(NodeSpec::new("n2").with_potential(4.0)).unwrap();
    let ch = circuit
        .connect_nodes(n1, n2, ChannelSpec::new("ch", 2.0).with_eta(1.0))
        .unwrap();

    assert_eq!(circuit.channel_flow(ch), Some(3.0));

    circuit.set_potential(n1, 14.0);
    let channel = circuit.channel(ch).unwrap();
    assert_eq!(channel.cached_flow(), Some(3.0));
    assert_eq!(channel.evaluations(), 1);

    assert_eq!(circuit.channel_flow(ch), Some(5.0));
}

#[test]
fn rewriting_same_potential_still_invalidates() {
    let mut circuit = Circuit::new();
    let n1 = circuit.add_node(NodeSpec::new("n1").with_potential(1.0)).unwrap();
    let n2 = circuit.add_node(NodeSpec::new("n2")).unwrap();
    let ch = circuit.connect_nodes(n1, n2, ChannelSpec::new("ch", 1.0)).unwrap();

    circuit.channel_flow(ch);
    circuit.set_potential(n1, 1.0);
    assert_eq!(circuit.is_flow_stale(ch), Some(true));
    circuit.channel_flow(ch);
    assert_eq!(circuit.channel(ch).unwrap().evaluations(), 2);
}

#[test]
fn parameter_writes_invalidate() {
    let mut circuit = Circuit::new();
    let n1 = circuit.add_node(NodeSpec::new("n1").with_potential(6.0)).unwrap();
    let n2 = circuit.add_node(NodeSpec::new("n2")).unwrap();
    let ch = circuit.connect_nodes(n1, n2, ChannelSpec::new("ch", 2.0)).unwrap();

    assert_eq!(circuit.channel_flow(ch), Some(3.0));
    circuit.set_resistance(ch, 3.0).unwrap();
    assert_eq!(circuit.is_flow_stale(ch), Some(true));
    assert_eq!(circuit.channel_flow(ch), Some(2.0));

    circuit.set_eta(ch, 0.2).unwrap();
    assert_eq!(circuit.channel(ch).unwrap().eta(), 1.0);
    assert!(matches!(
        circuit.set_resistance(ch, -1.0),
        Err(NetworkError::InvalidSpec { .. })
    ));
    assert_eq!(
        circuit.set_eta(ChannelId::from_index(3), 1.5),
        Err(NetworkError::UnknownChannel {
            channel: ChannelId::from_index(3)
        })
    );
}

#[test]
fn relabeled_node_keeps_valid_cache() {
    let mut circuit = Circuit::new();
    let doomed = circuit.add_node(NodeSpec::new("doomed")).unwrap();
    let a = circuit.add_node(NodeSpec::new("a").with_potential(4.0)).unwrap();
    let b = circuit.add_node(NodeSpec::new("b").with_potential(2.0)).unwrap();
    circuit.connect_nodes(a, b, ChannelSpec::new("ab", 1.0)).unwrap();
    let ch = ChannelId::from_index(0);
    assert_eq!(circuit.channel_flow(ch), Some(2.0));

    circuit.remove_node(doomed).unwrap();
    let b_now = circuit.node_by_name("b").unwrap();
    assert_eq!(b_now, NodeId::from_index(0));
    assert_eq!(circuit.is_flow_stale(ch), Some(false));
    assert_eq!(circuit.flow_into(ch, b_now), Some(2.0));
    assert_eq!(circuit.channel(ch).unwrap().evaluations(), 1);
}

#[test]
fn boundary_flag_bumps_revision() {
    let mut circuit = Circuit::new();
    let n = circuit.add_node(NodeSpec::new("n")).unwrap();
    let rev = circuit.revision();
    circuit.set_potential(n, 3.0);
    circuit.set_external_flow(n, 1.0);
    assert_eq!(circuit.revision(), rev);
    circuit.set_boundary_node(n, true);
    assert_eq!(circuit.revision(), rev + 1);
}

#[derive(Clone, Debug)]
enum Op {
    AddNode,
    Connect(usize, usize),
    RemoveNode(usize),
    Disconnect(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::AddNode),
        (0_usize..16, 0_usize..16).prop_map(|(a, b)| Op::Connect(a, b)),
        (0_usize..16).prop_map(Op::RemoveNode),
        (0_usize..16).prop_map(Op::Disconnect),
    ]
}

proptest! {
    #[test]
    fn ids_stay_dense_under_mutation(ops in prop::collection::vec(op(), 1..60)) {
        let mut circuit = Circuit::new();
        for (i, op) in ops.into_iter().enumerate() {
            let nodes = circuit.node_count();
            let channels = circuit.channel_count();
            match op {
                Op::AddNode => {
                    circuit.add_node(NodeSpec::new(format!("n{i}"))).unwrap();
                }
                Op::Connect(a, b) if nodes > 1 && a % nodes != b % nodes => {
                    circuit
                        .connect_nodes(
                            NodeId::from_usize(a % nodes),
                            NodeId::from_usize(b % nodes),
                            ChannelSpec::new(format!("c{i}"), 1.0),
                        )
                        .unwrap();
                }
                Op::RemoveNode(a) if nodes > 0 => {
                    circuit.remove_node(NodeId::from_usize(a % nodes)).unwrap();
                    prop_assert_eq!(circuit.node_count(), nodes - 1);
                }
                Op::Disconnect(c) if channels > 0 => {
                    circuit.disconnect_nodes(ChannelId::from_usize(c % channels)).unwrap();
                    prop_assert_eq!(circuit.channel_count(), channels - 1);
                }
                _ => {}
            }
            prop_assert!(circuit.check_bookkeeping().is_ok());
        }
    }

    #[test]
    fn flow_is_antisymmetric(
        p1 in -100.0_f64..100.0,
        p2 in -100.0_f64..100.0,
        resistance in 0.01_f64..50.0,
        eta in 1.0_f64..2.0,
    ) {
        let mut circuit = Circuit::new();
        let a = circuit.add_node(NodeSpec::new("a").with_potential(p1)).unwrap();
        let b = circuit.add_node(NodeSpec::new("b").with_potential(p2)).unwrap();
        let ch = circuit
            .connect_nodes(a, b, ChannelSpec::new("ab", resistance).with_eta(eta))
            .unwrap();

        let into_a = circuit.flow_into(ch, a).unwrap();
        let into_b = circuit.flow_into(ch, b).unwrap();
        prop_assert_eq!(into_a, -into_b);
        prop_assert!(into_b * (p1 - p2) >= 0.0);
    }
}
