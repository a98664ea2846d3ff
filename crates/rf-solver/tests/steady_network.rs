//! Steady (static-only) network solves.

use proptest::prelude::*;
use rf_network::{ChannelSpec, Circuit, NodeSpec};
use rf_solver::{CircuitSolver, CircuitSolverConfig, SolverError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn injected_unit_flow_through_unit_resistance() {
    init_tracing();
    let mut circuit = Circuit::new();
    let ground = circuit.add_node(NodeSpec::new("ground").boundary()).unwrap();
    let node = circuit
        .add_node(NodeSpec::new("node").with_external_flow(-1.0))
        .unwrap();
    circuit
        .connect_nodes(ground, node, ChannelSpec::new("r", 1.0))
        .unwrap();

    let mut solver = CircuitSolver::new(&circuit, CircuitSolverConfig::default()).unwrap();
    let report = solver.solve(&mut circuit).unwrap();

    assert!(report.converged);
    assert!(report.static_iterations >= 1);
    assert!((circuit.node(node).unwrap().potential() - 1.0).abs() < 1e-6);
}

#[test]
fn flow_is_conserved_at_every_static_node() {
    init_tracing();
    // hot(10) -R1- a -R2(eta 1.5)- b -R3- cold(0), plus a bypass a -R4- cold
    // and an extraction at b.
    let mut circuit = Circuit::new();
    let hot = circuit
        .add_node(NodeSpec::new("hot").with_potential(10.0).boundary())
        .unwrap();
    let cold = circuit.add_node(NodeSpec::new("cold").boundary()).unwrap();
    let a = circuit.add_node(NodeSpec::new("a").with_potential(5.0)).unwrap();
    let b = circuit
        .add_node(NodeSpec::new("b").with_potential(5.0).with_external_flow(0.5))
        .unwrap();
    circuit.connect_nodes(hot, a, ChannelSpec::new("r1", 1.0)).unwrap();
    circuit
        .connect_nodes(a, b, ChannelSpec::new("r2", 2.0).with_eta(1.5))
        .unwrap();
    circuit.connect_nodes(b, cold, ChannelSpec::new("r3", 1.0)).unwrap();
    circuit.connect_nodes(a, cold, ChannelSpec::new("r4", 4.0)).unwrap();

    let config = CircuitSolverConfig::default();
    let abs_tol = config.newton.abs_tol;
    let mut solver = CircuitSolver::new(&circuit, config).unwrap();
    let report = solver.solve(&mut circuit).unwrap();

    assert!(report.converged);
    for id in solver.partition().statics() {
        let imbalance = circuit.total_flow(*id).unwrap();
        assert!(imbalance.abs() < abs_tol, "node {id}: {imbalance}");
    }
    // boundary potentials are inputs and never written
    assert_eq!(circuit.node(hot).unwrap().potential(), 10.0);
    assert_eq!(circuit.node(cold).unwrap().potential(), 0.0);

    let pa = circuit.node(a).unwrap().potential();
    let pb = circuit.node(b).unwrap().potential();
    assert!(10.0 > pa && pa > pb && pb > 0.0);
}

#[test]
fn power_law_channel_series() {
    // sqrt(10 - a) = a  ->  a = (sqrt(41) - 1) / 2
    let mut circuit = Circuit::new();
    let hot = circuit
        .add_node(NodeSpec::new("hot").with_potential(10.0).boundary())
        .unwrap();
    let cold = circuit.add_node(NodeSpec::new("cold").boundary()).unwrap();
    let a = circuit.add_node(NodeSpec::new("a").with_potential(5.0)).unwrap();
    circuit
        .connect_nodes(hot, a, ChannelSpec::new("turbulent", 1.0).with_eta(2.0))
        .unwrap();
    circuit
        .connect_nodes(a, cold, ChannelSpec::new("laminar", 1.0))
        .unwrap();

    let mut solver = CircuitSolver::new(&circuit, CircuitSolverConfig::default()).unwrap();
    let report = solver.solve(&mut circuit).unwrap();

    assert!(report.converged);
    let expected = (41.0_f64.sqrt() - 1.0) / 2.0;
    assert!((circuit.node(a).unwrap().potential() - expected).abs() < 1e-5);
}

#[test]
fn floating_node_is_singular_and_rolled_back() {
    init_tracing();
    let mut circuit = Circuit::new();
    let ground = circuit.add_node(NodeSpec::new("ground").boundary()).unwrap();
    let a = circuit.add_node(NodeSpec::new("a").with_potential(2.0)).unwrap();
    circuit.connect_nodes(ground, a, ChannelSpec::new("r", 1.0)).unwrap();
    // no channels: its net flow cannot depend on any potential
    let floating = circuit
        .add_node(
            NodeSpec::new("floating")
                .with_potential(7.0)
                .with_external_flow(1.0),
        )
        .unwrap();

    let before = circuit.potentials();
    let mut solver = CircuitSolver::new(&circuit, CircuitSolverConfig::default()).unwrap();
    let err = solver.solve(&mut circuit).unwrap_err();

    assert!(err.is_singular(), "{err}");
    assert!(!err.is_convergence_failure());
    assert_eq!(circuit.potentials(), before);
    assert_eq!(circuit.node(floating).unwrap().potential(), 7.0);
    assert_eq!(circuit.node(a).unwrap().potential(), 2.0);
}

#[test]
fn stale_partition_is_refused() {
    let mut circuit = Circuit::new();
    let ground = circuit.add_node(NodeSpec::new("ground").boundary()).unwrap();
    let a = circuit.add_node(NodeSpec::new("a")).unwrap();
    circuit.connect_nodes(ground, a, ChannelSpec::new("r", 1.0)).unwrap();

    let mut solver = CircuitSolver::new(&circuit, CircuitSolverConfig::default()).unwrap();
    circuit.set_boundary_node(a, true);

    let err = solver.solve(&mut circuit).unwrap_err();
    assert!(matches!(err, SolverError::StalePartition { .. }));

    solver.rebuild(&circuit).unwrap();
    assert_eq!(solver.partition().static_count(), 0);
    assert!(solver.solve(&mut circuit).unwrap().converged);
}

#[test]
fn iteration_cap_reports_non_convergence() {
    // A tight cap on a nonlinear problem: not an error for a steady solve.
    let mut circuit = Circuit::new();
    let hot = circuit
        .add_node(NodeSpec::new("hot").with_potential(100.0).boundary())
        .unwrap();
    let cold = circuit.add_node(NodeSpec::new("cold").boundary()).unwrap();
    let a = circuit.add_node(NodeSpec::new("a").with_potential(1.0)).unwrap();
    circuit
        .connect_nodes(hot, a, ChannelSpec::new("turbulent", 1.0).with_eta(2.0))
        .unwrap();
    circuit
        .connect_nodes(a, cold, ChannelSpec::new("laminar", 1.0))
        .unwrap();

    let mut config = CircuitSolverConfig::default();
    config.newton.max_iterations = 1;
    let mut solver = CircuitSolver::new(&circuit, config).unwrap();
    let report = solver.solve(&mut circuit).unwrap();

    assert!(!report.converged);
    assert_eq!(report.static_iterations, 1);
    assert!(report.residual_norm > 1e-6);
}

proptest! {
    #[test]
    fn linear_ladder_conserves_flow(
        resistances in prop::collection::vec(0.1_f64..10.0, 2..6),
        injections in prop::collection::vec(-1.0_f64..1.0, 5),
        hot in 0.0_f64..20.0,
    ) {
        // hot -R0- n1 -R1- ... -Rk- cold, with an injection at every inner node
        let mut circuit = Circuit::new();
        let mut prev = circuit
            .add_node(NodeSpec::new("hot").with_potential(hot).boundary())
            .unwrap();
        let inner = resistances.len() - 1;
        for i in 0..inner {
            let node = circuit
                .add_node(NodeSpec::new(format!("n{i}")).with_external_flow(injections[i]))
                .unwrap();
            circuit
                .connect_nodes(prev, node, ChannelSpec::new(format!("r{i}"), resistances[i]))
                .unwrap();
            prev = node;
        }
        let cold = circuit.add_node(NodeSpec::new("cold").boundary()).unwrap();
        circuit
            .connect_nodes(prev, cold, ChannelSpec::new("last", resistances[inner]))
            .unwrap();

        let config = CircuitSolverConfig::default();
        let abs_tol = config.newton.abs_tol;
        let mut solver = CircuitSolver::new(&circuit, config).unwrap();
        let report = solver.solve(&mut circuit).unwrap();

        prop_assert!(report.converged);
        for id in solver.partition().statics() {
            prop_assert!(circuit.total_flow(*id).unwrap().abs() < abs_tol);
        }
    }
}
