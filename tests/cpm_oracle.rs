use petgraph::graph::UnGraph;
use res_profile::oracles::cpm::{ConsiderComms, CpmOracle, LocalMoveParams};
use res_profile::{ProfileScannerBuilder, ResolutionOracle};

/// Two unit-weight triangles joined by a single bridge edge.
/// Total weight 7; the triangles hold 6 of it.
fn two_triangles() -> UnGraph<(), f64> {
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
    for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
        graph.add_edge(nodes[a], nodes[b], 1.0);
    }
    graph
}

fn deterministic_params() -> LocalMoveParams {
    LocalMoveParams {
        random_order: false,
        ..LocalMoveParams::default()
    }
}

#[test]
fn profile_finds_the_three_regimes() {
    // The optimal internal weight takes exactly three values over this
    // range: 7 (everything merged), 6 (the two triangles), 0 (singletons).
    let oracle = CpmOracle::new(two_triangles()).with_params(deterministic_params());
    let scanner = ProfileScannerBuilder::new(oracle)
        .min_diff_bisect(0.5)
        .build();
    let profile = scanner.scan((0.01, 10.0)).unwrap();

    let values: Vec<f64> = profile.iter().map(|s| s.bisect_value).collect();
    assert_eq!(values, vec![7.0, 6.0, 0.0]);

    // Breakpoints converge onto the analytic thresholds from above:
    // triangles merge below 1/9, singletons win from 1.0 on.
    let resolutions: Vec<f64> = profile.iter().map(|s| s.resolution).collect();
    assert_eq!(resolutions[0], 0.01);
    assert!(resolutions[1] > 0.11 && resolutions[1] < 0.12);
    assert!(resolutions[2] >= 1.0 && resolutions[2] < 1.01);
}

#[test]
fn stochastic_oracle_profile_stays_sorted() {
    // Randomized traversal order, fixed seed: the scan must still return a
    // sorted profile with the extreme regimes intact.
    let oracle = CpmOracle::new(two_triangles()).with_seed(1234);
    let scanner = ProfileScannerBuilder::new(oracle)
        .min_diff_bisect(0.5)
        .build();
    let profile = scanner.scan((0.01, 10.0)).unwrap();

    for pair in profile.steps().windows(2) {
        assert!(pair[0].resolution < pair[1].resolution);
        assert!(pair[0].bisect_value >= pair[1].bisect_value);
    }
    assert_eq!(profile.steps().first().unwrap().bisect_value, 7.0);
    assert_eq!(profile.steps().last().unwrap().bisect_value, 0.0);
}

#[test]
fn negative_weights_and_negative_resolutions_scan_cleanly() {
    // A square with a repulsive diagonal; the range straddles zero, so the
    // scanner falls back to linear subdivision throughout.
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
        graph.add_edge(nodes[a], nodes[b], 1.0);
    }
    graph.add_edge(nodes[0], nodes[2], -2.0);

    let oracle = CpmOracle::new(graph).with_params(deterministic_params());
    let scanner = ProfileScannerBuilder::new(oracle)
        .min_diff_bisect(0.5)
        .min_diff_resolution(0.01)
        .build();
    let profile = scanner.scan((-2.0, 2.0)).unwrap();

    assert!(!profile.is_empty());
    for pair in profile.steps().windows(2) {
        assert!(pair[0].resolution < pair[1].resolution);
        assert!(pair[0].bisect_value >= pair[1].bisect_value);
    }
    // Far enough on the positive side every node is isolated.
    assert_eq!(profile.steps().last().unwrap().bisect_value, 0.0);
}

#[test]
fn random_candidate_modes_produce_valid_partitions() {
    for mode in [ConsiderComms::RandComm, ConsiderComms::RandNeighComm] {
        let params = LocalMoveParams {
            consider_comms: mode,
            ..LocalMoveParams::default()
        };
        let oracle = CpmOracle::new(two_triangles())
            .with_params(params)
            .with_seed(99);
        let partition = oracle.find_partition(0.5).unwrap();
        assert_eq!(partition.assignment().len(), 6);
        assert!(partition.n_communities() >= 1);
        assert!(partition.internal_weight() >= 0.0);
        assert!(partition.internal_weight() <= 7.0);
    }
}

#[test]
fn custom_bisect_fn_drives_the_scan() {
    // Count communities instead of internal weight; the count grows with
    // resolution, so negate it to keep the non-increasing convention.
    let oracle = CpmOracle::new(two_triangles())
        .with_params(deterministic_params())
        .with_bisect_fn(|m| -(m.n_communities() as f64));
    let scanner = ProfileScannerBuilder::new(oracle)
        .min_diff_bisect(0.5)
        .build();
    let profile = scanner.scan((0.01, 10.0)).unwrap();

    let values: Vec<f64> = profile.iter().map(|s| s.bisect_value).collect();
    assert_eq!(values, vec![-1.0, -2.0, -6.0]);
}
