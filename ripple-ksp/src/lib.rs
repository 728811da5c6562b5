//! ripple-ksp: many-to-many k shortest simple paths by ripple spreading.
//! Ripples start at every destination and spread backwards over the graph at
//! a fixed speed; the first k ripples to reach a node are kept, and each
//! source's k arrivals are its k paths, shortest first.
use std::collections::BTreeMap;

use serde::Serialize;

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod generators;
pub mod graph;
pub mod ripple;

pub use config::SimulationConfig;
pub use engine::{Simulation, SimulationStats};
pub use error::{Result, RippleError};
pub use extract::PathRecord;
pub use graph::{Graph, ReversedGraph};
pub use ripple::{Ripple, RippleId, RippleRegistry, RippleState, VisitLedger};

pub type Node = usize;
pub type Weight = f64;

#[derive(Clone, Debug, Serialize)]
pub struct KShortestPaths {
    /// Radius increment per tick (minimum edge weight).
    pub speed: Weight,
    /// Up to k records per source, in arrival order.
    pub paths: BTreeMap<Node, Vec<PathRecord>>,
    pub stats: SimulationStats,
}

/// Up to `k` shortest simple paths from each source into the destination set,
/// with the default [`SimulationConfig`].
pub fn k_shortest_paths(g: &Graph, sources: &[Node], destinations: &[Node], k: usize) -> Result<KShortestPaths> {
    k_shortest_paths_with_config(g, sources, destinations, k, &SimulationConfig::default())
}

pub fn k_shortest_paths_with_config(
    g: &Graph,
    sources: &[Node],
    destinations: &[Node],
    k: usize,
    config: &SimulationConfig,
) -> Result<KShortestPaths> {
    validate_request(g.len(), sources, destinations, k)?;
    let reversed = ReversedGraph::build(g)?;
    let mut sim = Simulation::new(&reversed, destinations, k)?;
    if config.check_reachability {
        let reached = reversed.reachable_from(destinations);
        if let Some(&node) = sources.iter().find(|&&s| !reached[s]) {
            tracing::warn!(source = node, "source cannot reach any destination");
            return Err(RippleError::Unreachable { node });
        }
    }
    let stats = sim.run(sources, config)?.clone();
    Ok(KShortestPaths { speed: sim.speed(), paths: sim.extract(sources), stats })
}

fn validate_request(n: usize, sources: &[Node], destinations: &[Node], k: usize) -> Result<()> {
    if k < 1 {
        return Err(RippleError::InvalidK { k });
    }
    if sources.is_empty() {
        return Err(RippleError::EmptySources);
    }
    if destinations.is_empty() {
        return Err(RippleError::EmptyDestinations);
    }
    engine::check_nodes(n, sources, RippleError::DuplicateSource)?;
    engine::check_nodes(n, destinations, RippleError::DuplicateDestination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use generators::{demo, Weights};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::cmp::{Ordering, Reverse};
    use std::collections::BinaryHeap;

    fn rec(path: &[Node], length: Weight) -> PathRecord {
        PathRecord { path: path.to_vec(), length }
    }

    #[derive(Copy, Clone, Debug, PartialEq)]
    struct Entry { d: Weight, v: Node }
    impl Eq for Entry {}
    impl Ord for Entry {
        fn cmp(&self, other: &Self) -> Ordering {
            self.d.total_cmp(&other.d).then(self.v.cmp(&other.v))
        }
    }
    impl PartialOrd for Entry {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
    }

    /// Distance from every node to the nearest destination (Dijkstra on the reversed graph).
    fn distance_to_set(g: &Graph, destinations: &[Node]) -> Vec<Weight> {
        let rg = ReversedGraph::build(g).unwrap();
        let mut dist = vec![Weight::INFINITY; g.len()];
        let mut heap: BinaryHeap<Reverse<Entry>> = BinaryHeap::new();
        for &d in destinations { dist[d] = 0.0; heap.push(Reverse(Entry { d: 0.0, v: d })); }
        while let Some(Reverse(Entry { d, v })) = heap.pop() {
            if d != dist[v] { continue; }
            for &(to, w) in rg.edges(v) {
                let nd = d + w;
                if nd < dist[to] { dist[to] = nd; heap.push(Reverse(Entry { d: nd, v: to })); }
            }
        }
        dist
    }

    /// Lengths of every simple path from `s` ending at a destination, ascending.
    /// A path may pass through one destination on its way to another.
    fn all_simple_path_lengths(g: &Graph, s: Node, destinations: &[Node]) -> Vec<Weight> {
        fn dfs(g: &Graph, u: Node, dst: &[Node], on: &mut Vec<bool>, len: Weight, out: &mut Vec<Weight>) {
            if dst.contains(&u) { out.push(len); }
            for &(v, w) in &g.adj[u] {
                if on[v] { continue; }
                on[v] = true;
                dfs(g, v, dst, on, len + w, out);
                on[v] = false;
            }
        }
        let mut on = vec![false; g.len()];
        on[s] = true;
        let mut out = Vec::new();
        dfs(g, s, destinations, &mut on, 0.0, &mut out);
        out.sort_by(|a, b| a.total_cmp(b));
        out
    }

    fn check_records(g: &Graph, s: Node, destinations: &[Node], records: &[PathRecord]) {
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.path.first(), Some(&s));
            let last = *r.path.last().unwrap();
            assert!(destinations.contains(&last), "path {:?} ends off the destination set", r.path);
            let mut sorted = r.path.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), r.path.len(), "path {:?} is not simple", r.path);
            assert_eq!(g.path_length(&r.path), Some(r.length), "length mismatch on {:?}", r.path);
            // equal-length paths may differ in the last bit once weights are fractional
            if i > 0 { assert!(records[i - 1].length <= r.length + 1e-9); }
            assert!(records[..i].iter().all(|o| o.path != r.path), "duplicate path {:?}", r.path);
        }
    }

    #[test]
    fn demo_scenario() {
        let g = demo();
        let res = k_shortest_paths(&g, &[0, 1], &[10, 11], 3).unwrap();
        assert_eq!(res.speed, 1.0);
        assert_eq!(
            res.paths[&0],
            vec![rec(&[0, 3, 5, 8, 11], 11.0), rec(&[0, 2, 5, 8, 11], 14.0), rec(&[0, 2, 7, 10], 15.0)]
        );
        assert_eq!(
            res.paths[&1],
            vec![rec(&[1, 3, 5, 8, 11], 10.0), rec(&[1, 3, 5, 7, 10], 14.0), rec(&[1, 3, 5, 8, 10], 14.0)]
        );
        for s in [0, 1] {
            check_records(&g, s, &[10, 11], &res.paths[&s]);
            // first three lengths from exhaustive enumeration
            let all = all_simple_path_lengths(&g, s, &[10, 11]);
            let got: Vec<Weight> = res.paths[&s].iter().map(|r| r.length).collect();
            assert_eq!(got, all[..3].to_vec());
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let g = generators::erdos_renyi(40, 0.12, Weights::Integer { max: 9 }, 5);
        let a = k_shortest_paths(&g, &[0, 1, 2], &[38, 39], 4);
        let b = k_shortest_paths(&g, &[0, 1, 2], &[38, 39], 4);
        match (a, b) {
            (Ok(a), Ok(b)) => { assert_eq!(a.paths, b.paths); assert_eq!(a.stats, b.stats); }
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("runs disagree"),
        }
    }

    #[test]
    fn k1_matches_dijkstra() {
        for seed in 0..20u64 {
            let g = generators::erdos_renyi(25, 0.15, Weights::Integer { max: 12 }, seed);
            let dst = generators::pick_nodes(25, 2, &[], seed);
            let srcs = generators::pick_nodes(25, 3, &dst, seed + 1000);
            let dist = distance_to_set(&g, &dst);
            let srcs: Vec<Node> = srcs.into_iter().filter(|&s| dist[s].is_finite()).collect();
            if srcs.is_empty() { continue; }
            let res = k_shortest_paths(&g, &srcs, &dst, 1).unwrap();
            for &s in &srcs {
                assert_eq!(res.paths[&s].len(), 1);
                assert_eq!(res.paths[&s][0].length, dist[s], "seed {seed} source {s}");
                check_records(&g, s, &dst, &res.paths[&s]);
            }
        }
    }

    #[test]
    fn random_graphs_yield_valid_paths() {
        let mut rng = StdRng::seed_from_u64(2024);
        for round in 0..30 {
            let n = rng.gen_range(6..11);
            let g = generators::erdos_renyi(n, 0.35, Weights::Integer { max: 9 }, rng.gen());
            if g.edge_count() == 0 { continue; }
            let dst = generators::pick_nodes(n, 1 + round % 2, &[], rng.gen());
            let srcs = generators::pick_nodes(n, 2, &dst, rng.gen());
            let k = rng.gen_range(1..5);
            let cfg = SimulationConfig { check_reachability: false, ..Default::default() };
            let dist = distance_to_set(&g, &dst);
            match k_shortest_paths_with_config(&g, &srcs, &dst, k, &cfg) {
                Ok(res) => {
                    for &s in &srcs {
                        let recs = &res.paths[&s];
                        assert_eq!(recs.len(), k);
                        check_records(&g, s, &dst, recs);
                        assert_eq!(recs[0].length, dist[s]);
                        let all = all_simple_path_lengths(&g, s, &dst);
                        assert!(all.len() >= k);
                    }
                }
                Err(RippleError::Infeasible { node, found, k: want }) => {
                    assert!(found < want);
                    assert!(srcs.contains(&node));
                }
                Err(e) => panic!("round {round}: unexpected error {e}"),
            }
        }
    }

    #[test]
    fn fractional_weights_keep_exact_lengths() {
        let mut rng = StdRng::seed_from_u64(77);
        let w = Weights::Real { min: 0.1, max: 3.0 };
        let mut checked = 0;
        for round in 0..40 {
            let n = rng.gen_range(6..12);
            let g = generators::erdos_renyi(n, 0.35, w, rng.gen());
            if g.edge_count() == 0 { continue; }
            let dst = generators::pick_nodes(n, 1 + round % 2, &[], rng.gen());
            let srcs = generators::pick_nodes(n, 2, &dst, rng.gen());
            let dist = distance_to_set(&g, &dst);
            let srcs: Vec<Node> = srcs.into_iter().filter(|&s| dist[s].is_finite()).collect();
            if srcs.is_empty() { continue; }

            let one = k_shortest_paths(&g, &srcs, &dst, 1).unwrap();
            for &s in &srcs {
                check_records(&g, s, &dst, &one.paths[&s]);
                assert!((one.paths[&s][0].length - dist[s]).abs() < 1e-9, "round {round} source {s}");
            }

            let k = rng.gen_range(2..5);
            match k_shortest_paths(&g, &srcs, &dst, k) {
                Ok(res) => {
                    for &s in &srcs {
                        assert_eq!(res.paths[&s].len(), k);
                        check_records(&g, s, &dst, &res.paths[&s]);
                    }
                }
                Err(RippleError::Infeasible { found, k: want, .. }) => assert!(found < want),
                Err(e) => panic!("round {round}: unexpected error {e}"),
            }
            checked += 1;
        }
        assert!(checked > 10);
    }

    #[test]
    fn tenths_sum_in_path_order() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 0.1);
        g.add_edge(1, 2, 0.2);
        g.add_edge(2, 3, 0.3);
        let res = k_shortest_paths(&g, &[0], &[3], 1).unwrap();
        assert_eq!(res.paths[&0], vec![rec(&[0, 1, 2, 3], 0.1 + 0.2 + 0.3)]);
        assert_eq!(g.path_length(&[0, 1, 2, 3]), Some(res.paths[&0][0].length));
    }

    #[test]
    fn too_few_paths_is_infeasible_not_a_hang() {
        // 0 -> 1 -> 3 and 0 -> 2 -> 3: exactly two simple paths
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1.0);
        g.add_edge(0, 2, 2.0);
        g.add_edge(1, 3, 1.0);
        g.add_edge(2, 3, 1.0);
        let ok = k_shortest_paths(&g, &[0], &[3], 2).unwrap();
        assert_eq!(ok.paths[&0], vec![rec(&[0, 1, 3], 2.0), rec(&[0, 2, 3], 3.0)]);
        let err = k_shortest_paths(&g, &[0], &[3], 3).unwrap_err();
        assert!(matches!(err, RippleError::Infeasible { node: 0, found: 2, k: 3 }), "{err}");
    }

    #[test]
    fn unreachable_source() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1.0);
        g.add_edge(2, 3, 1.0);
        let err = k_shortest_paths(&g, &[2, 0], &[1], 1).unwrap_err();
        assert!(matches!(err, RippleError::Unreachable { node: 2 }), "{err}");

        // without the pre-check the stall detector catches it
        let cfg = SimulationConfig { check_reachability: false, ..Default::default() };
        let err = k_shortest_paths_with_config(&g, &[2, 0], &[1], 1, &cfg).unwrap_err();
        assert!(matches!(err, RippleError::Infeasible { node: 2, found: 0, k: 1 }), "{err}");
    }

    #[test]
    fn tick_budget() {
        let g = demo();
        let cfg = SimulationConfig::default().with_max_ticks(5);
        let err = k_shortest_paths_with_config(&g, &[0, 1], &[10, 11], 3, &cfg).unwrap_err();
        assert!(matches!(err, RippleError::TickLimitExceeded { max_ticks: 5 }));
        let cfg = SimulationConfig::default().with_max_ticks(10_000);
        assert!(k_shortest_paths_with_config(&g, &[0, 1], &[10, 11], 3, &cfg).is_ok());
    }

    #[test]
    fn source_that_is_also_a_destination() {
        let mut g = Graph::new(2);
        g.add_edge(0, 1, 2.0);
        let one = k_shortest_paths(&g, &[0], &[0, 1], 1).unwrap();
        assert_eq!(one.paths[&0], vec![rec(&[0], 0.0)]);
        assert_eq!(one.stats.ticks, 0);

        let two = k_shortest_paths(&g, &[0], &[0, 1], 2).unwrap();
        assert_eq!(two.paths[&0], vec![rec(&[0], 0.0), rec(&[0, 1], 2.0)]);
    }

    #[test]
    fn request_validation() {
        let g = demo();
        let e = |r: Result<KShortestPaths>| r.unwrap_err();
        assert!(matches!(e(k_shortest_paths(&g, &[0], &[10], 0)), RippleError::InvalidK { k: 0 }));
        assert!(matches!(e(k_shortest_paths(&g, &[], &[10], 1)), RippleError::EmptySources));
        assert!(matches!(e(k_shortest_paths(&g, &[0], &[], 1)), RippleError::EmptyDestinations));
        assert!(matches!(e(k_shortest_paths(&g, &[12], &[10], 1)), RippleError::NodeOutOfRange { node: 12, n: 12 }));
        assert!(matches!(e(k_shortest_paths(&g, &[0], &[99], 1)), RippleError::NodeOutOfRange { node: 99, .. }));
        assert!(matches!(e(k_shortest_paths(&g, &[0, 0], &[10], 1)), RippleError::DuplicateSource(0)));
        assert!(matches!(e(k_shortest_paths(&g, &[0], &[10, 10], 1)), RippleError::DuplicateDestination(10)));

        let mut bad = demo();
        bad.adj[4].push((5, 0.0));
        let err = e(k_shortest_paths(&bad, &[0], &[10], 1));
        assert!(matches!(err, RippleError::InvalidWeight { from: 4, to: 5, .. }));
        assert!(err.to_string().contains("4 -> 5"));

        let isolated = Graph::new(3);
        assert!(matches!(e(k_shortest_paths(&isolated, &[0], &[2], 1)), RippleError::NoEdges));
    }

    #[test]
    fn result_serializes() {
        let res = k_shortest_paths(&demo(), &[0], &[10, 11], 1).unwrap();
        let v = serde_json::to_value(&res).unwrap();
        assert_eq!(v["paths"]["0"][0]["path"], serde_json::json!([0, 3, 5, 8, 11]));
        assert_eq!(v["paths"]["0"][0]["length"], serde_json::json!(11.0));
        assert!(v["stats"]["ticks"].as_u64().unwrap() >= 11);
    }
}
