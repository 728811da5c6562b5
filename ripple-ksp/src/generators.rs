//! Seeded random graph families plus the small demonstration network.
//! Every generator emits simple digraphs: no self-loops, no parallel edges.
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::graph::Graph;
use crate::{Node, Weight};

/// How edge weights are drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Weights {
    /// Whole numbers in `1..=max`. Path lengths stay exact in f64.
    Integer { max: u32 },
    /// Uniform reals in `min..max`, `0 < min < max`.
    Real { min: Weight, max: Weight },
}

impl Weights {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Weight {
        match *self {
            Weights::Integer { max } => rng.gen_range(1..=max.max(1)) as Weight,
            Weights::Real { min, max } => rng.gen_range(min..max),
        }
    }
}

/// 12-node network with sources `{0, 1}` and destinations `{10, 11}` in mind.
pub fn demo() -> Graph {
    let rows: [&[(Node, Weight)]; 12] = [
        &[(1, 6.0), (2, 7.0), (3, 4.0)],
        &[(0, 6.0), (3, 3.0), (4, 7.0)],
        &[(0, 7.0), (5, 2.0), (7, 5.0)],
        &[(0, 4.0), (1, 3.0), (5, 2.0), (6, 9.0)],
        &[(1, 7.0), (6, 7.0), (9, 9.0)],
        &[(2, 2.0), (3, 2.0), (7, 6.0), (8, 4.0)],
        &[(3, 9.0), (4, 7.0), (8, 7.0), (9, 4.0)],
        &[(2, 5.0), (5, 6.0), (10, 3.0)],
        &[(5, 4.0), (6, 7.0), (10, 5.0), (11, 1.0)],
        &[(4, 9.0), (6, 4.0), (11, 7.0)],
        &[(7, 3.0), (8, 5.0), (11, 7.0)],
        &[(8, 1.0), (9, 7.0), (10, 7.0)],
    ];
    let mut g = Graph::new(rows.len());
    for (u, row) in rows.iter().enumerate() {
        g.adj[u] = row.to_vec();
    }
    g
}

/// Four-neighbor lattice; each undirected link gets one weight for both directions.
pub fn grid(rows: usize, cols: usize, weights: Weights, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = Graph::new(rows * cols);
    for u in 0..rows * cols {
        let (r, c) = (u / cols, u % cols);
        if r + 1 < rows { g.add_undirected_edge(u, u + cols, weights.sample(&mut rng)); }
        if c + 1 < cols { g.add_undirected_edge(u, u + 1, weights.sample(&mut rng)); }
    }
    g
}

/// Each ordered pair `(u, v)`, `u != v`, is an edge with probability `p`.
pub fn erdos_renyi(n: usize, p: f64, weights: Weights, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = Graph::new(n);
    for (u, out) in g.adj.iter_mut().enumerate() {
        for v in (0..n).filter(|&v| v != u) {
            if rng.gen::<f64>() < p {
                out.push((v, weights.sample(&mut rng)));
            }
        }
    }
    g
}

/// Preferential attachment. Each new node links to up to `m` distinct earlier
/// nodes picked by degree, in both directions.
pub fn barabasi_albert(n: usize, m0: usize, m: usize, weights: Weights, seed: u64) -> Graph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = Graph::new(n);
    let mut ends: Vec<usize> = Vec::new();
    let start = m0.max(1).min(n);
    for u in 0..start {
        for v in 0..start {
            if u != v { g.add_edge(u, v, weights.sample(&mut rng)); ends.push(u); }
        }
    }
    for u in start..n {
        let mut targets: Vec<usize> = Vec::with_capacity(m);
        for _ in 0..m.min(u) * 4 {
            if targets.len() == m.min(u) { break; }
            let t = if ends.is_empty() { rng.gen_range(0..u) } else { ends[rng.gen_range(0..ends.len())] };
            if !targets.contains(&t) { targets.push(t); }
        }
        for t in targets {
            g.add_undirected_edge(u, t, weights.sample(&mut rng));
            ends.push(t);
            ends.push(u);
        }
    }
    g
}

/// `count` distinct nodes drawn from `0..n`, skipping anything in `exclude`.
pub fn pick_nodes(n: usize, count: usize, exclude: &[Node], seed: u64) -> Vec<Node> {
    let mut rng = StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
    let mut seen = std::collections::BTreeSet::new();
    seen.extend(exclude.iter().copied().filter(|&x| x < n));
    let mut out = Vec::with_capacity(count);
    while out.len() < count && seen.len() < n {
        let s = rng.gen_range(0..n);
        if seen.insert(s) { out.push(s); }
    }
    out
}
