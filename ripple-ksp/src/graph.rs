//! Input graph, its validated reversal, and the propagation speed derived from it.
//! Ripples grow from destinations toward sources, so the engine only ever walks
//! the reversed graph.
use std::collections::{BTreeMap, VecDeque};

use crate::error::{Result, RippleError};
use crate::{Node, Weight};

#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub adj: Vec<Vec<(Node, Weight)>>,
}
impl Graph {
    pub fn new(n: usize) -> Self { Self { adj: vec![Vec::new(); n] } }
    pub fn len(&self) -> usize { self.adj.len() }
    pub fn is_empty(&self) -> bool { self.adj.is_empty() }
    pub fn edge_count(&self) -> usize { self.adj.iter().map(|v| v.len()).sum() }
    /// Panics if `u` is out of range; targets are checked by [`ReversedGraph::build`].
    pub fn add_edge(&mut self, u: Node, v: Node, w: Weight) { self.adj[u].push((v, w)); }
    pub fn add_undirected_edge(&mut self, u: Node, v: Node, w: Weight) {
        self.add_edge(u, v, w); self.add_edge(v, u, w);
    }

    /// Builds a graph from the `node -> [(neighbor, weight)]` mapping form.
    /// The node count is the number of entries and every id below it must be present.
    pub fn from_adjacency(adjacency: &BTreeMap<Node, Vec<(Node, Weight)>>) -> Result<Self> {
        let n = adjacency.len();
        let mut g = Graph::new(n);
        for u in 0..n {
            let edges = adjacency.get(&u).ok_or(RippleError::MissingNode { node: u, n })?;
            g.adj[u] = edges.clone();
        }
        Ok(g)
    }

    /// Parses `{"0": {"1": 6.0, ...}, ...}`. Neighbors come out in ascending id order.
    pub fn from_json(s: &str) -> Result<Self> {
        let raw: BTreeMap<Node, BTreeMap<Node, Weight>> = serde_json::from_str(s)?;
        let adjacency = raw
            .into_iter()
            .map(|(u, nbrs)| (u, nbrs.into_iter().collect()))
            .collect();
        Self::from_adjacency(&adjacency)
    }

    /// Sum of original-graph weights along `path`, or `None` if a hop is not an edge.
    pub fn path_length(&self, path: &[Node]) -> Option<Weight> {
        let mut total = 0.0;
        for hop in path.windows(2) {
            let (_, w) = self.adj.get(hop[0])?.iter().find(|&&(v, _)| v == hop[1])?;
            total += w;
        }
        Some(total)
    }

    pub fn memory_estimate_bytes(&self) -> usize {
        let n = self.adj.len();
        let m = self.edge_count();
        let edge_bytes = m * (std::mem::size_of::<usize>() + std::mem::size_of::<Weight>());
        let vec_headers = n * 3 * std::mem::size_of::<usize>();
        let outer_vec_header = 3 * std::mem::size_of::<usize>();
        // reversed copy plus one visit-ledger vector per node
        2 * (edge_bytes + vec_headers + outer_vec_header) + vec_headers
    }
}

/// The reversed graph the ripples propagate over. Only constructible through
/// [`ReversedGraph::build`], so every instance holds validated edges.
#[derive(Clone, Debug)]
pub struct ReversedGraph {
    adj: Vec<Vec<(Node, Weight)>>,
    edges: usize,
}

impl ReversedGraph {
    /// Validates `g` and inserts `v -> u` for every edge `u -> v`. Original nodes
    /// are visited in ascending order, which fixes neighbor enumeration order.
    pub fn build(g: &Graph) -> Result<Self> {
        let n = g.len();
        let mut adj = vec![Vec::new(); n];
        let mut seen = vec![usize::MAX; n];
        let mut edges = 0;
        for (u, out) in g.adj.iter().enumerate() {
            for &(v, w) in out {
                if v >= n {
                    return Err(RippleError::NodeOutOfRange { node: v, n });
                }
                if v == u {
                    return Err(RippleError::SelfLoop { node: u });
                }
                if !(w.is_finite() && w > 0.0) {
                    return Err(RippleError::InvalidWeight { from: u, to: v, weight: w });
                }
                // `seen[v] == u` marks v as already a target of u
                if seen[v] == u {
                    return Err(RippleError::DuplicateEdge { from: u, to: v });
                }
                seen[v] = u;
                adj[v].push((u, w));
                edges += 1;
            }
        }
        Ok(Self { adj, edges })
    }

    pub fn len(&self) -> usize { self.adj.len() }
    pub fn is_empty(&self) -> bool { self.adj.is_empty() }
    pub fn edge_count(&self) -> usize { self.edges }

    /// Outgoing reversed edges of `e` in enumeration order.
    pub fn edges(&self, e: Node) -> &[(Node, Weight)] { &self.adj[e] }

    /// Neighbor index: nodes one reversed edge away from `e`.
    pub fn neighbors(&self, e: Node) -> impl Iterator<Item = Node> + '_ {
        self.adj[e].iter().map(|&(n, _)| n)
    }

    pub fn weight(&self, e: Node, n: Node) -> Option<Weight> {
        self.adj[e].iter().find(|&&(v, _)| v == n).map(|&(_, w)| w)
    }

    /// Per-tick radius increment: the smallest edge weight. No ripple can step
    /// over an edge between two ticks.
    pub fn propagation_speed(&self) -> Result<Weight> {
        self.adj
            .iter()
            .flatten()
            .map(|&(_, w)| w)
            .min_by(|a, b| a.total_cmp(b))
            .ok_or(RippleError::NoEdges)
    }

    /// Marks every node reachable from `roots` along reversed edges, i.e. every
    /// node with some original path into `roots`.
    pub fn reachable_from(&self, roots: &[Node]) -> Vec<bool> {
        let mut seen = vec![false; self.len()];
        let mut queue: VecDeque<Node> = VecDeque::new();
        for &r in roots {
            if !seen[r] { seen[r] = true; queue.push_back(r); }
        }
        while let Some(u) = queue.pop_front() {
            for v in self.neighbors(u) {
                if !seen[v] { seen[v] = true; queue.push_back(v); }
            }
        }
        seen
    }
}
