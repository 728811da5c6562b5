use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::ReversedGraph;
use crate::ripple::{Ripple, RippleRegistry, VisitLedger};
use crate::{Node, Weight};

/// One path from a source to some destination.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathRecord {
    /// Source first, destination last.
    pub path: Vec<Node>,
    /// Edge weights summed from the source end, the order a caller re-summing
    /// `path` over the original graph uses.
    pub length: Weight,
}

impl PathRecord {
    fn from_ripple(graph: &ReversedGraph, r: &Ripple) -> Self {
        let path: Vec<Node> = r.path.iter().rev().copied().collect();
        let mut length = 0.0;
        for hop in path.windows(2) {
            // original edge hop[0] -> hop[1] is stored reversed
            match graph.weight(hop[1], hop[0]) {
                Some(w) => length += w,
                None => return Self { path, length: r.length },
            }
        }
        Self { path, length }
    }
}

/// Converts each source's arrivals into path records, in arrival order.
/// Stored paths run destination-first and are reversed here.
pub fn extract_paths(
    graph: &ReversedGraph,
    registry: &RippleRegistry,
    ledger: &VisitLedger,
    sources: &[Node],
) -> BTreeMap<Node, Vec<PathRecord>> {
    sources
        .iter()
        .map(|&s| {
            let records = ledger
                .visits(s)
                .iter()
                .filter_map(|&id| registry.get(id))
                .map(|r| PathRecord::from_ripple(graph, r))
                .collect();
            (s, records)
        })
        .collect()
}
