//! Error type shared by graph validation, request validation and the simulation.
use crate::{Node, Weight};

#[derive(Debug, thiserror::Error)]
pub enum RippleError {
    #[error("node {node} has no adjacency entry (graph must list every id in 0..{n})")]
    MissingNode { node: Node, n: usize },

    #[error("node {node} is out of range for a graph with {n} nodes")]
    NodeOutOfRange { node: Node, n: usize },

    #[error("edge {from} -> {to} has invalid weight {weight} (must be finite and > 0)")]
    InvalidWeight { from: Node, to: Node, weight: Weight },

    #[error("self-loop on node {node}")]
    SelfLoop { node: Node },

    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge { from: Node, to: Node },

    #[error("graph has no edges, propagation speed is undefined")]
    NoEdges,

    #[error("k must be at least 1, got {k}")]
    InvalidK { k: usize },

    #[error("source set is empty")]
    EmptySources,

    #[error("destination set is empty")]
    EmptyDestinations,

    #[error("source {0} listed more than once")]
    DuplicateSource(Node),

    #[error("destination {0} listed more than once")]
    DuplicateDestination(Node),

    #[error("source {node} cannot reach any destination")]
    Unreachable { node: Node },

    #[error("source {node} collected only {found} of {k} paths before every ripple went inactive")]
    Infeasible { node: Node, found: usize, k: usize },

    #[error("simulation exceeded its budget of {max_ticks} ticks")]
    TickLimitExceeded { max_ticks: u64 },

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RippleError>;
