//! Discrete-time ripple-spreading loop.
//!
//! Every tick all Active ripples grow by the propagation speed `v`. A ripple
//! centered at `e` crosses into neighbor `n` during the tick in which its
//! radius passes the reversed edge weight `w(e, n)`; the crossing stages a
//! candidate at `n` carrying the overshoot `r - w` as its starting radius.
//! Candidates are then admitted per node, largest overshoot first, until the
//! node's visit ledger holds `k` ripples. Since radius equals elapsed time
//! times `v` minus path length, arrival order is length order.
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::SimulationConfig;
use crate::error::{Result, RippleError};
use crate::extract::{extract_paths, PathRecord};
use crate::graph::ReversedGraph;
use crate::ripple::{RippleRegistry, VisitLedger};
use crate::{Node, Weight};

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    pub ticks: u64,
    pub ripples_created: usize,
    pub candidates_staged: usize,
    /// Candidates dropped because their node ran out of visit capacity.
    pub candidates_pruned: usize,
    pub peak_active: usize,
}

#[derive(Clone, Debug)]
struct Candidate {
    path: Vec<Node>,
    radius: Weight,
    length: Weight,
}

pub struct Simulation<'g> {
    graph: &'g ReversedGraph,
    speed: Weight,
    registry: RippleRegistry,
    ledger: VisitLedger,
    // per-node staging buckets, cleared and reused every tick
    incoming: Vec<Vec<Candidate>>,
    // nodes with a non-empty bucket, in first-staged order
    touched: Vec<Node>,
    stats: SimulationStats,
}

impl<'g> Simulation<'g> {
    /// Seeds one Active ripple of radius 0 at every destination.
    pub fn new(graph: &'g ReversedGraph, destinations: &[Node], k: usize) -> Result<Self> {
        if k == 0 {
            return Err(RippleError::InvalidK { k });
        }
        if destinations.is_empty() {
            return Err(RippleError::EmptyDestinations);
        }
        check_nodes(graph.len(), destinations, RippleError::DuplicateDestination)?;
        let speed = graph.propagation_speed()?;
        let n = graph.len();
        let mut sim = Self {
            graph,
            speed,
            registry: RippleRegistry::new(),
            ledger: VisitLedger::new(n, k),
            incoming: vec![Vec::new(); n],
            touched: Vec::new(),
            stats: SimulationStats::default(),
        };
        for &d in destinations {
            let id = sim.registry.create(d, vec![d], 0.0, 0.0);
            sim.ledger.record(d, id);
        }
        sim.stats.ripples_created = destinations.len();
        sim.stats.peak_active = sim.registry.active_count();
        Ok(sim)
    }

    pub fn speed(&self) -> Weight { self.speed }
    pub fn stats(&self) -> &SimulationStats { &self.stats }
    pub fn registry(&self) -> &RippleRegistry { &self.registry }
    pub fn ledger(&self) -> &VisitLedger { &self.ledger }

    /// True once every source holds `k` visits. Ids outside the graph never complete.
    pub fn is_complete(&self, sources: &[Node]) -> bool {
        sources.iter().all(|&s| s < self.graph.len() && self.ledger.is_full(s))
    }

    /// Advances the clock by one tick: expand, stage crossings, admit new
    /// ripples under the cap, retire exhausted ripples.
    pub fn tick(&mut self) {
        self.stats.ticks += 1;
        let staged = self.expand_and_stage();
        let admitted = self.admit_candidates();
        let retired = self.retire_exhausted();
        self.stats.peak_active = self.stats.peak_active.max(self.registry.active_count());
        trace!(
            tick = self.stats.ticks,
            staged,
            admitted,
            retired,
            active = self.registry.active_count(),
            "tick"
        );
    }

    fn expand_and_stage(&mut self) -> usize {
        let graph = self.graph;
        let speed = self.speed;
        let below_speed = speed * (1.0 - f64::EPSILON);
        let mut staged = 0;
        for ripple in self.registry.active_mut() {
            let (before, radius) = ripple.expand(speed);
            for &(n, w) in graph.edges(ripple.epicenter) {
                // equivalent to w <= radius < w + v, without accumulated rounding
                if !(before < w && w <= radius) {
                    continue;
                }
                if !self.ledger.has_room(n) || ripple.path.contains(&n) {
                    continue;
                }
                let mut path = Vec::with_capacity(ripple.path.len() + 1);
                path.extend_from_slice(&ripple.path);
                path.push(n);
                let bucket = &mut self.incoming[n];
                if bucket.is_empty() {
                    self.touched.push(n);
                }
                // below v in exact arithmetic; rounding must not push it to v
                let overshoot = (radius - w).min(below_speed);
                bucket.push(Candidate { path, radius: overshoot, length: ripple.length + w });
                staged += 1;
            }
        }
        self.stats.candidates_staged += staged;
        staged
    }

    fn admit_candidates(&mut self) -> usize {
        let mut admitted = 0;
        for &n in &self.touched {
            let bucket = &mut self.incoming[n];
            // stable: equal overshoot keeps staging order (ripple creation
            // order, then neighbor enumeration order)
            bucket.sort_by(|a, b| b.radius.total_cmp(&a.radius));
            let room = self.ledger.remaining(n);
            self.stats.candidates_pruned += bucket.len().saturating_sub(room);
            for c in bucket.drain(..).take(room) {
                let id = self.registry.create(n, c.path, c.radius, c.length);
                self.ledger.record(n, id);
                admitted += 1;
            }
        }
        self.touched.clear();
        self.stats.ripples_created += admitted;
        admitted
    }

    /// A ripple stays Active only while some neighbor of its epicenter is still
    /// beyond its radius and has visit capacity left.
    fn retire_exhausted(&mut self) -> usize {
        let graph = self.graph;
        let ledger = &self.ledger;
        self.registry.deactivate_where(|r| {
            !graph.edges(r.epicenter).iter().any(|&(n, w)| r.radius() < w && ledger.has_room(n))
        })
    }

    /// Ticks until every source is complete. Fails when no Active ripple is
    /// left to make progress, or when the configured tick budget runs out.
    pub fn run(&mut self, sources: &[Node], config: &SimulationConfig) -> Result<&SimulationStats> {
        if sources.is_empty() {
            return Err(RippleError::EmptySources);
        }
        check_nodes(self.graph.len(), sources, RippleError::DuplicateSource)?;
        debug!(
            nodes = self.graph.len(),
            edges = self.graph.edge_count(),
            speed = self.speed,
            k = self.ledger.k(),
            sources = sources.len(),
            "ripple simulation start"
        );
        while !self.is_complete(sources) {
            if self.registry.active_count() == 0 {
                let (node, found) = sources
                    .iter()
                    .map(|&s| (s, self.ledger.count(s)))
                    .find(|&(_, c)| c < self.ledger.k())
                    .unwrap_or((sources[0], 0));
                warn!(source = node, found, k = self.ledger.k(), ticks = self.stats.ticks, "ripples exhausted before quota");
                return Err(RippleError::Infeasible { node, found, k: self.ledger.k() });
            }
            if let Some(max_ticks) = config.max_ticks {
                if self.stats.ticks >= max_ticks {
                    warn!(max_ticks, "tick budget exhausted");
                    return Err(RippleError::TickLimitExceeded { max_ticks });
                }
            }
            self.tick();
        }
        debug!(stats = ?self.stats, "ripple simulation complete");
        Ok(&self.stats)
    }

    /// Reads each source's arrivals into source-first path records.
    pub fn extract(&self, sources: &[Node]) -> BTreeMap<Node, Vec<PathRecord>> {
        extract_paths(self.graph, &self.registry, &self.ledger, sources)
    }
}

/// Every id below `n`, none repeated; `duplicate` names the offending role.
pub(crate) fn check_nodes(n: usize, nodes: &[Node], duplicate: fn(Node) -> RippleError) -> Result<()> {
    let mut seen = vec![false; n];
    for &x in nodes {
        if x >= n {
            return Err(RippleError::NodeOutOfRange { node: x, n });
        }
        if std::mem::replace(&mut seen[x], true) {
            return Err(duplicate(x));
        }
    }
    Ok(())
}
