//! Ripple arena and per-node visit ledger.
use serde::Serialize;

use crate::{Node, Weight};

/// Stable handle into the [`RippleRegistry`]. Ripples are never removed, so a
/// handle stays valid for the life of the registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct RippleId(pub usize);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum RippleState { Active, Inactive }

#[derive(Clone, Debug, Serialize)]
pub struct Ripple {
    pub id: RippleId,
    pub epicenter: Node,
    /// Destination first, epicenter last. Never repeats a node.
    pub path: Vec<Node>,
    radius: Weight,
    /// Sum of reversed-graph weights along `path`.
    pub length: Weight,
    state: RippleState,
}

impl Ripple {
    pub fn radius(&self) -> Weight { self.radius }
    pub fn state(&self) -> RippleState { self.state }
    pub fn is_active(&self) -> bool { self.state == RippleState::Active }

    /// Grows the radius by `dv` and returns `(before, after)`.
    pub(crate) fn expand(&mut self, dv: Weight) -> (Weight, Weight) {
        debug_assert!(self.is_active(), "inactive ripple {:?} expanded", self.id);
        let before = self.radius;
        self.radius += dv;
        (before, self.radius)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RippleRegistry {
    ripples: Vec<Ripple>,
    active: usize,
}

impl RippleRegistry {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.ripples.len() }
    pub fn is_empty(&self) -> bool { self.ripples.is_empty() }
    pub fn active_count(&self) -> usize { self.active }

    /// Adds an Active ripple centered at `epicenter`.
    pub fn create(&mut self, epicenter: Node, path: Vec<Node>, radius: Weight, length: Weight) -> RippleId {
        debug_assert_eq!(path.last(), Some(&epicenter));
        let id = RippleId(self.ripples.len());
        self.ripples.push(Ripple { id, epicenter, path, radius, length, state: RippleState::Active });
        self.active += 1;
        id
    }

    pub fn get(&self, id: RippleId) -> Option<&Ripple> { self.ripples.get(id.0) }

    pub fn iter(&self) -> impl Iterator<Item = &Ripple> { self.ripples.iter() }

    /// Active ripples in creation order.
    pub(crate) fn active_mut(&mut self) -> impl Iterator<Item = &mut Ripple> {
        self.ripples.iter_mut().filter(|r| r.is_active())
    }

    /// Flips every Active ripple for which `exhausted` holds to Inactive.
    /// Returns how many were deactivated.
    pub(crate) fn deactivate_where<F: FnMut(&Ripple) -> bool>(&mut self, mut exhausted: F) -> usize {
        let mut flipped = 0;
        for r in self.ripples.iter_mut().filter(|r| r.state == RippleState::Active) {
            if exhausted(&*r) {
                r.state = RippleState::Inactive;
                flipped += 1;
            }
        }
        self.active -= flipped;
        flipped
    }
}

/// For every node, the ripples that reached it in arrival order, capped at `k`.
#[derive(Clone, Debug)]
pub struct VisitLedger {
    k: usize,
    visits: Vec<Vec<RippleId>>,
}

impl VisitLedger {
    pub fn new(n: usize, k: usize) -> Self {
        Self { k, visits: vec![Vec::new(); n] }
    }

    pub fn k(&self) -> usize { self.k }
    pub fn count(&self, node: Node) -> usize { self.visits[node].len() }
    pub fn has_room(&self, node: Node) -> bool { self.visits[node].len() < self.k }
    pub fn remaining(&self, node: Node) -> usize { self.k - self.visits[node].len() }
    pub fn is_full(&self, node: Node) -> bool { !self.has_room(node) }
    pub fn visits(&self, node: Node) -> &[RippleId] { &self.visits[node] }

    /// Appends an arrival. Callers must have checked [`VisitLedger::has_room`].
    pub fn record(&mut self, node: Node, id: RippleId) {
        assert!(self.has_room(node), "visit ledger of node {node} already holds {} ripples", self.k);
        self.visits[node].push(id);
    }
}
