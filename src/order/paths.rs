//! Path-based minor order for ordinary graphs.
//!
//! Older formulation of the minor test, valid for edges of arity at most two.
//! `smaller`'s edges are mapped onto distinct same-shaped edges of `bigger`;
//! every `smaller` vertex then owns the set of `bigger` vertices its incident
//! edges landed on. The owned vertices must be joined by paths over the
//! remaining edges, and paths of different owners must be vertex-disjoint.
//!
//! This is stricter than [`MinorOrder`] (a loop needs a path besides the
//! mapped edge, for instance), so graphs with hyperedges are handed to
//! [`MinorOrder`] directly.

use super::{may_fit, MinorOrder, Order};
use crate::core::{EdgeId, Hypergraph, VertexId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Legacy path-based minor order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathMinorOrder;

impl Order for PathMinorOrder {
    fn is_less_or_eq(&self, smaller: &Hypergraph, bigger: &Hypergraph) -> bool {
        if smaller.max_arity() > 2 || bigger.max_arity() > 2 {
            return MinorOrder.is_less_or_eq(smaller, bigger);
        }
        if !may_fit(smaller, bigger) {
            return false;
        }
        PathSearch::new(smaller, bigger).assign(0)
    }

    fn name(&self) -> &'static str {
        "path-minor"
    }

    fn contracts(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Undo {
    Claim(VertexId),
    Select(EdgeId),
}

struct PathSearch<'a> {
    bigger: &'a Hypergraph,
    plan: Vec<(EdgeId, Vec<EdgeId>)>,
    smaller: &'a Hypergraph,
    owner: BTreeMap<VertexId, VertexId>,
    selected: BTreeSet<EdgeId>,
    isolated_needed: usize,
}

impl<'a> PathSearch<'a> {
    fn new(smaller: &'a Hypergraph, bigger: &'a Hypergraph) -> Self {
        let plan = smaller
            .edges()
            .map(|s| {
                let candidates = bigger
                    .edges()
                    .filter(|b| b.label == s.label && b.arity() == s.arity())
                    .map(|b| b.id)
                    .collect();
                (s.id, candidates)
            })
            .collect();
        Self {
            bigger,
            plan,
            smaller,
            owner: BTreeMap::new(),
            selected: BTreeSet::new(),
            isolated_needed: smaller.isolated_vertices().count(),
        }
    }

    fn assign(&mut self, depth: usize) -> bool {
        if depth == self.plan.len() {
            return self.connect();
        }
        let (s_edge, candidates) = self.plan[depth].clone();
        for b_edge in candidates {
            if self.selected.contains(&b_edge) {
                continue;
            }
            let mut undo = Vec::new();
            if self.claim_edge(s_edge, b_edge, &mut undo) && self.assign(depth + 1) {
                return true;
            }
            self.rollback(undo);
        }
        false
    }

    fn claim_edge(&mut self, s_edge: EdgeId, b_edge: EdgeId, undo: &mut Vec<Undo>) -> bool {
        let (smaller, bigger) = (self.smaller, self.bigger);
        let (Some(s), Some(b)) = (smaller.edge(s_edge), bigger.edge(b_edge)) else {
            return false;
        };
        self.selected.insert(b_edge);
        undo.push(Undo::Select(b_edge));
        for (&sv, &bv) in s.vertices.iter().zip(&b.vertices) {
            match self.owner.get(&bv) {
                Some(o) if *o == sv => {}
                Some(_) => return false,
                None => {
                    self.owner.insert(bv, sv);
                    undo.push(Undo::Claim(bv));
                }
            }
        }
        true
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            match step {
                Undo::Claim(v) => {
                    self.owner.remove(&v);
                }
                Undo::Select(e) => {
                    self.selected.remove(&e);
                }
            }
        }
    }

    /// Checks that the current edge assignment extends to a minor witness.
    fn connect(&self) -> bool {
        let mut images: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
        for (&bv, &sv) in &self.owner {
            images.entry(sv).or_default().push(bv);
        }
        let mut connections = Vec::new();
        for (sv, bvs) in &images {
            // A star from the first image suffices for connectivity.
            for &other in &bvs[1..] {
                let paths = self.simple_paths(bvs[0], other, *sv);
                if paths.is_empty() {
                    return false;
                }
                connections.push((*sv, paths));
            }
        }
        let mut claimed = self.owner.clone();
        self.choose(&connections, 0, &mut claimed)
    }

    /// Simple paths from `from` to `to` over unselected edges whose vertices
    /// are unowned or owned by `sv`, found breadth-first.
    fn simple_paths(&self, from: VertexId, to: VertexId, sv: VertexId) -> Vec<Vec<VertexId>> {
        let mut found = BTreeSet::new();
        let mut queue = VecDeque::from([vec![from]]);
        while let Some(path) = queue.pop_front() {
            let Some(&last) = path.last() else { continue };
            if last == to {
                found.insert(path);
                continue;
            }
            for e in self.bigger.incident_edges(last).unwrap_or(&[]) {
                if self.selected.contains(e) {
                    continue;
                }
                let Some(edge) = self.bigger.edge(*e) else { continue };
                for &next in &edge.vertices {
                    if next == last || path.contains(&next) {
                        continue;
                    }
                    if self.owner.get(&next).is_some_and(|o| *o != sv) {
                        continue;
                    }
                    let mut longer = path.clone();
                    longer.push(next);
                    queue.push_back(longer);
                }
            }
        }
        found.into_iter().collect()
    }

    /// Picks one path per connection so that different owners stay disjoint,
    /// then checks that enough unclaimed vertices remain for the isolated ones.
    fn choose(
        &self,
        connections: &[(VertexId, Vec<Vec<VertexId>>)],
        idx: usize,
        claimed: &mut BTreeMap<VertexId, VertexId>,
    ) -> bool {
        let Some((sv, paths)) = connections.get(idx) else {
            return self.bigger.vertex_count() - claimed.len() >= self.isolated_needed;
        };
        for path in paths {
            let mut added = Vec::new();
            let mut clash = false;
            for &v in path {
                match claimed.get(&v) {
                    Some(o) if o == sv => {}
                    Some(_) => {
                        clash = true;
                        break;
                    }
                    None => {
                        claimed.insert(v, *sv);
                        added.push(v);
                    }
                }
            }
            if !clash && self.choose(connections, idx + 1, claimed) {
                return true;
            }
            for v in added {
                claimed.remove(&v);
            }
        }
        false
    }
}
