//! Partition-based minor order.
//!
//! `smaller ≤ bigger` holds when `bigger` turns into `smaller` by deleting
//! edges, contracting (possibly only partially) hyperedges and deleting
//! vertices. The search has two layers:
//!
//! 1. Pick an injective assignment of `smaller`'s edges to same-shaped edges
//!    of `bigger`, one [`Selection`] per `(label, arity)` group, advanced as an
//!    odometer across groups. Positional incidence forces a partial map from
//!    `bigger`'s vertices onto `smaller`'s.
//! 2. Every remaining edge of `bigger` is deleted or contracted. Each one gets
//!    an [`IdPartitionEnumerator`] over its distinct vertices; the chosen
//!    partitions are closed transitively in a union-find. A combination is a
//!    witness when no block carries two different targets, every target is
//!    reached by exactly one block, and enough untargeted blocks remain to
//!    stand in for `smaller`'s isolated vertices.
//!
//! A union that clashes at enumerator `k`, position `p` fails for every
//! combination sharing that prefix, so the enumerators skip straight past it.

use super::combinatorics::{IdPartitionEnumerator, Selection};
use super::{may_fit, Order};
use crate::core::{EdgeId, Hypergraph, VertexId};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// The (hyper)graph minor order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinorOrder;

impl Order for MinorOrder {
    fn is_less_or_eq(&self, smaller: &Hypergraph, bigger: &Hypergraph) -> bool {
        if !may_fit(smaller, bigger) {
            return false;
        }
        MinorSearch::new(smaller, bigger).run()
    }

    fn name(&self) -> &'static str {
        "minor"
    }

    fn contracts(&self) -> bool {
        true
    }
}

struct Group {
    small: Vec<EdgeId>,
    big: Vec<EdgeId>,
    selection: Selection,
}

struct MinorSearch<'a> {
    smaller: &'a Hypergraph,
    bigger: &'a Hypergraph,
    groups: Vec<Group>,
    isolated_needed: usize,
}

impl<'a> MinorSearch<'a> {
    fn new(smaller: &'a Hypergraph, bigger: &'a Hypergraph) -> Self {
        let mut shapes: BTreeMap<(&str, usize), (Vec<EdgeId>, Vec<EdgeId>)> = BTreeMap::new();
        for edge in smaller.edges() {
            shapes
                .entry((edge.label.as_str(), edge.arity()))
                .or_default()
                .0
                .push(edge.id);
        }
        for edge in bigger.edges() {
            if let Some(entry) = shapes.get_mut(&(edge.label.as_str(), edge.arity())) {
                entry.1.push(edge.id);
            }
        }
        let groups = shapes
            .into_values()
            .map(|(small, big)| Group {
                selection: Selection::new(big.len(), small.len()),
                small,
                big,
            })
            .collect();
        Self {
            smaller,
            bigger,
            groups,
            isolated_needed: smaller.isolated_vertices().count(),
        }
    }

    fn run(&mut self) -> bool {
        if self.groups.iter().any(|g| g.selection.ended()) {
            return false;
        }
        loop {
            if let Some((forced, selected)) = self.forced_map() {
                if self.contract_rest(&forced, &selected) {
                    return true;
                }
            }
            if !self.next_assignment() {
                return false;
            }
        }
    }

    fn next_assignment(&mut self) -> bool {
        for group in self.groups.iter_mut().rev() {
            if group.selection.advance() {
                return true;
            }
            group.selection.reset();
        }
        false
    }

    /// Vertex map forced by the current edge assignment, or `None` when one
    /// `bigger` vertex would have to become two different `smaller` vertices.
    fn forced_map(&self) -> Option<(BTreeMap<VertexId, VertexId>, BTreeSet<EdgeId>)> {
        let mut forced = BTreeMap::new();
        let mut selected = BTreeSet::new();
        for group in &self.groups {
            for (s_edge, &idx) in group.small.iter().zip(group.selection.current()) {
                let b_edge = group.big[idx];
                selected.insert(b_edge);
                let (s, b) = (self.smaller.edge(*s_edge)?, self.bigger.edge(b_edge)?);
                for (&sv, &bv) in s.vertices.iter().zip(&b.vertices) {
                    match forced.entry(bv) {
                        Entry::Vacant(slot) => {
                            slot.insert(sv);
                        }
                        Entry::Occupied(slot) if *slot.get() != sv => return None,
                        Entry::Occupied(_) => {}
                    }
                }
            }
        }
        Some((forced, selected))
    }

    /// Searches deletions/contractions of the unselected edges that realise
    /// the forced map.
    fn contract_rest(
        &self,
        forced: &BTreeMap<VertexId, VertexId>,
        selected: &BTreeSet<EdgeId>,
    ) -> bool {
        let mut preimages: BTreeMap<VertexId, usize> = BTreeMap::new();
        for sv in forced.values() {
            *preimages.entry(*sv).or_insert(0) += 1;
        }
        if preimages.values().all(|n| *n == 1) {
            // Deleting every other edge keeps the most untargeted vertices.
            return self.bigger.vertex_count() - forced.len() >= self.isolated_needed;
        }

        let mut enums: Vec<IdPartitionEnumerator<VertexId>> = self
            .bigger
            .edges()
            .filter(|e| !selected.contains(&e.id))
            .map(|e| e.distinct_vertices())
            .filter(|ids| ids.len() >= 2)
            .map(IdPartitionEnumerator::new)
            .collect();

        loop {
            let mut blocks = Contraction::new(forced);
            let mut clash = None;
            'apply: for (k, parts) in enums.iter().enumerate() {
                for pos in 1..parts.ids().len() {
                    let rep = parts.representative(pos);
                    if rep != pos && !blocks.union(parts.ids()[rep], parts.ids()[pos]) {
                        clash = Some((k, pos));
                        break 'apply;
                    }
                }
            }
            let (k, pos) = match clash {
                Some(at) => at,
                None if blocks.realises(self.bigger, forced, self.isolated_needed) => return true,
                None => match enums.len().checked_sub(1) {
                    Some(last) => (last, usize::MAX),
                    None => return false,
                },
            };
            if !skip_ahead(&mut enums, k, pos) {
                return false;
            }
        }
    }
}

/// Advances enumerator `k` past prefix `..=pos`, carrying into earlier
/// enumerators on exhaustion and restarting every later one.
fn skip_ahead(enums: &mut [IdPartitionEnumerator<VertexId>], mut k: usize, mut pos: usize) -> bool {
    loop {
        if enums[k].advance_at(pos) {
            for later in &mut enums[k + 1..] {
                later.reset_from(0);
            }
            return true;
        }
        if k == 0 {
            return false;
        }
        k -= 1;
        pos = usize::MAX;
    }
}

/// Union-find over `bigger`'s vertices, tracking the `smaller` vertex each
/// block is forced onto.
struct Contraction {
    parent: BTreeMap<VertexId, VertexId>,
    target: BTreeMap<VertexId, VertexId>,
}

impl Contraction {
    fn new(forced: &BTreeMap<VertexId, VertexId>) -> Self {
        Self {
            parent: BTreeMap::new(),
            target: forced.clone(),
        }
    }

    fn find(&mut self, v: VertexId) -> VertexId {
        let mut root = v;
        while let Some(&up) = self.parent.get(&root) {
            root = up;
        }
        let mut cur = v;
        while let Some(&up) = self.parent.get(&cur) {
            if up == root {
                break;
            }
            self.parent.insert(cur, root);
            cur = up;
        }
        root
    }

    /// Joins the blocks of `a` and `b`; `false` if they target different vertices.
    fn union(&mut self, a: VertexId, b: VertexId) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return true;
        }
        if let (Some(x), Some(y)) = (self.target.get(&ra), self.target.get(&rb)) {
            if x != y {
                return false;
            }
        }
        self.parent.insert(rb, ra);
        if let Some(t) = self.target.remove(&rb) {
            self.target.insert(ra, t);
        }
        true
    }

    fn realises(
        &mut self,
        bigger: &Hypergraph,
        forced: &BTreeMap<VertexId, VertexId>,
        isolated_needed: usize,
    ) -> bool {
        let mut block_of: BTreeMap<VertexId, VertexId> = BTreeMap::new();
        for (&bv, &sv) in forced {
            let root = self.find(bv);
            match block_of.entry(sv) {
                Entry::Vacant(slot) => {
                    slot.insert(root);
                }
                Entry::Occupied(slot) if *slot.get() != root => return false,
                Entry::Occupied(_) => {}
            }
        }
        let mut free = BTreeSet::new();
        for v in bigger.vertices() {
            let root = self.find(v);
            if !self.target.contains_key(&root) {
                free.insert(root);
            }
        }
        free.len() >= isolated_needed
    }
}
