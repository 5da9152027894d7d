//! Isomorphism and embedding search.
//!
//! Both searches map the edges of a source graph one at a time onto candidate
//! edges of a target graph, extending a partial vertex bijection held in a
//! forward and a backward map. Every tentative pairing is written to an undo
//! log owned by the current search frame and rolled back when the branch fails.
//!
//! - Isomorphism: candidates are pre-bucketed by refined signature
//!   ([`create_signature`]), and paired vertices must carry equal signatures.
//! - Embedding: candidates are all target edges with the same label and arity;
//!   the target may have extra elements.
//!
//! The search is driven by edges. Vertices without incident edges carry no
//! structure (no label, seed signature `1`) and are paired after the edge
//! search succeeds.
//!
//! # Citations
//! - Colour refinement: Weisfeiler & Leman, "The reduction of a graph to canonical form" (1968)
//! - Subgraph isomorphism: Ullmann, "An algorithm for subgraph isomorphism" (1976)

use crate::core::{EdgeId, Hypergraph, VertexId};
use crate::operations::Morphism;
use crate::signature::{create_signature, HgSignature};
use std::collections::{BTreeMap, BTreeSet};

/// Tentative pairing recorded for rollback (keyed by the source element).
#[derive(Debug, Clone, Copy)]
enum Undo {
    Vertex(VertexId),
    Edge(EdgeId),
}

struct EdgeMatcher<'a> {
    source: &'a Hypergraph,
    target: &'a Hypergraph,
    /// Source edges in search order, each with its candidate target edges.
    plan: Vec<(EdgeId, Vec<EdgeId>)>,
    signatures: Option<(&'a HgSignature, &'a HgSignature)>,
    forward: BTreeMap<VertexId, VertexId>,
    backward: BTreeMap<VertexId, VertexId>,
    edges: BTreeMap<EdgeId, EdgeId>,
    used_edges: BTreeSet<EdgeId>,
}

impl<'a> EdgeMatcher<'a> {
    fn new(
        source: &'a Hypergraph,
        target: &'a Hypergraph,
        mut plan: Vec<(EdgeId, Vec<EdgeId>)>,
        signatures: Option<(&'a HgSignature, &'a HgSignature)>,
    ) -> Self {
        // Most constrained edges first; ties keep ascending ID order.
        plan.sort_by_key(|(e, cands)| (cands.len(), *e));
        Self {
            source,
            target,
            plan,
            signatures,
            forward: BTreeMap::new(),
            backward: BTreeMap::new(),
            edges: BTreeMap::new(),
            used_edges: BTreeSet::new(),
        }
    }

    fn search(&mut self, depth: usize) -> bool {
        if depth == self.plan.len() {
            return true;
        }
        let (e1, candidates) = self.plan[depth].clone();
        for e2 in candidates {
            if self.used_edges.contains(&e2) {
                continue;
            }
            let mut undo = Vec::new();
            if self.pair_edge(e1, e2, &mut undo) && self.search(depth + 1) {
                return true;
            }
            self.rollback(undo);
        }
        false
    }

    fn pair_edge(&mut self, e1: EdgeId, e2: EdgeId, undo: &mut Vec<Undo>) -> bool {
        let (source, target) = (self.source, self.target);
        let (Some(s), Some(t)) = (source.edge(e1), target.edge(e2)) else {
            return false;
        };
        if s.label != t.label || s.arity() != t.arity() {
            return false;
        }
        for (&v1, &v2) in s.vertices.iter().zip(&t.vertices) {
            match self.forward.get(&v1) {
                Some(mapped) if *mapped == v2 => continue,
                Some(_) => return false,
                None => {
                    if self.backward.contains_key(&v2) {
                        return false;
                    }
                    if let Some((sig1, sig2)) = self.signatures {
                        if sig1.vertex(v1) != sig2.vertex(v2) {
                            return false;
                        }
                    }
                    self.forward.insert(v1, v2);
                    self.backward.insert(v2, v1);
                    undo.push(Undo::Vertex(v1));
                }
            }
        }
        self.edges.insert(e1, e2);
        self.used_edges.insert(e2);
        undo.push(Undo::Edge(e1));
        true
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for step in undo.into_iter().rev() {
            match step {
                Undo::Vertex(v1) => {
                    if let Some(v2) = self.forward.remove(&v1) {
                        self.backward.remove(&v2);
                    }
                }
                Undo::Edge(e1) => {
                    if let Some(e2) = self.edges.remove(&e1) {
                        self.used_edges.remove(&e2);
                    }
                }
            }
        }
    }

    /// Pairs the source vertices untouched by edges with unused target vertices.
    fn close_vertices(mut self) -> Option<Morphism> {
        let mut free = self
            .target
            .vertices()
            .filter(|v| !self.backward.contains_key(v));
        for v1 in self.source.vertices() {
            if self.forward.contains_key(&v1) {
                continue;
            }
            let v2 = free.next()?;
            self.forward.insert(v1, v2);
        }
        Some(Morphism {
            vertices: self.forward,
            edges: self.edges,
        })
    }
}

/// Whether `g1` and `g2` are isomorphic (label- and incidence-preserving bijection).
pub fn are_isomorphic(g1: &Hypergraph, g2: &Hypergraph) -> bool {
    find_isomorphism(g1, g2).is_some()
}

/// Finds an isomorphism from `g1` onto `g2`, if one exists.
pub fn find_isomorphism(g1: &Hypergraph, g2: &Hypergraph) -> Option<Morphism> {
    if g1.vertex_count() != g2.vertex_count() || g1.edge_count() != g2.edge_count() {
        return None;
    }
    let (sig1, summary1) = create_signature(g1);
    let (sig2, summary2) = create_signature(g2);
    if summary1 != summary2 {
        return None;
    }
    let buckets1 = sig1.edge_buckets();
    let buckets2 = sig2.edge_buckets();
    if buckets1.len() != buckets2.len()
        || buckets1
            .iter()
            .any(|(sig, es)| buckets2.get(sig).map(Vec::len) != Some(es.len()))
    {
        return None;
    }
    let plan = g1
        .edge_ids()
        .map(|e| {
            let sig = sig1.edges[&e];
            (e, buckets2.get(&sig).cloned().unwrap_or_default())
        })
        .collect();
    let mut matcher = EdgeMatcher::new(g1, g2, plan, Some((&sig1, &sig2)));
    if !matcher.search(0) {
        return None;
    }
    matcher.close_vertices()
}

/// Finds an injective, label- and incidence-preserving embedding of
/// `smaller` into `bigger` (not necessarily induced).
pub fn find_embedding(smaller: &Hypergraph, bigger: &Hypergraph) -> Option<Morphism> {
    if smaller.vertex_count() > bigger.vertex_count() || smaller.edge_count() > bigger.edge_count() {
        return None;
    }
    let mut by_shape: BTreeMap<(&str, usize), Vec<EdgeId>> = BTreeMap::new();
    for edge in bigger.edges() {
        by_shape
            .entry((edge.label.as_str(), edge.arity()))
            .or_default()
            .push(edge.id);
    }
    let mut plan = Vec::with_capacity(smaller.edge_count());
    for edge in smaller.edges() {
        let candidates = by_shape
            .get(&(edge.label.as_str(), edge.arity()))
            .cloned()
            .unwrap_or_default();
        if candidates.is_empty() {
            return None;
        }
        plan.push((edge.id, candidates));
    }
    let mut matcher = EdgeMatcher::new(smaller, bigger, plan, None);
    if !matcher.search(0) {
        return None;
    }
    matcher.close_vertices()
}
