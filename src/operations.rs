//! Merge and gluing operations on hypergraphs.
//!
//! The primitive mutators (`add_vertex`, `add_edge`, deletions) live on
//! [`Hypergraph`] itself. This module adds the operations used during rule
//! application and order checking: vertex and edge merges, parallel-edge
//! tests, and disjoint copying of one graph into another.
//!
//! All merges validate their arguments and fail with
//! [`CoverError::InvalidInput`] on unknown IDs, except the trivial cases
//! (single-element sets, merging an element with itself) which return the
//! sole ID unchanged.
//!
//! # Citations
//! - Edge contraction: Diestel, "Graph Theory", Section 1.7 (2017)
//! - Gluing as pushout: Ehrig et al., "Fundamentals of Algebraic Graph Transformation", Chapter 2 (2006)

use crate::core::{EdgeId, Hypergraph, VertexId};
use crate::error::{CoverError, CoverResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping of vertices and edges from one graph into another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morphism {
    pub vertices: BTreeMap<VertexId, VertexId>,
    pub edges: BTreeMap<EdgeId, EdgeId>,
}

impl Morphism {
    /// Creates an empty morphism.
    pub fn new() -> Self {
        Self::default()
    }

    /// Image of a vertex, if mapped.
    #[inline]
    pub fn vertex(&self, v: VertexId) -> Option<VertexId> {
        self.vertices.get(&v).copied()
    }

    /// Image of an edge, if mapped.
    #[inline]
    pub fn edge(&self, e: EdgeId) -> Option<EdgeId> {
        self.edges.get(&e).copied()
    }

    /// Whether no vertex or edge is mapped.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }
}

/// Merges vertex `b` into vertex `a` and returns `a`.
///
/// Every incidence of `b` is redirected to `a` (edges are updated in place),
/// then `b` is removed.
pub fn merge_vertices(graph: &mut Hypergraph, a: VertexId, b: VertexId) -> CoverResult<VertexId> {
    if a == b {
        return Ok(a);
    }
    for v in [a, b] {
        if !graph.contains_vertex(v) {
            return Err(CoverError::invalid_input(format!("cannot merge unknown vertex {v}")));
        }
    }
    graph.redirect_vertex_raw(b, a);
    Ok(a)
}

/// Merges a set of vertices into its first element by pairwise folding.
pub fn merge_vertex_set(graph: &mut Hypergraph, ids: &[VertexId]) -> CoverResult<VertexId> {
    match ids {
        [] => Err(CoverError::invalid_input("cannot merge an empty vertex set")),
        [only] => Ok(*only),
        [first, rest @ ..] => rest
            .iter()
            .try_fold(*first, |acc, v| merge_vertices(graph, acc, *v)),
    }
}

/// Merges edge `b` into edge `a` and returns `a`.
///
/// Labels and arities must agree. Incident vertices are merged positionally,
/// then `b` is deleted.
pub fn merge_edges(graph: &mut Hypergraph, a: EdgeId, b: EdgeId) -> CoverResult<EdgeId> {
    if a == b {
        return Ok(a);
    }
    let (ea, eb) = match (graph.edge(a), graph.edge(b)) {
        (Some(ea), Some(eb)) => (ea, eb),
        _ => {
            return Err(CoverError::invalid_input(format!(
                "cannot merge unknown edge ({a} or {b})"
            )))
        }
    };
    if ea.label != eb.label || ea.arity() != eb.arity() {
        return Err(CoverError::invalid_input(format!(
            "cannot merge {}/{} with {}/{}",
            ea.label,
            ea.arity(),
            eb.label,
            eb.arity()
        )));
    }
    let arity = ea.arity();
    for pos in 0..arity {
        // Earlier merges may have rewritten either sequence; re-read each slot.
        let (va, vb) = match (graph.edge(a), graph.edge(b)) {
            (Some(ea), Some(eb)) => (ea.vertices[pos], eb.vertices[pos]),
            _ => return Err(CoverError::invalid_state("edge vanished during merge")),
        };
        merge_vertices(graph, va, vb)?;
    }
    graph.delete_edge(b);
    Ok(a)
}

/// Merges a set of edges into its first element by pairwise folding.
pub fn merge_edge_set(graph: &mut Hypergraph, ids: &[EdgeId]) -> CoverResult<EdgeId> {
    match ids {
        [] => Err(CoverError::invalid_input("cannot merge an empty edge set")),
        [only] => Ok(*only),
        [first, rest @ ..] => rest
            .iter()
            .try_fold(*first, |acc, e| merge_edges(graph, acc, *e)),
    }
}

/// Whether two edges share label and the exact incidence sequence.
pub fn are_parallel_edges(graph: &Hypergraph, a: EdgeId, b: EdgeId) -> CoverResult<bool> {
    match (graph.edge(a), graph.edge(b)) {
        (Some(ea), Some(eb)) => Ok(ea.label == eb.label && ea.vertices == eb.vertices),
        _ => Err(CoverError::invalid_input(format!(
            "parallel check on unknown edge ({a} or {b})"
        ))),
    }
}

/// Copies every element of `source` into `target` under fresh IDs.
///
/// Returns the embedding of `source` into `target`.
pub fn copy_into(target: &mut Hypergraph, source: &Hypergraph) -> CoverResult<Morphism> {
    copy_into_glued(target, source, &BTreeMap::new())
}

/// Copies `source` into `target`, identifying the vertices in `glue`
/// (source vertex to existing target vertex) instead of creating them.
pub fn copy_into_glued(
    target: &mut Hypergraph,
    source: &Hypergraph,
    glue: &BTreeMap<VertexId, VertexId>,
) -> CoverResult<Morphism> {
    let mut morphism = Morphism::new();
    for v in source.vertices() {
        let image = match glue.get(&v) {
            Some(existing) if target.contains_vertex(*existing) => *existing,
            Some(existing) => {
                return Err(CoverError::invalid_input(format!(
                    "glue target {existing} does not exist"
                )))
            }
            None => target.add_vertex(),
        };
        morphism.vertices.insert(v, image);
    }
    for edge in source.edges() {
        let incident = edge
            .vertices
            .iter()
            .map(|v| morphism.vertices[v])
            .collect();
        let image = target.add_edge(edge.label.clone(), incident)?;
        morphism.edges.insert(edge.id, image);
    }
    Ok(morphism)
}
