//! Core data structures for labeled hypergraphs.
//!
//! A hypergraph owns its vertices and edges. Every edge carries a string label
//! and an ordered sequence of incident vertices (a vertex may occur several
//! times). A reverse index from vertex to incident edges is maintained next to
//! the edge table; it holds one entry per incidence, so a self-loop contributes
//! its edge twice.
//!
//! Vertex and edge identifiers are minted from one per-graph counter and are
//! never reused. Copies (`Clone`) keep the identifiers verbatim.
//!
//! # Citations
//! - Hypergraphs: Berge, "Hypergraphs: Combinatorics of Finite Sets" (1989)
//! - Hyperedge replacement: Habel, "Hyperedge Replacement: Grammars and Languages" (1992)

use crate::error::{CoverError, CoverResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a vertex within one [`Hypergraph`].
///
/// # Invariant
/// - Unique within the owning graph; the owning graph never hands it out twice.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(u64);

impl VertexId {
    /// Creates a `VertexId` from a raw `u64`.
    ///
    /// Prefer [`Hypergraph::add_vertex`]; raw IDs are only meaningful for lookups.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` representation.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifier of an edge within one [`Hypergraph`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(u64);

impl EdgeId {
    /// Creates an `EdgeId` from a raw `u64`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` representation.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A vertex. Vertices carry no payload beyond their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
}

/// A labeled hyperedge with an ordered incidence sequence.
///
/// # Invariants
/// - Every entry of `vertices` names a vertex of the owning graph.
/// - The arity is `vertices.len()`; repeated entries are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub label: String,
    pub vertices: Vec<VertexId>,
}

impl Edge {
    /// Number of incidences of this edge.
    #[inline]
    pub fn arity(&self) -> usize {
        self.vertices.len()
    }

    /// Distinct incident vertices in order of first occurrence.
    pub fn distinct_vertices(&self) -> Vec<VertexId> {
        let mut seen = BTreeSet::new();
        self.vertices
            .iter()
            .copied()
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

/// A mutable labeled hypergraph.
///
/// # Invariants
/// - All edges refer to existing vertices.
/// - `incidence[v]` lists each edge once per occurrence of `v` in its sequence.
/// - `next_id` only increases; identifiers are never reused.
///
/// Iteration over vertices and edges is in ascending ID order, so every
/// search built on top of it enumerates candidates in a fixed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hypergraph {
    name: String,
    next_id: u64,
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    incidence: BTreeMap<VertexId, Vec<EdgeId>>,
}

impl Hypergraph {
    /// Creates a new, empty, unnamed hypergraph.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty hypergraph with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the (possibly empty, non-unique) name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn fresh_raw(&mut self) -> u64 {
        let raw = self.next_id;
        self.next_id += 1;
        raw
    }

    /// Inserts an isolated vertex with a fresh ID.
    pub fn add_vertex(&mut self) -> VertexId {
        let id = VertexId::new(self.fresh_raw());
        self.vertices.insert(id, Vertex { id });
        self.incidence.insert(id, Vec::new());
        id
    }

    /// Inserts `count` isolated vertices and returns their IDs in creation order.
    pub fn add_vertices(&mut self, count: usize) -> Vec<VertexId> {
        (0..count).map(|_| self.add_vertex()).collect()
    }

    /// Inserts an edge with the given label and incidence sequence.
    ///
    /// Fails with [`CoverError::InvalidInput`] if any incident vertex is absent.
    pub fn add_edge(
        &mut self,
        label: impl Into<String>,
        vertices: Vec<VertexId>,
    ) -> CoverResult<EdgeId> {
        if let Some(missing) = vertices.iter().find(|v| !self.vertices.contains_key(v)) {
            return Err(CoverError::invalid_input(format!(
                "edge refers to unknown vertex {missing}"
            )));
        }
        let id = EdgeId::new(self.fresh_raw());
        for v in &vertices {
            if let Some(list) = self.incidence.get_mut(v) {
                list.push(id);
            }
        }
        self.edges.insert(
            id,
            Edge {
                id,
                label: label.into(),
                vertices,
            },
        );
        Ok(id)
    }

    /// Removes an edge. Returns `false` if it did not exist.
    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        let Some(edge) = self.edges.remove(&id) else {
            return false;
        };
        for v in edge.distinct_vertices() {
            if let Some(list) = self.incidence.get_mut(&v) {
                list.retain(|e| *e != id);
            }
        }
        true
    }

    /// Removes a vertex together with all incident edges.
    ///
    /// Returns `false` if the vertex did not exist.
    pub fn delete_vertex(&mut self, id: VertexId) -> bool {
        self.delete_vertex_reporting(id).is_some()
    }

    /// Removes a vertex and reports the edges deleted along with it.
    ///
    /// Returns `None` if the vertex did not exist; otherwise the sorted,
    /// deduplicated list of cascaded edge IDs.
    pub fn delete_vertex_reporting(&mut self, id: VertexId) -> Option<Vec<EdgeId>> {
        if !self.vertices.contains_key(&id) {
            return None;
        }
        let mut cascaded = self.incidence.get(&id).cloned().unwrap_or_default();
        cascaded.sort();
        cascaded.dedup();
        for e in &cascaded {
            self.delete_edge(*e);
        }
        self.vertices.remove(&id);
        self.incidence.remove(&id);
        Some(cascaded)
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates vertex IDs in ascending order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys().copied()
    }

    /// Iterates edges in ascending ID order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Iterates edge IDs in ascending order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.keys().copied()
    }

    /// Looks up an edge.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Checks whether a vertex exists.
    #[inline]
    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Checks whether an edge exists.
    #[inline]
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    /// Incident edges of a vertex (one entry per incidence), or `None` if absent.
    #[inline]
    pub fn incident_edges(&self, id: VertexId) -> Option<&[EdgeId]> {
        self.incidence.get(&id).map(Vec::as_slice)
    }

    /// Number of incidences at a vertex; `0` for absent vertices.
    pub fn degree(&self, id: VertexId) -> usize {
        self.incidence.get(&id).map_or(0, Vec::len)
    }

    /// Edge arity, or `None` if the edge does not exist (distinct from arity zero).
    #[inline]
    pub fn arity(&self, id: EdgeId) -> Option<usize> {
        self.edges.get(&id).map(Edge::arity)
    }

    /// Largest edge arity, `0` for edgeless graphs.
    pub fn max_arity(&self) -> usize {
        self.edges.values().map(Edge::arity).max().unwrap_or(0)
    }

    /// Whether the vertex exists and has no incident edge.
    pub fn is_isolated(&self, id: VertexId) -> bool {
        self.incidence.get(&id).is_some_and(Vec::is_empty)
    }

    /// Iterates vertices without incident edges.
    pub fn isolated_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.incidence
            .iter()
            .filter(|(_, edges)| edges.is_empty())
            .map(|(v, _)| *v)
    }

    /// Sorted set of edge labels occurring in the graph.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.edges.values().map(|e| e.label.as_str()).collect()
    }

    /// Recomputes the reverse index and compares it with the stored one.
    pub fn is_consistent(&self) -> bool {
        let mut expected: BTreeMap<VertexId, Vec<EdgeId>> =
            self.vertices.keys().map(|v| (*v, Vec::new())).collect();
        for edge in self.edges.values() {
            for v in &edge.vertices {
                match expected.get_mut(v) {
                    Some(list) => list.push(edge.id),
                    None => return false,
                }
            }
        }
        if expected.len() != self.incidence.len() {
            return false;
        }
        expected.iter_mut().all(|(v, list)| {
            let Some(stored) = self.incidence.get(v) else {
                return false;
            };
            let mut stored = stored.clone();
            stored.sort();
            list.sort();
            stored == *list
        })
    }

    /// Rewrites every incidence of `from` to `into` and drops `from`.
    ///
    /// Both vertices must exist and differ; callers validate.
    pub(crate) fn redirect_vertex_raw(&mut self, from: VertexId, into: VertexId) {
        let moved = self.incidence.remove(&from).unwrap_or_default();
        let mut touched = moved.clone();
        touched.sort();
        touched.dedup();
        for e in touched {
            if let Some(edge) = self.edges.get_mut(&e) {
                for v in edge.vertices.iter_mut() {
                    if *v == from {
                        *v = into;
                    }
                }
            }
        }
        if let Some(list) = self.incidence.get_mut(&into) {
            list.extend(moved);
        }
        self.vertices.remove(&from);
    }
}

impl fmt::Display for Hypergraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() { "<unnamed>" } else { &self.name };
        write!(f, "{name} [")?;
        let mut first = true;
        for v in self.isolated_vertices() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{v}")?;
        }
        for edge in self.edges.values() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{}(", edge.label)?;
            for (i, v) in edge.vertices.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{v}")?;
            }
            write!(f, ")")?;
        }
        write!(f, "]")
    }
}
