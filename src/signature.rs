//! Signatures and digests for hypergraphs.
//!
//! Two kinds of fingerprints live here:
//! - [`create_signature`]: an iteratively refined per-element fingerprint
//!   ([`PartSig`]) in the spirit of Weisfeiler–Lehman refinement. It is
//!   invariant under isomorphism and is used to prune the isomorphism search.
//!   Equal signatures never prove isomorphism.
//! - [`graph_fingerprint`]: a SHA-256 digest of a graph's concrete
//!   representation, used to cross-reference graphs in search logs.
//!
//! # Citations
//! - Weisfeiler & Lehman, "A reduction of a graph to a canonical form" (1968)
//! - SHA-256: NIST FIPS 180-4 (2015)

use crate::core::{EdgeId, Hypergraph, VertexId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// A 256-bit hash value.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashValue(pub [u8; 32]);

impl HashValue {
    /// Creates a zero hash (all zeros).
    #[inline]
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns the raw byte array.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes SHA-256 of `data` with domain separation.
    ///
    /// Input is `b"GTS:<domain>:v1" || len(data) as u64 LE || data`.
    pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"GTS:");
        hasher.update(domain);
        hasher.update(b":v1");
        hasher.update((data.len() as u64).to_le_bytes());
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// First four bytes as a little-endian `u32`.
    #[inline]
    pub fn truncate_u32(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl std::fmt::Display for HashValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}…",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// Per-element fingerprint.
pub type PartSig = u32;

/// Seed fingerprint of an edge label.
pub fn label_seed(label: &str) -> PartSig {
    HashValue::hash_with_domain(b"EDGE_LABEL", label.as_bytes()).truncate_u32()
}

/// Refined fingerprints of every vertex and edge of one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HgSignature {
    pub vertices: BTreeMap<VertexId, PartSig>,
    pub edges: BTreeMap<EdgeId, PartSig>,
}

impl HgSignature {
    #[inline]
    pub fn vertex(&self, v: VertexId) -> Option<PartSig> {
        self.vertices.get(&v).copied()
    }

    #[inline]
    pub fn edge(&self, e: EdgeId) -> Option<PartSig> {
        self.edges.get(&e).copied()
    }

    /// Groups edge IDs by fingerprint (ascending IDs inside each bucket).
    pub fn edge_buckets(&self) -> BTreeMap<PartSig, Vec<EdgeId>> {
        let mut buckets: BTreeMap<PartSig, Vec<EdgeId>> = BTreeMap::new();
        for (e, sig) in &self.edges {
            buckets.entry(*sig).or_default().push(*e);
        }
        buckets
    }

    fn distinct_values(&self) -> usize {
        self.vertices
            .values()
            .chain(self.edges.values())
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Coarse, graph-level summary: element counts plus the sum of all fingerprints.
///
/// Graphs with different vertex or edge counts never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphSignature {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub digest: PartSig,
}

fn mix_edge(seed: PartSig, previous: PartSig, incident: impl Iterator<Item = PartSig>) -> PartSig {
    let rot = seed % 31 + 1;
    let mut acc = previous.rotate_left(rot) ^ seed;
    for sig in incident {
        acc = (acc.rotate_left(rot) ^ sig).wrapping_mul(0x9E37_79B1);
    }
    acc
}

/// Computes refined fingerprints for all elements of `graph`.
///
/// Vertices start at `1`, edges at the hash of their label. Each round a vertex
/// adds the previous fingerprints of its incident edges (once per incidence),
/// and an edge mixes its previous fingerprint with the previous fingerprints of
/// its incident vertices in sequence order. Refinement stops as soon as the
/// number of distinct fingerprint values stops growing.
pub fn create_signature(graph: &Hypergraph) -> (HgSignature, GraphSignature) {
    let mut seeds: BTreeMap<&str, PartSig> = BTreeMap::new();
    for edge in graph.edges() {
        seeds
            .entry(edge.label.as_str())
            .or_insert_with(|| label_seed(&edge.label));
    }

    let mut current = HgSignature {
        vertices: graph.vertices().map(|v| (v, 1)).collect(),
        edges: graph
            .edges()
            .map(|e| (e.id, seeds[e.label.as_str()]))
            .collect(),
    };
    let mut distinct = current.distinct_values();

    loop {
        let mut next = HgSignature::default();
        for v in graph.vertices() {
            let own = current.vertices[&v];
            let sum = graph
                .incident_edges(v)
                .unwrap_or(&[])
                .iter()
                .fold(own, |acc, e| acc.wrapping_add(current.edges[e]));
            next.vertices.insert(v, sum);
        }
        for edge in graph.edges() {
            let sig = mix_edge(
                seeds[edge.label.as_str()],
                current.edges[&edge.id],
                edge.vertices.iter().map(|v| current.vertices[v]),
            );
            next.edges.insert(edge.id, sig);
        }
        let refined = next.distinct_values();
        current = next;
        if refined <= distinct {
            break;
        }
        distinct = refined;
    }

    let digest = current
        .vertices
        .values()
        .chain(current.edges.values())
        .fold(0u32, |acc, s| acc.wrapping_add(*s));
    let summary = GraphSignature {
        vertex_count: graph.vertex_count(),
        edge_count: graph.edge_count(),
        digest,
    };
    (current, summary)
}

/// Representation-sensitive SHA-256 digest of a graph.
///
/// Covers vertex IDs, edge labels and incidence sequences in ascending ID
/// order. Renaming IDs changes the digest even for isomorphic graphs; use it
/// to cross-reference concrete graphs, not to compare structure.
pub fn graph_fingerprint(graph: &Hypergraph) -> HashValue {
    let mut data = Vec::new();
    data.extend_from_slice(&(graph.vertex_count() as u64).to_le_bytes());
    for v in graph.vertices() {
        data.extend_from_slice(&v.as_u64().to_le_bytes());
    }
    data.extend_from_slice(&(graph.edge_count() as u64).to_le_bytes());
    for edge in graph.edges() {
        data.extend_from_slice(&edge.id.as_u64().to_le_bytes());
        data.extend_from_slice(&(edge.label.len() as u64).to_le_bytes());
        data.extend_from_slice(edge.label.as_bytes());
        data.extend_from_slice(&(edge.arity() as u64).to_le_bytes());
        for v in &edge.vertices {
            data.extend_from_slice(&v.as_u64().to_le_bytes());
        }
    }
    HashValue::hash_with_domain(b"GRAPH_FINGERPRINT", &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(labels: &[&str]) -> Hypergraph {
        let mut g = Hypergraph::new();
        let mut prev = g.add_vertex();
        for label in labels {
            let next = g.add_vertex();
            g.add_edge(*label, vec![prev, next]).unwrap();
            prev = next;
        }
        g
    }

    #[test]
    fn isomorphic_graphs_share_summary() {
        let g1 = path(&["A", "B", "A"]);
        // Same shape built back to front.
        let mut g2 = Hypergraph::new();
        let vs = g2.add_vertices(4);
        g2.add_edge("A", vec![vs[2], vs[3]]).unwrap();
        g2.add_edge("B", vec![vs[1], vs[2]]).unwrap();
        g2.add_edge("A", vec![vs[0], vs[1]]).unwrap();
        assert_eq!(create_signature(&g1).1, create_signature(&g2).1);
    }

    #[test]
    fn different_counts_never_share_summary() {
        let (_, s1) = create_signature(&path(&["A"]));
        let (_, s2) = create_signature(&path(&["A", "A"]));
        assert_ne!(s1, s2);
        let mut with_isolated = path(&["A"]);
        with_isolated.add_vertex();
        assert_ne!(s1, create_signature(&with_isolated).1);
    }

    #[test]
    fn incidence_order_matters() {
        let mut g = Hypergraph::new();
        let [a, b, c] = [g.add_vertex(), g.add_vertex(), g.add_vertex()];
        let loose = g.add_edge("T", vec![a, b, c]).unwrap();
        let tied = g.add_edge("T", vec![a, a, c]).unwrap();
        let (sig, _) = create_signature(&g);
        assert_ne!(sig.edge(loose), sig.edge(tied));
    }

    #[test]
    fn isolated_vertices_keep_seed() {
        let mut g = path(&["A"]);
        let lonely = g.add_vertex();
        let (sig, _) = create_signature(&g);
        assert_eq!(sig.vertex(lonely), Some(1));
    }

    #[test]
    fn fingerprint_is_representation_sensitive() {
        let g1 = path(&["A"]);
        let mut g2 = Hypergraph::new();
        g2.add_vertex();
        let a = g2.add_vertex();
        let b = g2.add_vertex();
        g2.delete_vertex(VertexId::new(0));
        g2.add_edge("A", vec![a, b]).unwrap();
        assert_ne!(graph_fingerprint(&g1), graph_fingerprint(&g2));
        assert_eq!(graph_fingerprint(&g1), graph_fingerprint(&g1.clone()));
    }
}
