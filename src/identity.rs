//! Identified hypergraphs.
//!
//! During a search every graph that enters the antichain or the worklist gets a
//! [`GraphId`] unique for the whole run. IDs come from a [`GraphIdAllocator`]
//! owned by the search context and are never reset mid-run. Copying an
//! identified graph always mints a new ID, unlike vertex and edge IDs, which
//! are copied verbatim.

use crate::core::Hypergraph;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Run-wide identity of a hypergraph.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(u64);

impl GraphId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`GraphId`]s.
#[derive(Debug, Default)]
pub struct GraphIdAllocator {
    next: u64,
}

impl GraphIdAllocator {
    /// Creates an allocator starting at ID 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh, never-before-issued ID.
    pub fn fresh(&mut self) -> GraphId {
        let id = GraphId(self.next);
        self.next += 1;
        id
    }

    /// Wraps a graph with a fresh identity.
    pub fn identify(&mut self, graph: Hypergraph) -> IdHypergraph {
        IdHypergraph {
            id: self.fresh(),
            graph,
        }
    }

    /// Deep copy of an identified graph under a new identity.
    pub fn copy(&mut self, source: &IdHypergraph) -> IdHypergraph {
        self.identify(source.graph.clone())
    }

    /// Number of IDs issued so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// A hypergraph paired with its run-wide identity.
///
/// Deliberately not `Clone`: use [`GraphIdAllocator::copy`].
#[derive(Debug)]
pub struct IdHypergraph {
    id: GraphId,
    graph: Hypergraph,
}

impl IdHypergraph {
    /// The run-wide identity.
    #[inline]
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Borrows the underlying graph.
    #[inline]
    pub fn graph(&self) -> &Hypergraph {
        &self.graph
    }

    /// Unwraps the underlying graph, dropping the identity.
    pub fn into_graph(self) -> Hypergraph {
        self.graph
    }

    /// Gives the graph the name `graph_<id>` if it is still unnamed.
    pub fn ensure_default_name(&mut self) {
        if self.graph.name().is_empty() {
            self.graph.set_name(format!("graph_{}", self.id.as_u64()));
        }
    }
}

impl Deref for IdHypergraph {
    type Target = Hypergraph;

    fn deref(&self) -> &Hypergraph {
        &self.graph
    }
}

impl DerefMut for IdHypergraph {
    fn deref_mut(&mut self) -> &mut Hypergraph {
        &mut self.graph
    }
}
