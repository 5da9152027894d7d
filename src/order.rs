//! Well-quasi-orders over hypergraphs.
//!
//! An order decides `smaller ≤ bigger` without side effects. The backward
//! search uses it twice: to keep the set of found graphs an antichain, and to
//! test whether an initial graph covers a newly found one.
//!
//! - [`SubgraphOrder`]: `smaller` embeds injectively into `bigger`.
//! - [`MinorOrder`]: `smaller` is obtained from `bigger` by deleting and
//!   contracting edges and deleting vertices (partition-based search).
//! - [`PathMinorOrder`]: the older path-based minor test for graphs whose
//!   edges have arity at most two.
//!
//! # Citations
//! - Robertson & Seymour, "Graph Minors XX. Wagner's conjecture" (2004)
//! - Abdulla et al., "General decidability theorems for infinite-state systems" (1996)
//! - König & Stückrath, "Well-structured graph transformation systems" (2017)

mod combinatorics;
mod minor;
mod paths;
mod subgraph;

pub use combinatorics::{IdPartitionEnumerator, Selection};
pub use minor::MinorOrder;
pub use paths::PathMinorOrder;
pub use subgraph::SubgraphOrder;

use crate::core::Hypergraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A decidable quasi-order on hypergraphs.
pub trait Order {
    /// Whether `smaller ≤ bigger`.
    fn is_less_or_eq(&self, smaller: &Hypergraph, bigger: &Hypergraph) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether `smaller ≤ bigger` may hold through edge contraction, so that
    /// backward steps have to consider split vertices too.
    fn contracts(&self) -> bool {
        false
    }
}

/// Configuration-time choice of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Subgraph,
    #[default]
    Minor,
    PathMinor,
}

impl OrderKind {
    /// Instantiates the chosen strategy.
    pub fn instantiate(self) -> Rc<dyn Order> {
        match self {
            OrderKind::Subgraph => Rc::new(SubgraphOrder),
            OrderKind::Minor => Rc::new(MinorOrder),
            OrderKind::PathMinor => Rc::new(PathMinorOrder),
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Subgraph => write!(f, "subgraph"),
            OrderKind::Minor => write!(f, "minor"),
            OrderKind::PathMinor => write!(f, "path-minor"),
        }
    }
}

/// Counts of edges per `(label, arity)` shape.
pub(crate) fn shape_counts(graph: &Hypergraph) -> BTreeMap<(&str, usize), usize> {
    let mut counts = BTreeMap::new();
    for edge in graph.edges() {
        *counts.entry((edge.label.as_str(), edge.arity())).or_insert(0) += 1;
    }
    counts
}

/// Cheap necessary condition shared by all orders: `bigger` is at least as
/// large and offers enough edges of every shape `smaller` uses.
pub(crate) fn may_fit(smaller: &Hypergraph, bigger: &Hypergraph) -> bool {
    if smaller.vertex_count() > bigger.vertex_count() || smaller.edge_count() > bigger.edge_count() {
        return false;
    }
    let available = shape_counts(bigger);
    shape_counts(smaller)
        .into_iter()
        .all(|(shape, needed)| available.get(&shape).copied().unwrap_or(0) >= needed)
}
