//! gtscover: backward coverability analysis for graph transformation systems.
//!
//! Given a set of rewrite rules over labelled hypergraphs and a set of error
//! graphs, this crate computes every graph from which some error graph can be
//! covered, i.e. reached up to a well-quasi-order. The set is upward closed,
//! so it is represented by its minimal elements: an antichain grown backwards
//! round by round until no new minimal predecessor appears.
//!
//! The crate provides:
//! - Labelled hypergraphs with vertex and edge merging.
//! - Refined graph signatures and an isomorphism / embedding search.
//! - Three orders: subgraph, minor and a path-based minor for binary graphs.
//! - A [`MinGraphList`] antichain and the [`BackwardAnalysis`] driver with
//!   pluggable rule preparation, predecessor enumeration and result sinks.
//!
//! # Mathematical Foundations
//!
//! Backward reachability terminates whenever the order is a well-quasi-order
//! compatible with the transition relation (well-structured transition
//! systems). The minor order on hypergraphs is such an order by the
//! Robertson–Seymour theorem; the subgraph order is not, so searches under it
//! may not converge and should carry a timeout.
//!
//! # References
//!
//! - Abdulla, Čerāns, Jonsson, Tsay. "General decidability theorems for infinite-state systems" (1996)
//! - Finkel, Schnoebelen. "Well-structured transition systems everywhere!" (2001)
//! - Bertrand, Delzanno, König, Sangnier, Stückrath. "On the decidability status of reachability and coverability in graph transformation systems" (2012)
//! - Robertson, Seymour. "Graph minors XX. Wagner's conjecture" (2004)
//!
//! # Example
//!
//! ```
//! use gtscover::prelude::*;
//!
//! // {v} => {v, w, E(v, w)}
//! let mut left = Hypergraph::new();
//! let v = left.add_vertex();
//! let mut right = Hypergraph::new();
//! let rv = right.add_vertex();
//! let w = right.add_vertex();
//! right.add_edge("E", vec![rv, w]).unwrap();
//! let mut gts = Gts::new("grow");
//! gts.add_rule(Rule::new("grow", left, right).preserve_vertex(v, rv)).unwrap();
//!
//! let mut error = Hypergraph::new();
//! let a = error.add_vertex();
//! let b = error.add_vertex();
//! error.add_edge("E", vec![a, b]).unwrap();
//!
//! let mut analysis = BackwardAnalysis::builder()
//!     .gts(gts)
//!     .error_graphs([error])
//!     .with_default_collaborators()
//!     .build()
//!     .unwrap();
//! let outcome = analysis.perform_analysis().unwrap();
//! assert!(outcome.status.is_complete());
//! assert_eq!(outcome.antichain.len(), 1);
//! ```

pub mod antichain;
pub mod backward;
pub mod core;
pub mod error;
pub mod gts;
pub mod identity;
pub mod isomorphism;
pub mod operations;
pub mod order;
pub mod poc;
pub mod prepare;
pub mod signature;
pub mod timer;
pub mod traceability;

pub use antichain::MinGraphList;
pub use backward::{AnalysisConfig, AnalysisOutcome, BackwardAnalysis, BackwardAnalysisBuilder, CompletionStatus};
pub use core::{Edge, EdgeId, Hypergraph, Vertex, VertexId};
pub use error::{CoverError, CoverResult};
pub use gts::{Gts, Rule, RuleId, UqRule};
pub use identity::{GraphId, GraphIdAllocator, IdHypergraph};
pub use order::{MinorOrder, Order, OrderKind, PathMinorOrder, SubgraphOrder};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::antichain::MinGraphList;
    pub use crate::backward::{AnalysisConfig, AnalysisOutcome, BackwardAnalysis, CompletionStatus};
    pub use crate::core::{Edge, EdgeId, Hypergraph, VertexId};
    pub use crate::error::{CoverError, CoverResult};
    pub use crate::gts::{Gts, Rule, RuleId, UqRule};
    pub use crate::identity::{GraphId, GraphIdAllocator, IdHypergraph};
    pub use crate::isomorphism::{are_isomorphic, find_embedding, find_isomorphism};
    pub use crate::operations::{merge_edges, merge_vertices, Morphism};
    pub use crate::order::{MinorOrder, Order, OrderKind, PathMinorOrder, SubgraphOrder};
    pub use crate::poc::{PartialMatchEnumerator, PocEnumerator};
    pub use crate::prepare::{DefaultPreparer, PreparedGts, RulePreparer};
    pub use crate::signature::{create_signature, graph_fingerprint, GraphSignature, HashValue};
    pub use crate::timer::Timer;
    pub use crate::traceability::{EventLog, GraphRef, NullSink, ResultSink, SearchEvent, TracingSink};
}
