//! Subgraph order: `smaller ≤ bigger` iff `smaller` embeds injectively.

use super::{may_fit, Order};
use crate::core::Hypergraph;
use crate::isomorphism::find_embedding;

/// The (non-induced) subgraph order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubgraphOrder;

impl Order for SubgraphOrder {
    fn is_less_or_eq(&self, smaller: &Hypergraph, bigger: &Hypergraph) -> bool {
        may_fit(smaller, bigger) && find_embedding(smaller, bigger).is_some()
    }

    fn name(&self) -> &'static str {
        "subgraph"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::fixtures::path;

    #[test]
    fn paths_embed_into_longer_paths() {
        assert!(SubgraphOrder.is_less_or_eq(&path(2, "E"), &path(4, "E")));
        assert!(!SubgraphOrder.is_less_or_eq(&path(4, "E"), &path(2, "E")));
    }

    #[test]
    fn edge_direction_is_respected() {
        let mut fork = Hypergraph::new();
        let [a, b, c] = [fork.add_vertex(), fork.add_vertex(), fork.add_vertex()];
        fork.add_edge("E", vec![a, b]).unwrap();
        fork.add_edge("E", vec![a, c]).unwrap();
        // Two edges leaving one vertex never embed into a directed path.
        assert!(!SubgraphOrder.is_less_or_eq(&fork, &path(3, "E")));
    }

    #[test]
    fn adding_structure_keeps_embedding() {
        let small = path(1, "E");
        let mut big = path(1, "E");
        assert!(SubgraphOrder.is_less_or_eq(&small, &big));
        let extra = big.add_vertex();
        let first = big.vertices().next().unwrap();
        big.add_edge("F", vec![first, extra]).unwrap();
        assert!(SubgraphOrder.is_less_or_eq(&small, &big));
    }
}
