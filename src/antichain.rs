//! Antichains of hypergraphs.
//!
//! A [`MinGraphList`] holds the minimal elements of an upward-closed set of
//! graphs under some [`Order`]: no element is below another. Graphs are
//! shared as `Rc<IdHypergraph>` because the same graph may sit in the
//! antichain and in a search worklist at the same time.
//!
//! # Citations
//! - Upward-closed sets and their bases: Finkel & Schnoebelen, "Well-structured transition systems everywhere!" (2001)

use crate::identity::{GraphId, IdHypergraph};
use crate::order::Order;
use crate::traceability::{GraphRef, ResultSink, SearchEvent};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

/// Antichain of identified graphs under an [`Order`].
pub struct MinGraphList {
    order: Rc<dyn Order>,
    graphs: Vec<Rc<IdHypergraph>>,
    members: HashSet<GraphId>,
}

impl MinGraphList {
    /// Empty antichain under `order`.
    pub fn new(order: Rc<dyn Order>) -> Self {
        Self {
            order,
            graphs: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// The order deciding domination.
    pub fn order(&self) -> &dyn Order {
        self.order.as_ref()
    }

    /// Inserts `graph` unless an element is below it.
    ///
    /// Elements above `graph` are removed first-come. Once anything has been
    /// removed, `graph` can no longer be rejected: an element below `graph`
    /// would also be below the removed one.
    pub fn add_graph(&mut self, graph: Rc<IdHypergraph>, sink: &mut dyn ResultSink) -> bool {
        self.add_graph_with(graph, sink, None)
    }

    /// Like [`MinGraphList::add_graph`], collecting removed elements in `removed`.
    pub fn add_graph_with(
        &mut self,
        graph: Rc<IdHypergraph>,
        sink: &mut dyn ResultSink,
        mut removed: Option<&mut Vec<Rc<IdHypergraph>>>,
    ) -> bool {
        let mut removed_any = false;
        let mut i = 0;
        while i < self.graphs.len() {
            let existing = &self.graphs[i];
            if !removed_any && self.order.is_less_or_eq(existing.graph(), graph.graph()) {
                trace!(graph = %graph.id(), because = %existing.id(), "rejected");
                sink.emit(|| SearchEvent::Deleted {
                    graph: GraphRef::of(&graph),
                    because: GraphRef::of(existing),
                });
                return false;
            }
            if self.order.is_less_or_eq(graph.graph(), existing.graph()) {
                let gone = self.graphs.remove(i);
                self.members.remove(&gone.id());
                trace!(graph = %gone.id(), because = %graph.id(), "removed");
                sink.emit(|| SearchEvent::Deleted {
                    graph: GraphRef::of(&gone),
                    because: GraphRef::of(&graph),
                });
                if let Some(out) = removed.as_deref_mut() {
                    out.push(gone);
                }
                removed_any = true;
                continue;
            }
            i += 1;
        }
        self.members.insert(graph.id());
        self.graphs.push(graph);
        true
    }

    /// Folds [`MinGraphList::add_graph`] over `graphs`; returns the final size.
    pub fn add_graphs<I>(&mut self, graphs: I, sink: &mut dyn ResultSink) -> usize
    where
        I: IntoIterator<Item = Rc<IdHypergraph>>,
    {
        for graph in graphs {
            self.add_graph(graph, sink);
        }
        self.len()
    }

    /// Whether the graph with run-wide ID `id` is currently an element.
    ///
    /// Removed graphs are forgotten, so a worklist can tell whether one of
    /// its entries has been dominated in the meantime.
    pub fn contains(&self, id: GraphId) -> bool {
        self.members.contains(&id)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<IdHypergraph>> {
        self.graphs.iter()
    }

    /// Names every unnamed element `graph_<id>`.
    ///
    /// Elements still shared elsewhere are left as they are.
    pub fn assign_default_names(&mut self) {
        for graph in &mut self.graphs {
            let id = graph.id();
            match Rc::get_mut(graph) {
                Some(owned) => owned.ensure_default_name(),
                None => warn!(graph = %id, "cannot name shared graph"),
            }
        }
    }

    /// Consumes the list, keeping insertion order.
    pub fn into_graphs(self) -> Vec<Rc<IdHypergraph>> {
        self.graphs
    }
}

impl fmt::Debug for MinGraphList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinGraphList")
            .field("order", &self.order.name())
            .field("graphs", &self.graphs.iter().map(|g| g.id()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Hypergraph;
    use crate::identity::GraphIdAllocator;
    use crate::order::{MinorOrder, SubgraphOrder};
    use crate::traceability::{EventLog, NullSink};

    fn path(len: usize) -> Hypergraph {
        let mut g = Hypergraph::new();
        let vs = g.add_vertices(len + 1);
        for w in vs.windows(2) {
            g.add_edge("E", vec![w[0], w[1]]).unwrap();
        }
        g
    }

    #[test]
    fn smaller_graph_evicts_bigger_ones() {
        let mut ids = GraphIdAllocator::new();
        let mut list = MinGraphList::new(Rc::new(SubgraphOrder));
        let long = Rc::new(ids.identify(path(3)));
        let longer = Rc::new(ids.identify(path(4)));
        let short = Rc::new(ids.identify(path(1)));
        let mut log = EventLog::new();
        assert!(list.add_graph(long.clone(), &mut log));
        assert!(!list.add_graph(longer.clone(), &mut log));
        let mut removed = Vec::new();
        assert!(list.add_graph_with(short.clone(), &mut log, Some(&mut removed)));
        assert_eq!(list.len(), 1);
        assert!(list.contains(short.id()));
        assert!(!list.contains(long.id()));
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), long.id());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn equal_graph_is_rejected() {
        let mut ids = GraphIdAllocator::new();
        let mut list = MinGraphList::new(Rc::new(MinorOrder));
        let first = Rc::new(ids.identify(path(2)));
        let twin = Rc::new(ids.identify(path(2)));
        assert!(list.add_graph(first.clone(), &mut NullSink));
        assert!(!list.add_graph(twin, &mut NullSink));
        assert!(list.contains(first.id()));
    }

    #[test]
    fn incomparable_graphs_coexist() {
        let mut ids = GraphIdAllocator::new();
        let mut list = MinGraphList::new(Rc::new(SubgraphOrder));
        let mut f = Hypergraph::new();
        let v = f.add_vertex();
        f.add_edge("F", vec![v, v]).unwrap();
        let graphs = vec![Rc::new(ids.identify(path(1))), Rc::new(ids.identify(f))];
        assert_eq!(list.add_graphs(graphs, &mut NullSink), 2);
    }

    #[test]
    fn default_names_need_unique_ownership() {
        let mut ids = GraphIdAllocator::new();
        let mut list = MinGraphList::new(Rc::new(SubgraphOrder));
        let g = Rc::new(ids.identify(path(1)));
        list.add_graph(g.clone(), &mut NullSink);
        list.assign_default_names();
        assert_eq!(list.iter().next().unwrap().name(), "");
        drop(g);
        list.assign_default_names();
        assert_eq!(list.iter().next().unwrap().name(), "graph_0");
    }
}
