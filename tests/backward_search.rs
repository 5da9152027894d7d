//! End-to-end backward searches over small graph transformation systems.

use gtscover::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

fn point() -> Hypergraph {
    let mut g = Hypergraph::new();
    g.add_vertex();
    g
}

fn path(len: usize, label: &str) -> Hypergraph {
    let mut g = Hypergraph::new();
    let vs = g.add_vertices(len + 1);
    for w in vs.windows(2) {
        g.add_edge(label, vec![w[0], w[1]]).unwrap();
    }
    g
}

/// `{v} => {v, w, E(v, w)}`
fn grow() -> Rule {
    let mut left = Hypergraph::new();
    let v = left.add_vertex();
    let mut right = Hypergraph::new();
    let rv = right.add_vertex();
    let w = right.add_vertex();
    right.add_edge("E", vec![rv, w]).unwrap();
    Rule::new("grow", left, right).preserve_vertex(v, rv)
}

/// `{v} => {v, F(v, v)}`
fn loop_f() -> Rule {
    let mut left = Hypergraph::new();
    let v = left.add_vertex();
    let mut right = Hypergraph::new();
    let rv = right.add_vertex();
    right.add_edge("F", vec![rv, rv]).unwrap();
    Rule::new("loop", left, right).preserve_vertex(v, rv)
}

fn gts_with(rules: impl IntoIterator<Item = Rule>) -> Gts {
    let mut gts = Gts::new("test");
    for rule in rules {
        gts.add_rule(rule).unwrap();
    }
    gts
}

fn no_initial_check() -> AnalysisConfig {
    AnalysisConfig {
        check_initial: false,
        ..AnalysisConfig::default()
    }
}

#[test]
fn pendant_edges_reduce_to_a_point() {
    let log = Rc::new(RefCell::new(EventLog::new()));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .error_graphs([path(1, "E")])
        .config(no_initial_check())
        .sink(Rc::clone(&log))
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(outcome.status, CompletionStatus::Converged);
    let graphs: Vec<_> = outcome.graphs().collect();
    assert_eq!(graphs.len(), 1);
    assert!(are_isomorphic(graphs[0].graph(), &point()));

    let log = log.borrow();
    let generated = log
        .events()
        .iter()
        .filter(|e| matches!(e, SearchEvent::Generated { .. }))
        .count();
    assert!(generated >= 1);
    // The error graph was evicted by its predecessor.
    assert!(log
        .history_of(GraphId::new(0))
        .any(|e| matches!(e, SearchEvent::Deleted { .. })));
}

#[test]
fn inapplicable_rules_keep_the_minimized_error_set() {
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([loop_f()]))
        .error_graphs([path(1, "E"), path(2, "E")])
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(outcome.status, CompletionStatus::Converged);
    assert_eq!(outcome.rounds, 1);
    let graphs: Vec<_> = outcome.graphs().collect();
    assert_eq!(graphs.len(), 1);
    assert!(are_isomorphic(graphs[0].graph(), &path(1, "E")));
}

#[test]
fn covered_error_graph_stops_before_any_round() {
    let mut gts = gts_with([grow()]);
    gts.add_initial(path(3, "E"));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts)
        .error_graphs([path(1, "E")])
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(
        outcome.status,
        CompletionStatus::InitialGraphCovered {
            graph: GraphId::new(0),
            initial: 0,
        }
    );
    assert_eq!(outcome.rounds, 0);
    assert!(!outcome.status.is_complete());
}

#[test]
fn covered_predecessor_stops_the_search() {
    let mut gts = gts_with([grow()]);
    // The empty graph covers nothing with a vertex.
    gts.add_initial(Hypergraph::new());
    gts.add_initial(point());
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts)
        .error_graphs([path(1, "E")])
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    match outcome.status {
        CompletionStatus::InitialGraphCovered { graph, initial } => {
            assert_eq!(initial, 1);
            assert!(outcome.antichain.contains(graph));
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert_eq!(outcome.rounds, 1);
}

#[test]
fn zero_timeout_never_expires() {
    let config = AnalysisConfig {
        timeout_ms: 0,
        ..no_initial_check()
    };
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow(), loop_f()]))
        .error_graphs([path(2, "E")])
        .config(config)
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();
    assert_eq!(outcome.status, CompletionStatus::Converged);
}

#[test]
fn missing_error_graphs_are_a_configuration_error() {
    let err = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .with_default_collaborators()
        .build()
        .unwrap_err();
    assert_eq!(err, CoverError::Configuration { missing: "error graphs" });
}

#[test]
fn subgraph_order_search_converges() {
    let config = AnalysisConfig {
        order: OrderKind::Subgraph,
        ..no_initial_check()
    };
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .error_graphs([path(1, "E")])
        .config(config)
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();
    assert_eq!(outcome.status, CompletionStatus::Converged);
    assert_eq!(outcome.antichain.order().name(), "subgraph");
    let graphs: Vec<_> = outcome.graphs().collect();
    assert_eq!(graphs.len(), 1);
    assert!(are_isomorphic(graphs[0].graph(), &point()));
}

/// `{hub} => {hub}` plus, per copy, an `M` loop on `hub`.
fn marker() -> UqRule {
    let mut bl = Hypergraph::new();
    let hub = bl.add_vertex();
    let mut br = Hypergraph::new();
    let hub_r = br.add_vertex();
    let base = Rule::new("base", bl, br).preserve_vertex(hub, hub_r);
    let mut ql = Hypergraph::new();
    let q = ql.add_vertex();
    let mut qr = Hypergraph::new();
    let r = qr.add_vertex();
    qr.add_edge("M", vec![r]).unwrap();
    let quantified = Rule::new("each", ql, qr).preserve_vertex(q, r);
    UqRule {
        id: "mark".into(),
        name: "mark".into(),
        base,
        quantified,
        anchors: BTreeMap::from([(q, hub)]),
    }
}

#[test]
fn quantified_rule_instances_are_applied() {
    let mut gts = Gts::new("marks");
    gts.add_uq_rule(marker()).unwrap();
    let mut error = Hypergraph::new();
    let v = error.add_vertex();
    error.add_edge("M", vec![v]).unwrap();

    let log = Rc::new(RefCell::new(EventLog::new()));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts)
        .error_graphs([error])
        .config(no_initial_check())
        .sink(Rc::clone(&log))
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(outcome.status, CompletionStatus::Converged);
    let graphs: Vec<_> = outcome.graphs().collect();
    assert_eq!(graphs.len(), 1);
    assert!(are_isomorphic(graphs[0].graph(), &point()));
    assert!(log.borrow().events().iter().any(|e| matches!(
        e,
        SearchEvent::Generated { rule, .. } if rule == &RuleId::from("mark")
    )));
}

/// Predecessor function that drops the first edge of every graph.
#[derive(Default)]
struct DropFirstEdge {
    pending: Option<Hypergraph>,
}

impl PocEnumerator for DropFirstEdge {
    fn reset_with(&mut self, _rule: &Rule, graph: &Hypergraph) -> CoverResult<()> {
        self.pending = graph.edge_ids().next().map(|e| {
            let mut smaller = graph.clone();
            smaller.delete_edge(e);
            smaller
        });
        Ok(())
    }

    fn next_poc(&mut self) -> Option<Hypergraph> {
        self.pending.take()
    }
}

#[test]
fn custom_enumerator_drives_rounds() {
    let log = Rc::new(RefCell::new(EventLog::new()));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .error_graphs([path(3, "E")])
        .order(Rc::new(MinorOrder))
        .preparer(DefaultPreparer::default())
        .enumerator(DropFirstEdge::default())
        .sink(Rc::clone(&log))
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(outcome.status, CompletionStatus::Converged);
    assert_eq!(outcome.rounds, 4);
    let graphs: Vec<_> = outcome.graphs().collect();
    assert_eq!(graphs.len(), 1);
    assert_eq!(graphs[0].vertex_count(), 4);
    assert_eq!(graphs[0].edge_count(), 0);

    let log = log.borrow();
    let finished: Vec<_> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            SearchEvent::RoundFinished { round, new_graphs } => Some((*round, *new_graphs)),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![(1, 1), (2, 1), (3, 1), (4, 0)]);
}

#[test]
fn event_log_survives_export() {
    let log = Rc::new(RefCell::new(EventLog::new()));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .error_graphs([path(1, "E")])
        .config(no_initial_check())
        .sink(Rc::clone(&log))
        .with_default_collaborators()
        .build()
        .unwrap();
    analysis.perform_analysis().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("run.cbor");
    log.borrow().save_to_file(&file).unwrap();
    let restored = EventLog::load_from_file(&file).unwrap();
    assert_eq!(&restored, &*log.borrow());
}

/// `{a, b, E(a, b)} => {a, b, E(a, b), C(a, b)}`
fn connect() -> Rule {
    let mut left = Hypergraph::new();
    let [a, b] = [left.add_vertex(), left.add_vertex()];
    let le = left.add_edge("E", vec![a, b]).unwrap();
    let mut right = Hypergraph::new();
    let [ra, rb] = [right.add_vertex(), right.add_vertex()];
    let re = right.add_edge("E", vec![ra, rb]).unwrap();
    right.add_edge("C", vec![ra, rb]).unwrap();
    Rule::new("connect", left, right)
        .preserve_vertex(a, ra)
        .preserve_vertex(b, rb)
        .preserve_edge(le, re)
}

fn e_loop() -> Hypergraph {
    let mut g = Hypergraph::new();
    let x = g.add_vertex();
    g.add_edge("E", vec![x, x]).unwrap();
    g
}

#[test]
fn error_reached_only_through_contraction_is_found() {
    let mut stepped = path(1, "E");
    let vs: Vec<_> = stepped.vertices().collect();
    stepped.add_edge("C", vec![vs[0], vs[1]]).unwrap();
    assert!(MinorOrder.is_less_or_eq(&e_loop(), &stepped));
    assert!(!MinorOrder.is_less_or_eq(&e_loop(), &path(1, "E")));

    let mut gts = gts_with([connect()]);
    gts.add_initial(path(1, "E"));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts)
        .error_graphs([e_loop()])
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    match outcome.status {
        CompletionStatus::InitialGraphCovered { graph, initial } => {
            assert_eq!(initial, 0);
            assert_ne!(graph, GraphId::new(0));
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert!(!outcome.status.is_complete());
    assert_eq!(outcome.rounds, 1);
}

#[test]
fn contraction_predecessors_join_the_antichain() {
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([connect()]))
        .error_graphs([e_loop()])
        .config(no_initial_check())
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(outcome.status, CompletionStatus::Converged);
    let graphs: Vec<_> = outcome.graphs().collect();
    assert_eq!(graphs.len(), 2);
    assert!(graphs.iter().any(|g| are_isomorphic(g.graph(), &e_loop())));
    assert!(graphs.iter().any(|g| are_isomorphic(g.graph(), &path(1, "E"))));

    // Injective matching alone never leaves the error graph.
    let mut injective = BackwardAnalysis::builder()
        .gts(gts_with([connect()]))
        .error_graphs([e_loop()])
        .config(no_initial_check())
        .enumerator(PartialMatchEnumerator::new())
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = injective.perform_analysis().unwrap();
    assert_eq!(outcome.antichain.len(), 1);
}

/// Yields a single vertex per reset, after a pause.
#[derive(Default)]
struct SlowEnumerator {
    pending: bool,
}

impl PocEnumerator for SlowEnumerator {
    fn reset_with(&mut self, _rule: &Rule, _graph: &Hypergraph) -> CoverResult<()> {
        self.pending = true;
        Ok(())
    }

    fn next_poc(&mut self) -> Option<Hypergraph> {
        if !std::mem::take(&mut self.pending) {
            return None;
        }
        thread::sleep(Duration::from_millis(20));
        Some(point())
    }
}

#[test]
fn expired_budget_stops_the_search() {
    let log = Rc::new(RefCell::new(EventLog::new()));
    let config = AnalysisConfig {
        timeout_ms: 1,
        ..no_initial_check()
    };
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow(), loop_f()]))
        .error_graphs([path(2, "E")])
        .config(config)
        .order(Rc::new(MinorOrder))
        .preparer(DefaultPreparer::default())
        .enumerator(SlowEnumerator::default())
        .sink(Rc::clone(&log))
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();

    assert_eq!(outcome.status, CompletionStatus::TimedOut);
    assert!(!outcome.status.is_complete());
    assert!(outcome.rounds <= 1);
    let log = log.borrow();
    assert!(matches!(
        log.events().last(),
        Some(SearchEvent::Finished {
            status: CompletionStatus::TimedOut
        })
    ));
    // The second rule of the round never ran.
    let generated = log
        .events()
        .iter()
        .filter(|e| matches!(e, SearchEvent::Generated { .. }))
        .count();
    assert!(generated <= 1);
}

#[test]
fn dominated_worklist_graphs_are_skipped() {
    // `first` has a G edge the second error graph lacks, and vice versa an E
    // edge; dropping E from the second one leaves a graph below both.
    let mut first = Hypergraph::new();
    let [p, q, r] = [first.add_vertex(), first.add_vertex(), first.add_vertex()];
    first.add_edge("F", vec![p, q]).unwrap();
    first.add_edge("G", vec![r]).unwrap();
    let mut second = Hypergraph::new();
    let [a, b, c] = [second.add_vertex(), second.add_vertex(), second.add_vertex()];
    second.add_edge("E", vec![a, b]).unwrap();
    second.add_edge("F", vec![b, c]).unwrap();

    let log = Rc::new(RefCell::new(EventLog::new()));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .error_graphs([first, second])
        .order(Rc::new(MinorOrder))
        .preparer(DefaultPreparer::default())
        .enumerator(DropFirstEdge::default())
        .sink(Rc::clone(&log))
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();
    assert_eq!(outcome.status, CompletionStatus::Converged);

    let log = log.borrow();
    let skipped: Vec<GraphId> = log
        .events()
        .iter()
        .filter_map(|e| match e {
            SearchEvent::Skipped { graph } => Some(graph.id),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec![GraphId::new(0)]);
    assert!(log
        .history_of(GraphId::new(0))
        .any(|e| matches!(e, SearchEvent::Deleted { because, .. } if because.id == GraphId::new(2))));
}

/// Counts what it receives while declaring itself disabled.
#[derive(Default)]
struct Muted {
    received: usize,
}

impl ResultSink for Muted {
    fn record(&mut self, _event: SearchEvent) {
        self.received += 1;
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[test]
fn disabled_sink_receives_nothing() {
    let muted = Rc::new(RefCell::new(Muted::default()));
    let mut analysis = BackwardAnalysis::builder()
        .gts(gts_with([grow()]))
        .error_graphs([path(2, "E")])
        .config(no_initial_check())
        .sink(Rc::clone(&muted))
        .with_default_collaborators()
        .build()
        .unwrap();
    let outcome = analysis.perform_analysis().unwrap();
    assert_eq!(outcome.status, CompletionStatus::Converged);
    assert_eq!(muted.borrow().received, 0);
}
