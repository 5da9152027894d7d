//! The backward fixpoint driver.
//!
//! Each round pops graphs from the current worklist (last in, first out),
//! applies every standard rule and every quantified-rule instance backwards
//! through the [`PocEnumerator`], and folds the results into the antichain.
//! Accepted graphs feed the next round. The two worklists are swapped between
//! rounds.
//!
//! The timer is polled before the first round and after every candidate.
//! With `check_initial`, every accepted candidate (and every error graph) is
//! compared against the initial graphs, and the search stops as soon as one
//! of them covers it.

use crate::antichain::MinGraphList;
use crate::core::Hypergraph;
use crate::error::{CoverError, CoverResult};
use crate::gts::{Gts, Rule};
use crate::identity::{GraphId, GraphIdAllocator, IdHypergraph};
use crate::order::{Order, OrderKind};
use crate::poc::{PartialMatchEnumerator, PocEnumerator};
use crate::prepare::{DefaultPreparer, RulePreparer};
use crate::timer::Timer;
use crate::traceability::{GraphRef, NullSink, ResultSink, SearchEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for a backward search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Stop as soon as an initial graph covers a found graph.
    pub check_initial: bool,
    /// Time budget in milliseconds (0 = unlimited).
    pub timeout_ms: u64,
    /// Order used by [`BackwardAnalysisBuilder::with_default_collaborators`].
    pub order: OrderKind,
    /// Cap on quantified copies per rule instance (0 = bounded by graph size).
    pub max_uq_instances: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            check_initial: true,
            timeout_ms: 0,
            order: OrderKind::Minor,
            max_uq_instances: 0,
        }
    }
}

impl AnalysisConfig {
    /// The time budget, `None` when unlimited.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Why a search stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    /// No new minimal graph appeared; the antichain is exact.
    Converged,
    /// Initial graph number `initial` covers `graph`; the antichain is partial.
    InitialGraphCovered { graph: GraphId, initial: usize },
    /// The time budget ran out; the antichain is partial.
    TimedOut,
}

impl CompletionStatus {
    /// Whether the antichain represents every backward-reachable graph.
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionStatus::Converged)
    }
}

/// Result of [`BackwardAnalysis::perform_analysis`].
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub status: CompletionStatus,
    pub antichain: MinGraphList,
    /// Number of rounds started.
    pub rounds: usize,
}

impl AnalysisOutcome {
    pub fn graphs(&self) -> impl Iterator<Item = &IdHypergraph> {
        self.antichain.iter().map(|g| &**g)
    }
}

/// Backward coverability search over a GTS.
pub struct BackwardAnalysis {
    gts: Gts,
    error_graphs: Vec<Hypergraph>,
    order: Rc<dyn Order>,
    preparer: Box<dyn RulePreparer>,
    enumerator: Box<dyn PocEnumerator>,
    sink: Box<dyn ResultSink>,
    config: AnalysisConfig,
    ids: GraphIdAllocator,
}

/// Collects the collaborators of a [`BackwardAnalysis`].
#[derive(Default)]
pub struct BackwardAnalysisBuilder {
    gts: Option<Gts>,
    error_graphs: Option<Vec<Hypergraph>>,
    order: Option<Rc<dyn Order>>,
    preparer: Option<Box<dyn RulePreparer>>,
    enumerator: Option<Box<dyn PocEnumerator>>,
    sink: Option<Box<dyn ResultSink>>,
    config: AnalysisConfig,
}

impl BackwardAnalysisBuilder {
    /// The system to analyse. Required.
    pub fn gts(mut self, gts: Gts) -> Self {
        self.gts = Some(gts);
        self
    }

    /// Graphs whose upward closure is the error set. Required, may be empty.
    pub fn error_graphs<I: IntoIterator<Item = Hypergraph>>(mut self, graphs: I) -> Self {
        self.error_graphs = Some(graphs.into_iter().collect());
        self
    }

    /// Order used for the antichain and for the initial-graph check.
    pub fn order(mut self, order: Rc<dyn Order>) -> Self {
        self.order = Some(order);
        self
    }

    /// Rule preparation strategy.
    pub fn preparer(mut self, preparer: impl RulePreparer + 'static) -> Self {
        self.preparer = Some(Box::new(preparer));
        self
    }

    /// Source of predecessors. It should suit the order: under a minor order
    /// an injective-only enumerator misses predecessors that need a contraction.
    pub fn enumerator(mut self, enumerator: impl PocEnumerator + 'static) -> Self {
        self.enumerator = Some(Box::new(enumerator));
        self
    }

    /// Event receiver; defaults to [`NullSink`].
    pub fn sink(mut self, sink: impl ResultSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replaces the configuration. Call it before
    /// [`BackwardAnalysisBuilder::with_default_collaborators`], which reads it.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Fills the order, preparer and enumerator from the configuration where
    /// they have not been set explicitly. The enumerator runs in contraction
    /// mode when the order allows contraction.
    pub fn with_default_collaborators(mut self) -> Self {
        let order = match &self.order {
            Some(order) => Rc::clone(order),
            None => self.config.order.instantiate(),
        };
        if self.preparer.is_none() {
            self.preparer = Some(Box::new(DefaultPreparer::new(self.config.max_uq_instances)));
        }
        if self.enumerator.is_none() {
            self.enumerator = Some(Box::new(PartialMatchEnumerator::for_order(order.as_ref())));
        }
        self.order = Some(order);
        self
    }

    /// Fails with [`CoverError::Configuration`] naming the first missing collaborator.
    pub fn build(self) -> CoverResult<BackwardAnalysis> {
        let missing = |what| CoverError::Configuration { missing: what };
        Ok(BackwardAnalysis {
            gts: self.gts.ok_or_else(|| missing("gts"))?,
            error_graphs: self.error_graphs.ok_or_else(|| missing("error graphs"))?,
            order: self.order.ok_or_else(|| missing("order"))?,
            preparer: self.preparer.ok_or_else(|| missing("rule preparer"))?,
            enumerator: self.enumerator.ok_or_else(|| missing("poc enumerator"))?,
            sink: self.sink.unwrap_or_else(|| Box::new(NullSink)),
            config: self.config,
            ids: GraphIdAllocator::new(),
        })
    }
}

impl fmt::Debug for BackwardAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackwardAnalysis")
            .field("gts", &self.gts.name)
            .field("error_graphs", &self.error_graphs.len())
            .field("order", &self.order.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BackwardAnalysis {
    /// Starts an empty builder.
    pub fn builder() -> BackwardAnalysisBuilder {
        BackwardAnalysisBuilder::default()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs the search to convergence or to a soft stop.
    pub fn perform_analysis(&mut self) -> CoverResult<AnalysisOutcome> {
        let mut timer = Timer::new(self.config.timeout());
        timer.start();

        let prepared = self.preparer.prepare(&self.gts, self.order.as_ref())?;
        self.sink.emit(|| SearchEvent::PreparedGts {
            name: prepared.name().to_owned(),
            standard: prepared.standard_count(),
            quantified: prepared.quantified_count(),
        });
        info!(
            order = self.order.name(),
            standard = prepared.standard_count(),
            quantified = prepared.quantified_count(),
            errors = self.error_graphs.len(),
            "starting backward search"
        );

        let mut search = Search {
            initial: &self.gts.initial,
            order: self.order.as_ref(),
            enumerator: self.enumerator.as_mut(),
            sink: self.sink.as_mut(),
            ids: &mut self.ids,
            check_initial: self.config.check_initial,
            timer,
            antichain: MinGraphList::new(Rc::clone(&self.order)),
            next: Vec::new(),
        };

        let mut worklist = Vec::with_capacity(self.error_graphs.len());
        for graph in &self.error_graphs {
            let graph = Rc::new(search.ids.identify(graph.clone()));
            search.sink.emit(|| SearchEvent::ErrorGraph {
                graph: GraphRef::of(&graph),
            });
            search.antichain.add_graph(Rc::clone(&graph), search.sink);
            worklist.push(graph);
        }
        if let Some(status) = search.initial_covers(&worklist) {
            return Ok(search.finish(status, 0));
        }
        if search.timer.out_of_time() {
            return Ok(search.finish(CompletionStatus::TimedOut, 0));
        }

        let mut round = 0;
        while !worklist.is_empty() {
            round += 1;
            search.sink.emit(|| SearchEvent::RoundStarted { round });
            info!(
                round,
                worklist = worklist.len(),
                antichain = search.antichain.len(),
                "backward round"
            );
            while let Some(graph) = worklist.pop() {
                if !search.antichain.contains(graph.id()) {
                    search.sink.emit(|| SearchEvent::Skipped {
                        graph: GraphRef::of(&graph),
                    });
                    continue;
                }
                for rule in prepared.rules() {
                    if let Some(status) = search.expand(&graph, rule)? {
                        return Ok(search.finish(status, round));
                    }
                }
                for id in prepared.uq_rule_ids() {
                    for instance in prepared.instances(id, graph.graph())? {
                        if let Some(status) = search.expand(&graph, &instance?)? {
                            return Ok(search.finish(status, round));
                        }
                    }
                }
            }
            let new_graphs = search.next.len();
            search
                .sink
                .emit(|| SearchEvent::RoundFinished { round, new_graphs });
            std::mem::swap(&mut worklist, &mut search.next);
        }
        Ok(search.finish(CompletionStatus::Converged, round))
    }
}

/// Mutable state of one run.
struct Search<'a> {
    initial: &'a [Hypergraph],
    order: &'a dyn Order,
    enumerator: &'a mut dyn PocEnumerator,
    sink: &'a mut dyn ResultSink,
    ids: &'a mut GraphIdAllocator,
    check_initial: bool,
    timer: Timer,
    antichain: MinGraphList,
    next: Vec<Rc<IdHypergraph>>,
}

impl Search<'_> {
    /// Applies `rule` backwards to `graph` and folds in every complement.
    fn expand(
        &mut self,
        graph: &Rc<IdHypergraph>,
        rule: &Rule,
    ) -> CoverResult<Option<CompletionStatus>> {
        self.enumerator.reset_with(rule, graph.graph())?;
        while let Some(poc) = self.enumerator.next_poc() {
            let candidate = Rc::new(self.ids.identify(poc));
            if self.antichain.add_graph(Rc::clone(&candidate), self.sink) {
                debug!(graph = %candidate.id(), from = %graph.id(), rule = %rule.id, "new minimal graph");
                self.sink.emit(|| SearchEvent::Generated {
                    graph: GraphRef::of(&candidate),
                    from: GraphRef::of(graph),
                    rule: rule.id.clone(),
                });
                if let Some(status) = self.initial_covers(std::slice::from_ref(&candidate)) {
                    return Ok(Some(status));
                }
                self.next.push(candidate);
            }
            if self.timer.out_of_time() {
                return Ok(Some(CompletionStatus::TimedOut));
            }
        }
        Ok(None)
    }

    fn initial_covers(&self, graphs: &[Rc<IdHypergraph>]) -> Option<CompletionStatus> {
        if !self.check_initial {
            return None;
        }
        graphs.iter().find_map(|graph| {
            self.initial
                .iter()
                .position(|init| self.order.is_less_or_eq(graph.graph(), init))
                .map(|initial| CompletionStatus::InitialGraphCovered {
                    graph: graph.id(),
                    initial,
                })
        })
    }

    fn finish(self, status: CompletionStatus, rounds: usize) -> AnalysisOutcome {
        let Search {
            mut antichain,
            sink,
            next,
            ..
        } = self;
        drop(next);
        match &status {
            CompletionStatus::Converged => {
                antichain.assign_default_names();
                info!(rounds, graphs = antichain.len(), "backward search converged");
            }
            CompletionStatus::InitialGraphCovered { graph, initial } => {
                info!(rounds, %graph, initial, "initial graph covers a found graph, result is partial");
            }
            CompletionStatus::TimedOut => {
                info!(rounds, graphs = antichain.len(), "timeout reached, result is partial");
            }
        }
        sink.emit(|| SearchEvent::Finished {
            status: status.clone(),
        });
        AnalysisOutcome {
            status,
            antichain,
            rounds,
        }
    }
}
