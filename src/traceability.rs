//! Observability for backward searches.
//!
//! The search reports what it does to a [`ResultSink`]: which graphs it
//! started from, which graph produced which by which rule, which graphs were
//! dropped as non-minimal, and where the rounds begin and end. Sinks are a
//! side channel only; nothing they do influences the search.
//!
//! Graphs are referenced by [`GraphRef`] (run-wide ID plus a SHA-256 digest of
//! the concrete graph), so a log never keeps graphs alive.
//!
//! # Citations
//! - Graph transformation traceability: Varro et al., "Model transformation by example" (2006)

use crate::backward::CompletionStatus;
use crate::error::{CoverError, CoverResult};
use crate::gts::RuleId;
use crate::identity::{GraphId, IdHypergraph};
use crate::signature::{graph_fingerprint, HashValue};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info, trace};

/// Reference to a graph seen during a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphRef {
    pub id: GraphId,
    pub digest: HashValue,
}

impl GraphRef {
    pub fn of(graph: &IdHypergraph) -> Self {
        Self {
            id: graph.id(),
            digest: graph_fingerprint(graph.graph()),
        }
    }
}

/// One observable step of a backward search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEvent {
    /// Rules after preparation.
    PreparedGts {
        name: String,
        standard: usize,
        quantified: usize,
    },
    /// A starting (error) graph.
    ErrorGraph { graph: GraphRef },
    /// `graph` is a minimal predecessor of `from` under `rule`.
    Generated {
        graph: GraphRef,
        from: GraphRef,
        rule: RuleId,
    },
    /// `graph` left (or never entered) the antichain because `because ≤ graph`.
    Deleted { graph: GraphRef, because: GraphRef },
    /// A worklist graph that was dominated before it could be expanded.
    Skipped { graph: GraphRef },
    RoundStarted { round: usize },
    RoundFinished { round: usize, new_graphs: usize },
    Finished { status: CompletionStatus },
}

/// Receiver of [`SearchEvent`]s.
pub trait ResultSink {
    fn record(&mut self, event: SearchEvent);

    /// Whether events are kept at all. The search skips building events
    /// (and hashing graphs for them) when this is `false`.
    fn is_enabled(&self) -> bool {
        true
    }
}

impl dyn ResultSink + '_ {
    /// Records the event built by `make`, if the sink is enabled.
    pub fn emit(&mut self, make: impl FnOnce() -> SearchEvent) {
        if self.is_enabled() {
            self.record(make());
        }
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn record(&mut self, event: SearchEvent) {
        (**self).record(event);
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

impl<S: ResultSink + ?Sized> ResultSink for Box<S> {
    fn record(&mut self, event: SearchEvent) {
        (**self).record(event);
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// Shared handle, so a caller can read a log after the search owns the sink.
impl<S: ResultSink + ?Sized> ResultSink for Rc<RefCell<S>> {
    fn record(&mut self, event: SearchEvent) {
        self.borrow_mut().record(event);
    }

    fn is_enabled(&self) -> bool {
        self.borrow().is_enabled()
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn record(&mut self, _event: SearchEvent) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn record(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::PreparedGts {
                name,
                standard,
                quantified,
            } => info!(gts = %name, standard, quantified, "prepared rules"),
            SearchEvent::ErrorGraph { graph } => debug!(graph = %graph.id, digest = %graph.digest, "error graph"),
            SearchEvent::Generated { graph, from, rule } => {
                trace!(graph = %graph.id, from = %from.id, rule = %rule, "generated")
            }
            SearchEvent::Deleted { graph, because } => {
                trace!(graph = %graph.id, because = %because.id, "deleted")
            }
            SearchEvent::Skipped { graph } => trace!(graph = %graph.id, "skipped dominated graph"),
            SearchEvent::RoundStarted { round } => debug!(round, "round started"),
            SearchEvent::RoundFinished { round, new_graphs } => {
                debug!(round, new_graphs, "round finished")
            }
            SearchEvent::Finished { status } => info!(?status, "search finished"),
        }
    }
}

/// In-memory event log with CBOR export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SearchEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SearchEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every event that mentions `id` as its subject.
    pub fn history_of(&self, id: GraphId) -> impl Iterator<Item = &SearchEvent> {
        self.events.iter().filter(move |e| match e {
            SearchEvent::ErrorGraph { graph }
            | SearchEvent::Generated { graph, .. }
            | SearchEvent::Deleted { graph, .. }
            | SearchEvent::Skipped { graph } => graph.id == id,
            _ => false,
        })
    }

    /// Serializes the log to CBOR bytes.
    pub fn to_cbor(&self) -> CoverResult<Vec<u8>> {
        serde_cbor::to_vec(self).map_err(|e| CoverError::invalid_state(format!("encode event log: {e}")))
    }

    /// Deserializes a log from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> CoverResult<Self> {
        serde_cbor::from_slice(bytes).map_err(|e| CoverError::invalid_input(format!("decode event log: {e}")))
    }

    /// Writes the log to `path` as CBOR.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> CoverResult<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| CoverError::invalid_state(format!("create {}: {e}", path.display())))?;
        serde_cbor::to_writer(BufWriter::new(file), self)
            .map_err(|e| CoverError::invalid_state(format!("write {}: {e}", path.display())))
    }

    /// Reads a log written by [`EventLog::save_to_file`].
    pub fn load_from_file(path: impl AsRef<Path>) -> CoverResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| CoverError::invalid_input(format!("open {}: {e}", path.display())))?;
        serde_cbor::from_reader(BufReader::new(file))
            .map_err(|e| CoverError::invalid_input(format!("read {}: {e}", path.display())))
    }
}

impl ResultSink for EventLog {
    fn record(&mut self, event: SearchEvent) {
        self.events.push(event);
    }
}
