//! Minimal pushout complements.
//!
//! A backward step asks, for a rule and a graph `s`, which graphs `g` can be
//! rewritten into something covering `s`. [`PartialMatchEnumerator`] answers
//! it by overlapping the rule's right-hand side with `s`:
//!
//! 1. enumerate partial matches of `right` into `s` that touch at least one
//!    created element (other overlaps only reproduce graphs above `s`);
//! 2. glue the unmatched preserved part of `right` onto `s`;
//! 3. drop the match if removing the created elements would leave an edge
//!    dangling;
//! 4. remove the created elements and put back what the rule deleted from `left`.
//!
//! Under a minor order `s` only has to be a minor of the rewritten graph, so
//! the enumerator can also run in contraction mode (see
//! [`PartialMatchEnumerator::for_order`]). There several right-hand vertices
//! may share an image `x`, provided unmatched right-hand edges connect them.
//! Before gluing, `x` is split into one vertex per preimage: matched edges
//! follow the rule, every other incidence at `x` is handed to one of the
//! preserved preimages, and each hand-out yields its own complement.
//! Contracting the connecting edges in the rewritten graph gives `s` back.
//!
//! Results are not deduplicated; the antichain takes care of that.
//!
//! # Citations
//! - König & Stückrath, "A general framework for well-structured graph transformation systems" (2014)
//! - Ehrig et al., "Fundamentals of Algebraic Graph Transformation" (2006) – dangling condition
//! - Joshi & König, "Applying the graph minor theorem to the verification of graph transformation systems" (2008)

use crate::core::{EdgeId, Hypergraph, VertexId};
use crate::error::{CoverError, CoverResult};
use crate::gts::Rule;
use crate::order::Order;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{trace, warn};

/// Restartable source of minimal pushout complements.
///
/// [`PocEnumerator::next_poc`] yields `None` before the first
/// [`PocEnumerator::reset_with`] and after exhaustion.
pub trait PocEnumerator {
    fn reset_with(&mut self, rule: &Rule, graph: &Hypergraph) -> CoverResult<()>;

    fn next_poc(&mut self) -> Option<Hypergraph>;
}

/// One incidence of a graph edge: the edge and a position in its sequence.
type Incidence = (EdgeId, usize);

/// Partial match of a right-hand side into a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PartialMatch {
    vertices: BTreeMap<VertexId, VertexId>,
    edges: BTreeMap<EdgeId, EdgeId>,
    /// Right-hand vertex that receives an unmatched incidence at a shared image.
    attach: BTreeMap<Incidence, VertexId>,
}

#[derive(Debug)]
struct Loaded {
    rule: Rule,
    graph: Hypergraph,
    created_vertices: BTreeSet<VertexId>,
    created_edges: BTreeSet<EdgeId>,
    matches: Vec<PartialMatch>,
    cursor: usize,
}

/// Backward DPO step over partial matches.
#[derive(Debug, Default)]
pub struct PartialMatchEnumerator {
    contract: bool,
    loaded: Option<Loaded>,
}

impl PartialMatchEnumerator {
    /// Enumerator over injective matches only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerator suited to `order`: contraction mode when the order allows
    /// edge contraction.
    pub fn for_order(order: &dyn Order) -> Self {
        Self::new().with_contraction(order.contracts())
    }

    /// Switches contraction mode on or off.
    pub fn with_contraction(mut self, contract: bool) -> Self {
        self.contract = contract;
        self
    }

    pub fn contracts(&self) -> bool {
        self.contract
    }

    /// Number of admissible matches for the current rule and graph.
    pub fn match_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.matches.len())
    }
}

impl PocEnumerator for PartialMatchEnumerator {
    fn reset_with(&mut self, rule: &Rule, graph: &Hypergraph) -> CoverResult<()> {
        rule.validate()?;
        let created_vertices = rule.created_vertices();
        let created_edges = rule.created_edges();
        let mut search = MatchSearch {
            rule,
            graph,
            created_vertices: &created_vertices,
            created_edges: &created_edges,
            contract: self.contract,
            order: rule.right.vertices().collect(),
            current: PartialMatch::default(),
            used_vertices: BTreeMap::new(),
            used_edges: BTreeSet::new(),
            found: Vec::new(),
        };
        search.vertices(0);
        let matches = search.found;
        trace!(rule = %rule.id, matches = matches.len(), contract = self.contract, "partial matches");
        self.loaded = Some(Loaded {
            rule: rule.clone(),
            graph: graph.clone(),
            created_vertices,
            created_edges,
            matches,
            cursor: 0,
        });
        Ok(())
    }

    fn next_poc(&mut self) -> Option<Hypergraph> {
        let loaded = self.loaded.as_mut()?;
        while loaded.cursor < loaded.matches.len() {
            let m = &loaded.matches[loaded.cursor];
            loaded.cursor += 1;
            match complement(loaded, m) {
                Ok(poc) => return Some(poc),
                Err(err) => warn!(rule = %loaded.rule.id, %err, "skipping inconsistent match"),
            }
        }
        None
    }
}

struct MatchSearch<'a> {
    rule: &'a Rule,
    graph: &'a Hypergraph,
    created_vertices: &'a BTreeSet<VertexId>,
    created_edges: &'a BTreeSet<EdgeId>,
    contract: bool,
    order: Vec<VertexId>,
    current: PartialMatch,
    /// Graph vertex to the number of right-hand vertices mapped onto it.
    used_vertices: BTreeMap<VertexId, usize>,
    used_edges: BTreeSet<EdgeId>,
    found: Vec<PartialMatch>,
}

impl MatchSearch<'_> {
    /// Chooses an image (or none) for each right-hand vertex in turn.
    fn vertices(&mut self, idx: usize) {
        let Some(&r) = self.order.get(idx) else {
            let edges: Vec<EdgeId> = self
                .rule
                .right
                .edges()
                .filter(|e| e.vertices.iter().all(|v| self.current.vertices.contains_key(v)))
                .map(|e| e.id)
                .collect();
            self.edges(&edges, 0);
            return;
        };
        self.vertices(idx + 1);
        let created = self.created_vertices.contains(&r);
        let room = self.rule.right.degree(r);
        let graph = self.graph;
        for x in graph.vertices() {
            if !self.contract && self.used_vertices.contains_key(&x) {
                continue;
            }
            // A created vertex alone on `x` only ever carries created edges.
            // Shared images are settled in `finish`.
            if created && !self.contract && graph.degree(x) > room {
                continue;
            }
            self.current.vertices.insert(r, x);
            *self.used_vertices.entry(x).or_default() += 1;
            self.vertices(idx + 1);
            if let Some(n) = self.used_vertices.get_mut(&x) {
                *n -= 1;
                if *n == 0 {
                    self.used_vertices.remove(&x);
                }
            }
            self.current.vertices.remove(&r);
        }
    }

    /// Chooses an image (or none) for each edge whose vertices are all matched.
    fn edges(&mut self, eligible: &[EdgeId], idx: usize) {
        let Some(&re) = eligible.get(idx) else {
            self.finish();
            return;
        };
        self.edges(eligible, idx + 1);
        let (rule, graph) = (self.rule, self.graph);
        let Some(r_edge) = rule.right.edge(re) else { return };
        let image: Vec<VertexId> = r_edge
            .vertices
            .iter()
            .filter_map(|v| self.current.vertices.get(v).copied())
            .collect();
        let Some(&first) = image.first() else { return };
        let candidates: BTreeSet<EdgeId> =
            graph.incident_edges(first).unwrap_or(&[]).iter().copied().collect();
        for ge in candidates {
            if self.used_edges.contains(&ge) {
                continue;
            }
            let Some(g_edge) = graph.edge(ge) else { continue };
            if g_edge.label != r_edge.label || g_edge.vertices != image {
                continue;
            }
            self.current.edges.insert(re, ge);
            self.used_edges.insert(ge);
            self.edges(eligible, idx + 1);
            self.used_edges.remove(&ge);
            self.current.edges.remove(&re);
        }
    }

    /// Right-hand preimages per matched graph vertex, in ascending order.
    fn blocks(&self) -> BTreeMap<VertexId, Vec<VertexId>> {
        let mut blocks: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
        for (r, x) in &self.current.vertices {
            blocks.entry(*x).or_default().push(*r);
        }
        blocks
    }

    /// Whether unmatched right-hand edges connect all of `block`.
    fn connected(&self, block: &[VertexId]) -> bool {
        let members: BTreeSet<VertexId> = block.iter().copied().collect();
        let mut reached = BTreeSet::from([block[0]]);
        loop {
            let before = reached.len();
            for e in self.rule.right.edges() {
                if self.current.edges.contains_key(&e.id) {
                    continue;
                }
                if e.vertices.iter().any(|v| reached.contains(v)) {
                    reached.extend(e.vertices.iter().filter(|v| members.contains(*v)));
                }
            }
            if reached.len() == members.len() {
                return true;
            }
            if reached.len() == before {
                return false;
            }
        }
    }

    /// Whether an unmatched created edge gets contracted, i.e. two of its
    /// distinct vertices share an image.
    fn contracts_created_edge(&self) -> bool {
        self.rule
            .right
            .edges()
            .filter(|e| self.created_edges.contains(&e.id))
            .filter(|e| !self.current.edges.contains_key(&e.id))
            .any(|e| {
                let distinct = e.distinct_vertices();
                let images: BTreeSet<VertexId> = distinct
                    .iter()
                    .filter_map(|v| self.current.vertices.get(v).copied())
                    .collect();
                let mapped = distinct
                    .iter()
                    .filter(|v| self.current.vertices.contains_key(*v))
                    .count();
                images.len() < mapped
            })
    }

    fn finish(&mut self) {
        let touches = self
            .current
            .vertices
            .keys()
            .any(|v| self.created_vertices.contains(v))
            || self.current.edges.keys().any(|e| self.created_edges.contains(e))
            || self.contracts_created_edge();
        if !touches {
            return;
        }
        let blocks = self.blocks();
        if blocks.values().any(|b| b.len() > 1 && !self.connected(b)) {
            return;
        }

        // Incidences at a matched vertex that no matched edge accounts for
        // must stay on a preserved preimage, else they would dangle.
        let matched: BTreeSet<EdgeId> = self.current.edges.values().copied().collect();
        let mut choices: Vec<(Incidence, Vec<VertexId>)> = Vec::new();
        for (x, block) in &blocks {
            let keepers: Vec<VertexId> = block
                .iter()
                .filter(|r| !self.created_vertices.contains(*r))
                .copied()
                .collect();
            let incident: BTreeSet<EdgeId> = self
                .graph
                .incident_edges(*x)
                .unwrap_or(&[])
                .iter()
                .filter(|e| !matched.contains(*e))
                .copied()
                .collect();
            for e in incident {
                let Some(edge) = self.graph.edge(e) else { continue };
                for (pos, _) in edge.vertices.iter().enumerate().filter(|(_, v)| *v == x) {
                    if keepers.is_empty() {
                        return;
                    }
                    if block.len() > 1 {
                        choices.push(((e, pos), keepers.clone()));
                    }
                }
            }
        }
        self.attach(&choices, 0);
    }

    /// Emits one match per way of handing out the unmatched incidences.
    fn attach(&mut self, choices: &[(Incidence, Vec<VertexId>)], idx: usize) {
        let Some((incidence, keepers)) = choices.get(idx) else {
            self.found.push(self.current.clone());
            return;
        };
        for r in keepers {
            self.current.attach.insert(*incidence, *r);
            self.attach(choices, idx + 1);
        }
        self.current.attach.remove(incidence);
    }
}

/// Splits every shared image of `m` inside `poc` into one vertex per
/// right-hand preimage and reroutes the incidences at it.
///
/// Returns the image of each matched right-hand vertex and the new IDs of
/// the rerouted edges.
fn decontract(
    poc: &mut Hypergraph,
    rule: &Rule,
    m: &PartialMatch,
) -> CoverResult<(BTreeMap<VertexId, VertexId>, BTreeMap<EdgeId, EdgeId>)> {
    let mut blocks: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
    for (r, x) in &m.vertices {
        blocks.entry(*x).or_default().push(*r);
    }
    let mut copies = BTreeMap::new();
    let mut split = BTreeSet::new();
    for (x, block) in &blocks {
        for (i, r) in block.iter().enumerate() {
            let v = if i == 0 { *x } else { poc.add_vertex() };
            copies.insert(*r, v);
        }
        if block.len() > 1 {
            split.insert(*x);
        }
    }
    let mut renamed = BTreeMap::new();
    if split.is_empty() {
        return Ok((copies, renamed));
    }

    let owner_of: BTreeMap<EdgeId, EdgeId> = m.edges.iter().map(|(re, ge)| (*ge, *re)).collect();
    let view: &Hypergraph = poc;
    let touched: BTreeSet<EdgeId> = split
        .iter()
        .flat_map(|x| view.incident_edges(*x).unwrap_or(&[]).iter().copied())
        .collect();
    for ge in touched {
        let Some(edge) = poc.edge(ge) else { continue };
        let label = edge.label.clone();
        let mut incident = edge.vertices.clone();
        let r_edge = owner_of.get(&ge).and_then(|re| rule.right.edge(*re));
        for (pos, v) in incident.iter_mut().enumerate() {
            if !split.contains(v) {
                continue;
            }
            let owner = match r_edge {
                Some(r_edge) => r_edge.vertices.get(pos).copied(),
                None => m.attach.get(&(ge, pos)).copied(),
            };
            *v = owner
                .and_then(|r| copies.get(&r).copied())
                .ok_or_else(|| CoverError::invalid_state(format!("incidence {pos} of {ge} has no owner")))?;
        }
        poc.delete_edge(ge);
        renamed.insert(ge, poc.add_edge(label, incident)?);
    }
    Ok((copies, renamed))
}

/// Applies the rule backwards at a partial match.
fn complement(loaded: &Loaded, m: &PartialMatch) -> CoverResult<Hypergraph> {
    let rule = &loaded.rule;
    let mut poc = loaded.graph.clone();
    let (copies, renamed) = decontract(&mut poc, rule, m)?;
    let edge_image = |re: &EdgeId| {
        m.edges
            .get(re)
            .map(|ge| renamed.get(ge).copied().unwrap_or(*ge))
    };

    let mut right_image = BTreeMap::new();
    for r in rule.vertex_map.values() {
        let x = match copies.get(r) {
            Some(x) => *x,
            None => poc.add_vertex(),
        };
        right_image.insert(*r, x);
    }
    let lookup = |map: &BTreeMap<VertexId, VertexId>, v: &VertexId| {
        map.get(v)
            .copied()
            .ok_or_else(|| CoverError::invalid_state(format!("vertex {v} has no image")))
    };
    for r_edge_id in rule.edge_map.values() {
        if m.edges.contains_key(r_edge_id) {
            continue;
        }
        let Some(r_edge) = rule.right.edge(*r_edge_id) else {
            return Err(CoverError::invalid_state(format!("edge {r_edge_id} missing from rule")));
        };
        let incident = r_edge
            .vertices
            .iter()
            .map(|v| lookup(&right_image, v))
            .collect::<CoverResult<Vec<_>>>()?;
        poc.add_edge(r_edge.label.clone(), incident)?;
    }

    for re in &loaded.created_edges {
        if let Some(ge) = edge_image(re) {
            poc.delete_edge(ge);
        }
    }
    for rv in &loaded.created_vertices {
        if let Some(x) = copies.get(rv) {
            poc.delete_vertex(*x);
        }
    }

    let mut left_image = BTreeMap::new();
    for l in rule.left.vertices() {
        let x = match rule.vertex_map.get(&l) {
            Some(r) => lookup(&right_image, r)?,
            None => poc.add_vertex(),
        };
        left_image.insert(l, x);
    }
    for l_edge in rule.left.edges() {
        if rule.edge_map.contains_key(&l_edge.id) {
            continue;
        }
        let incident = l_edge
            .vertices
            .iter()
            .map(|v| lookup(&left_image, v))
            .collect::<CoverResult<Vec<_>>>()?;
        poc.add_edge(l_edge.label.clone(), incident)?;
    }
    Ok(poc)
}
