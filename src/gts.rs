//! Graph transformation systems.
//!
//! A [`Rule`] is a double-pushout span `L ⊇ K ⊆ R`, written as partial
//! injective maps from `left` into `right`. Their domain is the preserved
//! interface `K`: everything else in `left` is deleted by the rule and
//! everything in `right` outside the image is created.
//!
//! A [`UqRule`] extends a base rule with a quantified part that is repeated
//! once per matching neighbourhood. Instance `k` glues `k` disjoint copies of
//! the quantified rule onto the base rule at the anchor vertices.
//!
//! # Citations
//! - Ehrig et al., "Fundamentals of Algebraic Graph Transformation" (2006)
//! - Rensink, "Representing first-order logic using graphs" (2004) – quantified rules

use crate::core::{EdgeId, Hypergraph, VertexId};
use crate::error::{CoverError, CoverResult};
use crate::operations::copy_into_glued;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a rule inside a GTS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A DPO rewrite rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub left: Hypergraph,
    pub right: Hypergraph,
    /// Preserved vertices, `left -> right`.
    pub vertex_map: BTreeMap<VertexId, VertexId>,
    /// Preserved edges, `left -> right`.
    pub edge_map: BTreeMap<EdgeId, EdgeId>,
}

impl Rule {
    /// Rule with empty interface; extend it with [`Rule::preserve_vertex`]
    /// and [`Rule::preserve_edge`].
    pub fn new(id: impl Into<RuleId>, left: Hypergraph, right: Hypergraph) -> Self {
        let id = id.into();
        Self {
            name: id.0.clone(),
            id,
            left,
            right,
            vertex_map: BTreeMap::new(),
            edge_map: BTreeMap::new(),
        }
    }

    pub fn preserve_vertex(mut self, l: VertexId, r: VertexId) -> Self {
        self.vertex_map.insert(l, r);
        self
    }

    pub fn preserve_edge(mut self, l: EdgeId, r: EdgeId) -> Self {
        self.edge_map.insert(l, r);
        self
    }

    /// Checks that both maps are injective, total on existing elements and
    /// that preserved edges keep label and (mapped) incidence.
    pub fn validate(&self) -> CoverResult<()> {
        let fail = |what: String| Err(CoverError::invalid_input(format!("rule {}: {what}", self.id)));
        let mut images = BTreeSet::new();
        for (l, r) in &self.vertex_map {
            if !self.left.contains_vertex(*l) || !self.right.contains_vertex(*r) {
                return fail(format!("vertex pair {l} -> {r} is not in the rule"));
            }
            if !images.insert(*r) {
                return fail(format!("vertex {r} preserved twice"));
            }
        }
        let mut edge_images = BTreeSet::new();
        for (l, r) in &self.edge_map {
            let (Some(le), Some(re)) = (self.left.edge(*l), self.right.edge(*r)) else {
                return fail(format!("edge pair {l} -> {r} is not in the rule"));
            };
            if !edge_images.insert(*r) {
                return fail(format!("edge {r} preserved twice"));
            }
            if le.label != re.label || le.arity() != re.arity() {
                return fail(format!("preserved edge {l} changes shape"));
            }
            let keeps_incidence = le
                .vertices
                .iter()
                .zip(&re.vertices)
                .all(|(lv, rv)| self.vertex_map.get(lv) == Some(rv));
            if !keeps_incidence {
                return fail(format!("preserved edge {l} changes incidence"));
            }
        }
        Ok(())
    }

    /// Right-hand vertices outside the interface.
    pub fn created_vertices(&self) -> BTreeSet<VertexId> {
        let kept: BTreeSet<_> = self.vertex_map.values().copied().collect();
        self.right.vertices().filter(|v| !kept.contains(v)).collect()
    }

    /// Right-hand edges outside the interface.
    pub fn created_edges(&self) -> BTreeSet<EdgeId> {
        let kept: BTreeSet<_> = self.edge_map.values().copied().collect();
        self.right.edge_ids().filter(|e| !kept.contains(e)).collect()
    }

    /// Left-hand vertices outside the interface.
    pub fn deleted_vertices(&self) -> BTreeSet<VertexId> {
        self.left
            .vertices()
            .filter(|v| !self.vertex_map.contains_key(v))
            .collect()
    }

    /// Left-hand edges outside the interface.
    pub fn deleted_edges(&self) -> BTreeSet<EdgeId> {
        self.left
            .edge_ids()
            .filter(|e| !self.edge_map.contains_key(e))
            .collect()
    }
}

/// A universally quantified rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UqRule {
    pub id: RuleId,
    pub name: String,
    pub base: Rule,
    pub quantified: Rule,
    /// `quantified.left` vertex -> `base.left` vertex it is glued to.
    pub anchors: BTreeMap<VertexId, VertexId>,
}

impl UqRule {
    pub fn validate(&self) -> CoverResult<()> {
        self.base.validate()?;
        self.quantified.validate()?;
        for (q, b) in &self.anchors {
            if !self.quantified.vertex_map.contains_key(q) || !self.base.vertex_map.contains_key(b) {
                return Err(CoverError::invalid_input(format!(
                    "quantified rule {}: anchor {q} -> {b} must be preserved on both sides",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Base rule with `copies` quantified parts glued on.
    pub fn instantiate(&self, copies: usize) -> CoverResult<Rule> {
        let mut rule = self.base.clone();
        rule.id = self.id.clone();
        rule.name = format!("{}[{copies}]", self.name);
        let mut right_glue = BTreeMap::new();
        for (q, b) in &self.anchors {
            match (self.quantified.vertex_map.get(q), self.base.vertex_map.get(b)) {
                (Some(qr), Some(br)) => {
                    right_glue.insert(*qr, *br);
                }
                _ => return Err(CoverError::invalid_input(format!("unpreserved anchor {q}"))),
            }
        }
        for _ in 0..copies {
            let left = copy_into_glued(&mut rule.left, &self.quantified.left, &self.anchors)?;
            let right = copy_into_glued(&mut rule.right, &self.quantified.right, &right_glue)?;
            for (ql, qr) in &self.quantified.vertex_map {
                if let (Some(l), Some(r)) = (left.vertex(*ql), right.vertex(*qr)) {
                    rule.vertex_map.insert(l, r);
                }
            }
            for (ql, qr) in &self.quantified.edge_map {
                if let (Some(l), Some(r)) = (left.edge(*ql), right.edge(*qr)) {
                    rule.edge_map.insert(l, r);
                }
            }
        }
        Ok(rule)
    }
}

/// A graph transformation system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gts {
    pub name: String,
    pub initial: Vec<Hypergraph>,
    pub rules: BTreeMap<RuleId, Rule>,
    pub uq_rules: BTreeMap<RuleId, UqRule>,
}

impl Gts {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_initial(&mut self, graph: Hypergraph) {
        self.initial.push(graph);
    }

    /// Adds a rule; rule IDs are unique across both rule kinds.
    pub fn add_rule(&mut self, rule: Rule) -> CoverResult<()> {
        self.ensure_fresh(&rule.id)?;
        self.rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    pub fn add_uq_rule(&mut self, rule: UqRule) -> CoverResult<()> {
        self.ensure_fresh(&rule.id)?;
        self.uq_rules.insert(rule.id.clone(), rule);
        Ok(())
    }

    fn ensure_fresh(&self, id: &RuleId) -> CoverResult<()> {
        if self.rules.contains_key(id) || self.uq_rules.contains_key(id) {
            return Err(CoverError::invalid_input(format!("duplicate rule id {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// `{v} => {v, w, E(v, w)}`: grows a pendant edge.
    pub fn pendant_rule() -> Rule {
        let mut left = Hypergraph::new();
        let v = left.add_vertex();
        let mut right = Hypergraph::new();
        let rv = right.add_vertex();
        let w = right.add_vertex();
        right.add_edge("E", vec![rv, w]).unwrap();
        Rule::new("grow", left, right).preserve_vertex(v, rv)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::pendant_rule;
    use super::*;

    #[test]
    fn pendant_rule_classifies_elements() {
        let rule = pendant_rule();
        rule.validate().unwrap();
        assert_eq!(rule.created_vertices().len(), 1);
        assert_eq!(rule.created_edges().len(), 1);
        assert!(rule.deleted_vertices().is_empty());
        assert!(rule.deleted_edges().is_empty());
    }

    #[test]
    fn validate_rejects_non_injective_interface() {
        let mut left = Hypergraph::new();
        let [a, b] = [left.add_vertex(), left.add_vertex()];
        let mut right = Hypergraph::new();
        let x = right.add_vertex();
        let rule = Rule::new("bad", left, right)
            .preserve_vertex(a, x)
            .preserve_vertex(b, x);
        assert!(matches!(rule.validate(), Err(CoverError::InvalidInput(_))));
    }

    #[test]
    fn validate_rejects_rewired_edge() {
        let mut left = Hypergraph::new();
        let [a, b] = [left.add_vertex(), left.add_vertex()];
        let le = left.add_edge("E", vec![a, b]).unwrap();
        let mut right = Hypergraph::new();
        let [x, y] = [right.add_vertex(), right.add_vertex()];
        let re = right.add_edge("E", vec![y, x]).unwrap();
        let rule = Rule::new("flip", left, right)
            .preserve_vertex(a, x)
            .preserve_vertex(b, y)
            .preserve_edge(le, re);
        assert!(rule.validate().is_err());
    }

    fn broadcast() -> UqRule {
        // Base: a hub vertex; quantified: every neighbour via N gets a mark.
        let mut bl = Hypergraph::new();
        let hub = bl.add_vertex();
        let mut br = Hypergraph::new();
        let hub_r = br.add_vertex();
        let base = Rule::new("base", bl, br).preserve_vertex(hub, hub_r);

        let mut ql = Hypergraph::new();
        let [qh, qn] = [ql.add_vertex(), ql.add_vertex()];
        let qe = ql.add_edge("N", vec![qh, qn]).unwrap();
        let mut qr = Hypergraph::new();
        let [rh, rn] = [qr.add_vertex(), qr.add_vertex()];
        let re = qr.add_edge("N", vec![rh, rn]).unwrap();
        qr.add_edge("Mark", vec![rn]).unwrap();
        let quantified = Rule::new("each", ql, qr)
            .preserve_vertex(qh, rh)
            .preserve_vertex(qn, rn)
            .preserve_edge(qe, re);
        UqRule {
            id: "broadcast".into(),
            name: "broadcast".into(),
            base,
            quantified,
            anchors: BTreeMap::from([(qh, hub)]),
        }
    }

    #[test]
    fn instances_glue_copies_at_anchor() {
        let uq = broadcast();
        uq.validate().unwrap();
        let zero = uq.instantiate(0).unwrap();
        assert_eq!(zero.left.vertex_count(), 1);
        let two = uq.instantiate(2).unwrap();
        two.validate().unwrap();
        assert_eq!(two.left.vertex_count(), 3);
        assert_eq!(two.left.edge_count(), 2);
        assert_eq!(two.right.edge_count(), 4);
        assert_eq!(two.created_edges().len(), 2);
        assert_eq!(two.id, RuleId::from("broadcast"));
    }

    #[test]
    fn duplicate_rule_ids_rejected() {
        let mut gts = Gts::new("g");
        gts.add_rule(pendant_rule()).unwrap();
        assert!(gts.add_rule(pendant_rule()).is_err());
    }
}
