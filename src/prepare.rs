//! Rule preparation.
//!
//! Before a search starts, the rules of a [`Gts`] are validated and turned
//! into a [`PreparedGts`]: standard rules by ID, quantified rules by ID, and a
//! lazy bounded enumeration of quantified-rule instances per graph.

use crate::core::Hypergraph;
use crate::error::{CoverError, CoverResult};
use crate::gts::{Gts, Rule, RuleId, UqRule};
use crate::order::Order;
use std::collections::BTreeMap;
use tracing::debug;

/// Turns a GTS into rules usable by a POC enumerator under `order`.
pub trait RulePreparer {
    fn prepare(&self, gts: &Gts, order: &dyn Order) -> CoverResult<PreparedGts>;
}

/// Prepared rule set.
#[derive(Debug, Clone, Default)]
pub struct PreparedGts {
    name: String,
    rules: BTreeMap<RuleId, Rule>,
    uq_rules: BTreeMap<RuleId, UqRule>,
    max_instances: usize,
}

impl PreparedGts {
    /// Name of the source GTS.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of standard rules.
    pub fn standard_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of universally quantified rules (not instances).
    pub fn quantified_count(&self) -> usize {
        self.uq_rules.len()
    }

    /// Standard rule by ID.
    pub fn rule(&self, id: &RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Quantified rule by ID, before instantiation.
    pub fn uq_rule(&self, id: &RuleId) -> Option<&UqRule> {
        self.uq_rules.get(id)
    }

    /// Standard rules in ID order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    /// IDs of the quantified rules in order.
    pub fn uq_rule_ids(&self) -> impl Iterator<Item = &RuleId> {
        self.uq_rules.keys()
    }

    /// Instances of quantified rule `id` worth trying against `graph`.
    ///
    /// Instance `k` has `k` quantified copies; `k` runs from `0` to the
    /// graph's edge count, capped by the configured maximum when non-zero.
    pub fn instances(&self, id: &RuleId, graph: &Hypergraph) -> CoverResult<UqInstances<'_>> {
        let rule = self
            .uq_rules
            .get(id)
            .ok_or_else(|| CoverError::invalid_input(format!("unknown quantified rule {id}")))?;
        let mut bound = graph.edge_count();
        if self.max_instances > 0 {
            bound = bound.min(self.max_instances);
        }
        Ok(UqInstances {
            rule,
            next: 0,
            bound,
        })
    }
}

/// Lazy enumeration of quantified-rule instances `0..=bound`.
#[derive(Debug, Clone)]
pub struct UqInstances<'a> {
    rule: &'a UqRule,
    next: usize,
    bound: usize,
}

impl Iterator for UqInstances<'_> {
    type Item = CoverResult<Rule>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.bound {
            return None;
        }
        let copies = self.next;
        self.next += 1;
        Some(self.rule.instantiate(copies))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.bound + 1).saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for UqInstances<'_> {}

/// Validates every rule and copies it into the prepared set unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPreparer {
    /// Cap on quantified copies per instance, `0` for none.
    pub max_uq_instances: usize,
}

impl DefaultPreparer {
    pub fn new(max_uq_instances: usize) -> Self {
        Self { max_uq_instances }
    }
}

impl RulePreparer for DefaultPreparer {
    fn prepare(&self, gts: &Gts, order: &dyn Order) -> CoverResult<PreparedGts> {
        for rule in gts.rules.values() {
            rule.validate()?;
        }
        for rule in gts.uq_rules.values() {
            rule.validate()?;
        }
        debug!(
            gts = %gts.name,
            order = order.name(),
            standard = gts.rules.len(),
            quantified = gts.uq_rules.len(),
            "rules validated"
        );
        Ok(PreparedGts {
            name: gts.name.clone(),
            rules: gts.rules.clone(),
            uq_rules: gts.uq_rules.clone(),
            max_instances: self.max_uq_instances,
        })
    }
}
