//! Tier resolution.
//!
//! Every rule is evaluated in catalog order. All matches are kept, and the
//! final tier is the most severe tier among them, or `Undefined` when
//! nothing matched. Rules sharing a tier are all retained even though only
//! one tier value is reported.

use crate::catalog::{EvaluationContext, Rule};
use crate::types::{MatchedRule, Tier};

/// Outcome of evaluating the catalog rules.
#[derive(Debug, Clone)]
pub struct TierResolution<'c> {
    pub tier: Tier,

    /// Matched rules in catalog order.
    pub matched: Vec<&'c Rule>,
}

impl<'c> TierResolution<'c> {
    pub fn matched_rules(&self) -> Vec<MatchedRule> {
        self.matched
            .iter()
            .map(|rule| MatchedRule {
                code: rule.code.clone(),
                label: rule.label.clone(),
            })
            .collect()
    }

    pub fn matched_codes(&self) -> Vec<&'c str> {
        self.matched.iter().map(|rule| rule.code.as_str()).collect()
    }

    /// Matched rules that carry the reported tier.
    pub fn decisive(&self) -> impl Iterator<Item = &'c Rule> + '_ {
        self.matched
            .iter()
            .copied()
            .filter(move |rule| rule.tier == self.tier)
    }
}

/// Evaluate `rules` against the context and pick the final tier.
pub fn resolve<'c>(rules: &'c [Rule], ctx: &EvaluationContext<'_>) -> TierResolution<'c> {
    let matched: Vec<&Rule> = rules
        .iter()
        .filter(|rule| rule.predicate.evaluate(ctx))
        .collect();

    let tier = matched
        .iter()
        .map(|rule| rule.tier)
        .max()
        .unwrap_or(Tier::Undefined);

    TierResolution { tier, matched }
}
