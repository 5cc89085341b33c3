//! Recommendation lookup.
//!
//! The tier's configured recommendations come first, followed by the advice
//! attached to matched rules at that tier, in catalog order. Duplicates keep
//! their first position. A tier without configured recommendations yields an
//! empty list.

use crate::catalog::Catalog;
use crate::resolver::TierResolution;

pub fn resolve(catalog: &Catalog, resolution: &TierResolution<'_>) -> Vec<String> {
    let mut recommendations: Vec<String> = Vec::new();

    let tier_advice = catalog.recommendations_for(resolution.tier).iter();
    let rule_advice = resolution.decisive().flat_map(|rule| rule.advice.iter());

    for advice in tier_advice.chain(rule_advice) {
        if !recommendations.contains(advice) {
            recommendations.push(advice.clone());
        }
    }

    recommendations
}
