//! Risk factor checklist.
//!
//! Every catalog risk factor is listed, present or not, in catalog order,
//! so the checklist has the same shape on every call.

use crate::catalog::{EvaluationContext, RiskFactorDefinition};
use crate::types::RiskFactorItem;

/// Checklist of catalog risk factors for one attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskFactorChecklist {
    items: Vec<RiskFactorItem>,
}

impl RiskFactorChecklist {
    pub fn build(definitions: &[RiskFactorDefinition], ctx: &EvaluationContext<'_>) -> Self {
        let items = definitions
            .iter()
            .map(|definition| RiskFactorItem {
                code: definition.code.clone(),
                label: definition.label.clone(),
                present: definition.predicate.evaluate(ctx),
            })
            .collect();

        Self { items }
    }

    /// Number of present risk factors.
    pub fn present_count(&self) -> usize {
        self.items.iter().filter(|item| item.present).count()
    }

    pub fn items(&self) -> &[RiskFactorItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<RiskFactorItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::catalog::Catalog;
    use crate::types::MetabolicSyndrome;

    fn checklist(attributes: &AttributeSet, metabolic: &MetabolicSyndrome) -> RiskFactorChecklist {
        let catalog = Catalog::builtin().unwrap();
        let ctx = EvaluationContext::new(attributes, metabolic);
        RiskFactorChecklist::build(catalog.risk_factors(), &ctx)
    }

    fn present_codes(checklist: &RiskFactorChecklist) -> Vec<&str> {
        checklist
            .items()
            .iter()
            .filter(|item| item.present)
            .map(|item| item.code.as_str())
            .collect()
    }

    #[test]
    fn test_empty_profile_lists_every_factor_absent() {
        let checklist = checklist(&AttributeSet::default(), &MetabolicSyndrome::default());
        assert_eq!(checklist.len(), 6);
        assert_eq!(checklist.present_count(), 0);
        let codes: Vec<&str> = checklist.items().iter().map(|item| item.code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["hypertension", "age", "family_history", "low_hdl", "smoking", "metabolic_syndrome"]
        );
    }

    #[test]
    fn test_age_threshold_depends_on_sex() {
        let male = AttributeSet {
            is_male: true,
            age: Some(45.0),
            ..Default::default()
        };
        let female = AttributeSet {
            age: Some(54.0),
            ..Default::default()
        };
        let metabolic = MetabolicSyndrome::default();
        assert_eq!(present_codes(&checklist(&male, &metabolic)), vec!["age"]);
        assert!(present_codes(&checklist(&female, &metabolic)).is_empty());
    }

    #[test]
    fn test_low_hdl_depends_on_sex() {
        let female = AttributeSet {
            hdl_c: Some(45.0),
            ..Default::default()
        };
        let male = AttributeSet {
            is_male: true,
            hdl_c: Some(45.0),
            ..Default::default()
        };
        let metabolic = MetabolicSyndrome::default();
        assert_eq!(present_codes(&checklist(&female, &metabolic)), vec!["low_hdl"]);
        assert!(present_codes(&checklist(&male, &metabolic)).is_empty());
    }

    #[test]
    fn test_metabolic_syndrome_factor_uses_resolved_count() {
        let attributes = AttributeSet::default();
        assert_eq!(
            present_codes(&checklist(&attributes, &MetabolicSyndrome::supplied(3))),
            vec!["metabolic_syndrome"]
        );
        assert!(present_codes(&checklist(&attributes, &MetabolicSyndrome::supplied(2))).is_empty());
    }

    #[test]
    fn test_flag_factors() {
        let attributes = AttributeSet {
            has_hypertension: true,
            family_history_early_chd: true,
            is_smoker: true,
            ..Default::default()
        };
        let checklist = checklist(&attributes, &MetabolicSyndrome::default());
        assert_eq!(
            present_codes(&checklist),
            vec!["hypertension", "family_history", "smoking"]
        );
        assert_eq!(checklist.present_count(), 3);
    }
}
