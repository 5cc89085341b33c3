//! Evaluation pipeline over one catalog snapshot.
//!
//! Attribute set → metabolic syndrome → risk factor checklist → tier
//! resolution → recommendations → assessment.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::assembler::ResultAssembler;
use crate::attributes::AttributeSet;
use crate::catalog::{Catalog, EvaluationContext};
use crate::checklist::RiskFactorChecklist;
use crate::metabolic;
use crate::recommendations;
use crate::resolver;
use crate::types::Assessment;

/// Evaluates attribute sets against a fixed catalog snapshot.
///
/// Cloning is cheap and the engine holds no mutable state, so one engine can
/// serve any number of threads.
#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Arc<Catalog>,
}

impl Engine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Evaluate an attribute set, stamped with the current time.
    pub fn evaluate(&self, attributes: &AttributeSet) -> Assessment {
        self.evaluate_at(attributes, Utc::now())
    }

    /// Evaluate an attribute set with an explicit evaluation time.
    pub fn evaluate_at(&self, attributes: &AttributeSet, evaluated_at: DateTime<Utc>) -> Assessment {
        let catalog = self.catalog.as_ref();

        let metabolic = metabolic::evaluate(attributes, catalog.metabolic_thresholds());

        let ctx = EvaluationContext::new(attributes, &metabolic);
        let checklist = RiskFactorChecklist::build(catalog.risk_factors(), &ctx);

        let ctx = ctx.with_risk_factor_count(checklist.present_count());
        let resolution = resolver::resolve(catalog.rules(), &ctx);
        let recommendations = recommendations::resolve(catalog, &resolution);

        tracing::debug!(
            catalog_version = catalog.version(),
            tier = %resolution.tier,
            matched = ?resolution.matched_codes(),
            risk_factor_count = checklist.present_count(),
            metabolic_count = metabolic.count,
            metabolic_basis = ?metabolic.basis,
            "Attribute set evaluated"
        );

        ResultAssembler::new(catalog).assemble_at(
            checklist,
            metabolic,
            &resolution,
            recommendations,
            evaluated_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetabolicBasis, Tier};

    fn engine() -> Engine {
        Engine::new(Arc::new(Catalog::builtin().unwrap()))
    }

    fn codes(assessment: &Assessment) -> Vec<&str> {
        assessment
            .matched_rules
            .iter()
            .map(|rule| rule.code.as_str())
            .collect()
    }

    #[test]
    fn test_empty_profile_is_undefined() {
        let assessment = engine().evaluate(&AttributeSet::default());
        assert_eq!(assessment.level_code, Tier::Undefined);
        assert!(assessment.matched_rules.is_empty());
        assert!(assessment.recommendations.is_empty());
        assert_eq!(assessment.metabolic_syndrome.count, 0);
        assert_eq!(assessment.metabolic_syndrome.basis, MetabolicBasis::Unavailable);
        assert!(assessment.risk_factors.iter().all(|item| !item.present));
    }

    #[test]
    fn test_recent_mi_is_extremely_high() {
        let attributes = AttributeSet {
            has_cad: true,
            mi_within_1_year: true,
            has_diabetes: true,
            ..Default::default()
        };
        let assessment = engine().evaluate(&attributes);
        assert_eq!(assessment.level_code, Tier::ExtremelyHigh);
        assert_eq!(assessment.level, "極高");
        assert_eq!(codes(&assessment), vec!["cad_recent_mi", "diabetes"]);
        assert_eq!(assessment.recommendations.len(), 3);
    }

    #[test]
    fn test_low_egfr_is_ckd() {
        let attributes = AttributeSet {
            egfr: Some(45.0),
            ..Default::default()
        };
        let assessment = engine().evaluate(&attributes);
        assert_eq!(assessment.level_code, Tier::High);
        assert_eq!(codes(&assessment), vec!["ckd"]);
    }

    #[test]
    fn test_ldl_threshold_is_inclusive() {
        let at = |ldl: f64| AttributeSet {
            ldl_c: Some(ldl),
            ..Default::default()
        };
        assert_eq!(engine().evaluate(&at(190.0)).level_code, Tier::High);
        assert_eq!(engine().evaluate(&at(189.9)).level_code, Tier::Undefined);
    }

    #[test]
    fn test_risk_factor_count_tiers() {
        let one = AttributeSet {
            is_smoker: true,
            ..Default::default()
        };
        let assessment = engine().evaluate(&one);
        assert_eq!(assessment.level_code, Tier::Low);
        assert_eq!(assessment.risk_factor_count, 1);
        assert_eq!(codes(&assessment), vec!["single_risk_factor"]);

        let two = AttributeSet {
            is_smoker: true,
            has_hypertension: true,
            ..Default::default()
        };
        let assessment = engine().evaluate(&two);
        assert_eq!(assessment.level_code, Tier::Medium);
        assert_eq!(assessment.risk_factor_count, 2);
        assert_eq!(codes(&assessment), vec!["risk_factor_count"]);
    }

    #[test]
    fn test_measured_metabolic_syndrome_counts_as_risk_factor() {
        let attributes = AttributeSet {
            is_male: true,
            waist_cm: Some(95.0),
            systolic: Some(120.0),
            diastolic: Some(80.0),
            fasting_glucose: Some(105.0),
            triglyceride: Some(160.0),
            hdl_c: Some(45.0),
            ..Default::default()
        };
        let assessment = engine().evaluate(&attributes);
        assert_eq!(assessment.metabolic_syndrome.basis, MetabolicBasis::Measured);
        assert_eq!(assessment.metabolic_syndrome.count, 3);
        assert_eq!(assessment.risk_factor_count, 1);
        assert_eq!(assessment.level_code, Tier::Low);
    }

    #[test]
    fn test_evaluate_at_is_deterministic() {
        let attributes = AttributeSet {
            has_pad: true,
            has_carotid_stenosis: true,
            age: Some(70.0),
            ..Default::default()
        };
        let at = Utc::now();
        let engine = engine();
        assert_eq!(
            engine.evaluate_at(&attributes, at),
            engine.evaluate_at(&attributes, at)
        );
    }

    #[test]
    fn test_empty_catalog_always_undefined() {
        let engine = Engine::new(Arc::new(Catalog::empty()));
        let attributes = AttributeSet {
            has_cad: true,
            mi_within_1_year: true,
            ..Default::default()
        };
        let assessment = engine.evaluate(&attributes);
        assert_eq!(assessment.level_code, Tier::Undefined);
        assert!(assessment.risk_factors.is_empty());
    }
}
