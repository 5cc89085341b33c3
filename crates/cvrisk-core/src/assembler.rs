//! Result assembly.
//!
//! Combines the outputs of the pipeline stages into an [`Assessment`] and
//! stamps the evaluation time. Reading the clock is the only side effect in
//! the pipeline.

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::checklist::RiskFactorChecklist;
use crate::resolver::TierResolution;
use crate::types::{Assessment, MetabolicSyndrome};

/// Builds the final assessment against one catalog snapshot.
pub struct ResultAssembler<'c> {
    catalog: &'c Catalog,
}

impl<'c> ResultAssembler<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    /// Assemble the assessment, stamped with the current time.
    pub fn assemble(
        &self,
        checklist: RiskFactorChecklist,
        metabolic_syndrome: MetabolicSyndrome,
        resolution: &TierResolution<'_>,
        recommendations: Vec<String>,
    ) -> Assessment {
        self.assemble_at(checklist, metabolic_syndrome, resolution, recommendations, Utc::now())
    }

    /// Assemble the assessment with an explicit evaluation time.
    pub fn assemble_at(
        &self,
        checklist: RiskFactorChecklist,
        metabolic_syndrome: MetabolicSyndrome,
        resolution: &TierResolution<'_>,
        recommendations: Vec<String>,
        evaluated_at: DateTime<Utc>,
    ) -> Assessment {
        Assessment {
            level: self.catalog.tier_label(resolution.tier).to_string(),
            level_code: resolution.tier,
            matched_rules: resolution.matched_rules(),
            risk_factor_count: checklist.present_count(),
            risk_factors: checklist.into_items(),
            metabolic_syndrome,
            recommendations,
            catalog_version: self.catalog.version().to_string(),
            evaluated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeSet;
    use crate::catalog::EvaluationContext;
    use crate::resolver;
    use crate::types::Tier;
    use chrono::TimeZone;

    #[test]
    fn test_assemble_undefined_result() {
        let catalog = Catalog::builtin().unwrap();
        let attributes = AttributeSet::default();
        let metabolic = MetabolicSyndrome::unavailable();
        let ctx = EvaluationContext::new(&attributes, &metabolic);
        let checklist = RiskFactorChecklist::build(catalog.risk_factors(), &ctx);
        let resolution = resolver::resolve(catalog.rules(), &ctx.with_risk_factor_count(0));

        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let assessment = ResultAssembler::new(&catalog).assemble_at(
            checklist,
            metabolic,
            &resolution,
            Vec::new(),
            at,
        );

        assert_eq!(assessment.level_code, Tier::Undefined);
        assert_eq!(assessment.level, "未定義");
        assert!(assessment.matched_rules.is_empty());
        assert_eq!(assessment.risk_factor_count, 0);
        assert_eq!(assessment.risk_factors.len(), catalog.risk_factors().len());
        assert_eq!(assessment.metabolic_syndrome, metabolic);
        assert_eq!(assessment.catalog_version, catalog.version());
        assert_eq!(assessment.evaluated_at, at);
    }

    #[test]
    fn test_assemble_stamps_current_time() {
        let catalog = Catalog::empty();
        let attributes = AttributeSet::default();
        let metabolic = MetabolicSyndrome::unavailable();
        let ctx = EvaluationContext::new(&attributes, &metabolic);
        let checklist = RiskFactorChecklist::build(catalog.risk_factors(), &ctx);
        let resolution = resolver::resolve(catalog.rules(), &ctx);

        let before = Utc::now();
        let assessment =
            ResultAssembler::new(&catalog).assemble(checklist, metabolic, &resolution, Vec::new());
        assert!(assessment.evaluated_at >= before);
        assert_eq!(assessment.level, "Undefined");
    }
}
