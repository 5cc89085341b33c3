//! Plain-text output.

use std::fmt;

use cvrisk_core::{Assessment, Catalog, MetabolicBasis, Tier};

/// Human-readable assessment report.
pub struct AssessmentReport<'a>(pub &'a Assessment);

impl fmt::Display for AssessmentReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assessment = self.0;

        writeln!(f, "Risk tier:    {} ({})", assessment.level, assessment.level_code)?;
        writeln!(f, "Catalog:      {}", assessment.catalog_version)?;
        writeln!(f, "Evaluated at: {}", assessment.evaluated_at.to_rfc3339())?;

        writeln!(f)?;
        writeln!(f, "Matched rules:")?;
        if assessment.matched_rules.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for rule in &assessment.matched_rules {
            writeln!(f, "  - {}: {}", rule.code, rule.label)?;
        }

        writeln!(f)?;
        writeln!(f, "Risk factors ({} present):", assessment.risk_factor_count)?;
        for item in &assessment.risk_factors {
            writeln!(f, "  {} {}: {}", checkbox(item.present), item.code, item.label)?;
        }

        let metabolic = &assessment.metabolic_syndrome;
        writeln!(f)?;
        writeln!(
            f,
            "Metabolic syndrome: {} of 5 components ({})",
            metabolic.count,
            basis_label(metabolic.basis)
        )?;
        if metabolic.basis == MetabolicBasis::Measured {
            let components = &metabolic.components;
            for (present, name) in [
                (components.abdominal_obesity, "abdominal obesity"),
                (components.elevated_blood_pressure, "elevated blood pressure"),
                (components.elevated_glucose, "elevated glucose"),
                (components.elevated_triglyceride, "elevated triglyceride"),
                (components.low_hdl, "low HDL-C"),
            ] {
                writeln!(f, "  {} {}", checkbox(present), name)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Recommendations:")?;
        if assessment.recommendations.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (i, recommendation) in assessment.recommendations.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, recommendation)?;
        }

        Ok(())
    }
}

/// Catalog contents grouped by tier.
pub struct CatalogListing<'a>(pub &'a Catalog);

impl fmt::Display for CatalogListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let catalog = self.0;

        writeln!(f, "{} (version {})", catalog.name(), catalog.version())?;
        if let Some(description) = catalog.description() {
            writeln!(f, "{}", description.trim_end())?;
        }

        writeln!(f)?;
        writeln!(f, "Rules:")?;
        for tier in Tier::ALL {
            let mut rules = catalog.rules().iter().filter(|rule| rule.tier == tier).peekable();
            if rules.peek().is_none() {
                continue;
            }
            writeln!(f, "  {} ({})", tier, catalog.tier_label(tier))?;
            for rule in rules {
                writeln!(f, "    {}: {}", rule.code, rule.label)?;
                writeln!(f, "      when {}", rule.predicate)?;
                for advice in &rule.advice {
                    writeln!(f, "      advice: {advice}")?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Risk factors:")?;
        for factor in catalog.risk_factors() {
            writeln!(f, "  {}: {}", factor.code, factor.label)?;
            writeln!(f, "    when {}", factor.predicate)?;
        }

        writeln!(f)?;
        writeln!(f, "Recommendations:")?;
        for tier in Tier::ALL {
            let recommendations = catalog.recommendations_for(tier);
            if recommendations.is_empty() {
                continue;
            }
            writeln!(f, "  {tier}:")?;
            for recommendation in recommendations {
                writeln!(f, "    - {recommendation}")?;
            }
        }

        Ok(())
    }
}

fn checkbox(present: bool) -> &'static str {
    if present {
        "[x]"
    } else {
        "[ ]"
    }
}

fn basis_label(basis: MetabolicBasis) -> &'static str {
    match basis {
        MetabolicBasis::Measured => "measured",
        MetabolicBasis::Supplied => "supplied count",
        MetabolicBasis::Unavailable => "no data",
    }
}
