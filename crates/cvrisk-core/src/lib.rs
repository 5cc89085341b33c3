//! # cvrisk-core
//!
//! Deterministic, rule-based cardiovascular risk stratification.
//!
//! Given a validated patient attribute set, the engine answers:
//! - Which risk tier applies?
//! - Which catalog rules justify it?
//! - Which classic risk factors are present?
//! - What is the metabolic syndrome status?
//! - What should happen next?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input and catalog always produce the same result,
//!    apart from the evaluation timestamp
//! 2. **Data-driven**: Clinical content lives in the rule catalog, not in code
//! 3. **Traceable**: Every tier is backed by the matched rules that produced it
//! 4. **Never fails on missing data**: Unknown values degrade to the
//!    undefined tier instead of an error
//! 5. **Parallel-safe**: Evaluation reads an immutable catalog snapshot
//!
//! ## Example
//!
//! ```rust,ignore
//! use cvrisk_core::{evaluate, AttributeSet, Tier};
//!
//! let attributes: AttributeSet = serde_json::from_str(r#"{ "is_male": true, "has_cad": true, "mi_within_1_year": true }"#)?;
//! let assessment = evaluate(&attributes);
//!
//! assert_eq!(assessment.level_code, Tier::ExtremelyHigh);
//! for rule in &assessment.matched_rules {
//!     println!("{}: {}", rule.code, rule.label);
//! }
//! ```

pub mod assembler;
pub mod attributes;
pub mod catalog;
pub mod checklist;
pub mod engine;
pub mod metabolic;
pub mod recommendations;
pub mod resolver;
pub mod types;

// Re-export main types at crate root
pub use assembler::ResultAssembler;
pub use attributes::{AttributeSet, Flag, Gender, Measure, UnknownAttribute};
pub use catalog::{
    Catalog, CatalogBuilder, CatalogError, CatalogSource, CatalogStore, EvaluationContext,
    Predicate, RiskFactorDefinition, Rule, Threshold,
};
pub use checklist::RiskFactorChecklist;
pub use engine::Engine;
pub use metabolic::MetabolicThresholds;
pub use resolver::TierResolution;
pub use types::{
    Assessment, InvalidTier, MatchedRule, MetabolicBasis, MetabolicComponents, MetabolicSyndrome,
    RiskFactorItem, Tier,
};

use std::sync::Arc;

/// Evaluate an attribute set against the active catalog.
///
/// This is the main entry point. The active catalog is the built-in one
/// unless [`load_catalog`] installed another.
///
/// # Returns
///
/// An `Assessment` containing:
/// - `level` / `level_code`: the tier, localized and as a code
/// - `matched_rules`: every rule that held, in catalog order
/// - `risk_factors`: the full checklist
/// - `metabolic_syndrome`: count, components and how they were obtained
/// - `recommendations`: advice for the tier
/// - `evaluated_at`: timestamp of evaluation
pub fn evaluate(attributes: &AttributeSet) -> Assessment {
    CatalogStore::global().engine().evaluate(attributes)
}

/// Load a catalog and make it the active one.
///
/// The catalog is fully validated before it is installed. On error the
/// previously active catalog stays in force and the error is returned.
pub fn load_catalog(source: &CatalogSource) -> Result<Arc<Catalog>, CatalogError> {
    CatalogStore::global().reload(source)
}

/// The active catalog snapshot.
pub fn active_catalog() -> Arc<Catalog> {
    CatalogStore::global().snapshot()
}
