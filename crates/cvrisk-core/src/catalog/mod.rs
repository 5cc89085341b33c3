//! Rule catalog.
//!
//! A catalog is the versioned clinical content the engine evaluates: tier
//! rules, the risk factor checklist, metabolic syndrome thresholds, tier
//! labels and recommendations. It is data, not code: catalogs are loaded
//! from YAML/JSON documents or assembled with [`CatalogBuilder`], and every
//! path runs the same validation. A `Catalog` value is therefore always
//! valid, and once built it is never mutated.

mod parser;
mod predicate;
mod schema;
mod store;

pub use parser::{
    CatalogDocument, CatalogError, ComparisonDocument, ConditionDocument, RiskFactorDocument,
    RuleDocument,
};
pub use predicate::{CustomPredicate, EvaluationContext, Predicate, Threshold};
pub use store::CatalogStore;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::attributes::Measure;
use crate::metabolic::MetabolicThresholds;
use crate::types::Tier;

/// Built-in catalog, embedded at compile time.
const BUILTIN_CATALOG_YAML: &str = include_str!("../../../../catalog/default.yaml");

lazy_static! {
    static ref CODE_PATTERN: Regex = Regex::new(r"^[a-z][a-z0-9_]*$").unwrap();
}

/// A tier rule: when `predicate` holds, `tier` is a candidate tier.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique identifier (e.g., "cad_recent_mi")
    pub code: String,

    /// Human-readable description
    pub label: String,

    pub tier: Tier,

    pub predicate: Predicate,

    /// Recommendations specific to this rule
    pub advice: Vec<String>,
}

impl Rule {
    pub fn new(
        code: impl Into<String>,
        label: impl Into<String>,
        tier: Tier,
        predicate: Predicate,
    ) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            tier,
            predicate,
            advice: Vec::new(),
        }
    }

    pub fn with_advice(mut self, advice: Vec<String>) -> Self {
        self.advice = advice;
        self
    }
}

/// A checklist entry definition.
#[derive(Debug, Clone)]
pub struct RiskFactorDefinition {
    pub code: String,
    pub label: String,
    pub predicate: Predicate,
}

/// Where to load a catalog from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// The catalog shipped with the crate
    Builtin,
    Yaml(String),
    Json(String),
    /// A file; `.json` files are parsed as JSON, everything else as YAML
    File(PathBuf),
}

/// A validated, immutable rule catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    version: String,
    description: Option<String>,
    tier_labels: BTreeMap<Tier, String>,
    metabolic_thresholds: MetabolicThresholds,
    risk_factors: Vec<RiskFactorDefinition>,
    rules: Vec<Rule>,
    recommendations: BTreeMap<Tier, Vec<String>>,
}

impl Catalog {
    /// Parse a catalog from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        parser::parse_yaml(yaml)
    }

    /// Parse a catalog from JSON string.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        parser::parse_json(json)
    }

    /// Parse a catalog file, choosing the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG_YAML)
    }

    pub fn load(source: &CatalogSource) -> Result<Self, CatalogError> {
        match source {
            CatalogSource::Builtin => Self::builtin(),
            CatalogSource::Yaml(yaml) => Self::from_yaml(yaml),
            CatalogSource::Json(json) => Self::from_json(json),
            CatalogSource::File(path) => Self::from_file(path),
        }
    }

    /// A catalog without rules or risk factors. Every evaluation against it
    /// resolves to the undefined tier.
    pub fn empty() -> Self {
        Self {
            name: "empty".to_string(),
            version: "0".to_string(),
            description: None,
            tier_labels: BTreeMap::new(),
            metabolic_thresholds: MetabolicThresholds::default(),
            risk_factors: Vec::new(),
            rules: Vec::new(),
            recommendations: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Tier rules, in priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, code: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.code == code)
    }

    /// Checklist definitions, in display order.
    pub fn risk_factors(&self) -> &[RiskFactorDefinition] {
        &self.risk_factors
    }

    pub fn metabolic_thresholds(&self) -> &MetabolicThresholds {
        &self.metabolic_thresholds
    }

    /// Localized label, falling back to the English tier name.
    pub fn tier_label(&self, tier: Tier) -> &str {
        self.tier_labels
            .get(&tier)
            .map(String::as_str)
            .unwrap_or_else(|| tier.fallback_label())
    }

    /// Configured recommendations for a tier; empty when none are configured.
    pub fn recommendations_for(&self, tier: Tier) -> &[String] {
        self.recommendations
            .get(&tier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Assembles a catalog in code.
///
/// `build` enforces the catalog invariants:
/// - name and version are present
/// - codes are lowercase snake_case and unique (rules and risk factors are
///   separate namespaces)
/// - no rule targets the undefined tier
/// - combinators are non-empty
/// - risk factor predicates do not reference the risk factor count
pub struct CatalogBuilder {
    name: String,
    version: String,
    description: Option<String>,
    tier_labels: BTreeMap<Tier, String>,
    metabolic_thresholds: MetabolicThresholds,
    risk_factors: Vec<RiskFactorDefinition>,
    rules: Vec<Rule>,
    recommendations: BTreeMap<Tier, Vec<String>>,
}

impl CatalogBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            tier_labels: BTreeMap::new(),
            metabolic_thresholds: MetabolicThresholds::default(),
            risk_factors: Vec::new(),
            rules: Vec::new(),
            recommendations: BTreeMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tier_label(mut self, tier: Tier, label: impl Into<String>) -> Self {
        self.tier_labels.insert(tier, label.into());
        self
    }

    pub fn metabolic_thresholds(mut self, thresholds: MetabolicThresholds) -> Self {
        self.metabolic_thresholds = thresholds;
        self
    }

    pub fn risk_factor(
        mut self,
        code: impl Into<String>,
        label: impl Into<String>,
        predicate: Predicate,
    ) -> Self {
        self.risk_factors.push(RiskFactorDefinition {
            code: code.into(),
            label: label.into(),
            predicate,
        });
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn recommendations(mut self, tier: Tier, recommendations: Vec<String>) -> Self {
        self.recommendations.insert(tier, recommendations);
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name".to_string()));
        }
        if self.version.trim().is_empty() {
            return Err(CatalogError::MissingField("catalog_version".to_string()));
        }

        let mut seen = HashSet::new();
        for factor in &self.risk_factors {
            validate_code(&factor.code)?;
            if !seen.insert(factor.code.as_str()) {
                return Err(CatalogError::DuplicateRiskFactorCode(factor.code.clone()));
            }
            let owner = format!("risk factor {}", factor.code);
            validate_predicate(&owner, &factor.predicate, false)?;
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            validate_code(&rule.code)?;
            if !seen.insert(rule.code.as_str()) {
                return Err(CatalogError::DuplicateRuleCode(rule.code.clone()));
            }
            if rule.tier.is_undefined() {
                return Err(CatalogError::UndefinedTier(rule.code.clone()));
            }
            let owner = format!("rule {}", rule.code);
            validate_predicate(&owner, &rule.predicate, true)?;
        }

        Ok(Catalog {
            name: self.name,
            version: self.version,
            description: self.description,
            tier_labels: self.tier_labels,
            metabolic_thresholds: self.metabolic_thresholds,
            risk_factors: self.risk_factors,
            rules: self.rules,
            recommendations: self.recommendations,
        })
    }
}

fn validate_code(code: &str) -> Result<(), CatalogError> {
    if CODE_PATTERN.is_match(code) {
        Ok(())
    } else {
        Err(CatalogError::InvalidCode(code.to_string()))
    }
}

fn validate_predicate(
    owner: &str,
    predicate: &Predicate,
    allow_risk_factor_count: bool,
) -> Result<(), CatalogError> {
    let mut error = None;

    predicate.walk(&mut |node| {
        if error.is_some() {
            return;
        }
        error = match node {
            Predicate::All(predicates) if predicates.is_empty() => {
                Some(CatalogError::EmptyCondition {
                    owner: owner.to_string(),
                    combinator: "all",
                })
            }
            Predicate::Any(predicates) if predicates.is_empty() => {
                Some(CatalogError::EmptyCondition {
                    owner: owner.to_string(),
                    combinator: "any",
                })
            }
            _ => None,
        };
    });

    if error.is_none()
        && !allow_risk_factor_count
        && predicate.measures().contains(&Measure::RiskFactorCount)
    {
        error = Some(CatalogError::InvalidReference {
            owner: owner.to_string(),
            name: Measure::RiskFactorCount.name().to_string(),
            reason: "the risk factor count is not known while the checklist is built".to_string(),
        });
    }

    match error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Flag;

    fn builder() -> CatalogBuilder {
        CatalogBuilder::new("Test", "1.0")
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.rules().is_empty());
        assert_eq!(catalog.risk_factors().len(), 6);
        assert_eq!(catalog.tier_label(Tier::ExtremelyHigh), "極高");
        assert_eq!(catalog.tier_label(Tier::Undefined), "未定義");
    }

    #[test]
    fn test_builtin_rules_ordered_by_severity() {
        let catalog = Catalog::builtin().unwrap();
        let tiers: Vec<Tier> = catalog.rules().iter().map(|rule| rule.tier).collect();
        assert!(tiers.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_builder_rejects_duplicate_rule_codes() {
        let result = builder()
            .rule(Rule::new("ckd", "CKD", Tier::High, Predicate::flag(Flag::HasCkd)))
            .rule(Rule::new("ckd", "CKD again", Tier::Low, Predicate::flag(Flag::HasCkd)))
            .build();
        assert!(matches!(result, Err(CatalogError::DuplicateRuleCode(_))));
    }

    #[test]
    fn test_rule_and_risk_factor_codes_are_separate_namespaces() {
        let result = builder()
            .risk_factor("smoking", "Smoking", Predicate::flag(Flag::IsSmoker))
            .rule(Rule::new("smoking", "Smoker", Tier::Low, Predicate::flag(Flag::IsSmoker)))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_rejects_duplicate_risk_factor_codes() {
        let result = builder()
            .risk_factor("smoking", "Smoking", Predicate::flag(Flag::IsSmoker))
            .risk_factor("smoking", "Smoking", Predicate::flag(Flag::IsSmoker))
            .build();
        assert!(matches!(result, Err(CatalogError::DuplicateRiskFactorCode(_))));
    }

    #[test]
    fn test_builder_rejects_invalid_code() {
        let result = builder()
            .rule(Rule::new("LDL 190", "LDL", Tier::High, Predicate::flag(Flag::HasCkd)))
            .build();
        assert!(matches!(result, Err(CatalogError::InvalidCode(_))));
    }

    #[test]
    fn test_builder_rejects_undefined_tier() {
        let result = builder()
            .rule(Rule::new("none", "None", Tier::Undefined, Predicate::flag(Flag::HasCkd)))
            .build();
        assert!(matches!(result, Err(CatalogError::UndefinedTier(_))));
    }

    #[test]
    fn test_builder_rejects_empty_combinator() {
        let result = builder()
            .rule(Rule::new(
                "nested",
                "Nested",
                Tier::High,
                Predicate::not(Predicate::any(vec![])),
            ))
            .build();
        assert!(matches!(
            result,
            Err(CatalogError::EmptyCondition { combinator: "any", .. })
        ));
    }

    #[test]
    fn test_risk_factor_rejects_nested_risk_factor_count() {
        let result = builder()
            .risk_factor(
                "crowded",
                "Crowded",
                Predicate::all(vec![
                    Predicate::flag(Flag::IsSmoker),
                    Predicate::not(Predicate::at_least(Measure::RiskFactorCount, 1.0)),
                ]),
            )
            .build();
        assert!(matches!(
            result,
            Err(CatalogError::InvalidReference { ref name, .. }) if name == "risk_factor_count"
        ));

        let rule_may_reference = builder()
            .rule(Rule::new(
                "crowded",
                "Crowded",
                Tier::High,
                Predicate::at_least(Measure::RiskFactorCount, 3.0),
            ))
            .build();
        assert!(rule_may_reference.is_ok());
    }

    #[test]
    fn test_builder_rejects_missing_name() {
        let result = CatalogBuilder::new("  ", "1.0").build();
        assert!(matches!(result, Err(CatalogError::MissingField(_))));
    }

    #[test]
    fn test_custom_predicate_rule() {
        let catalog = builder()
            .rule(Rule::new(
                "recurrent_mi",
                "Three or more myocardial infarctions",
                Tier::ExtremelyHigh,
                Predicate::custom(|ctx| ctx.attributes().mi_history_count >= 3),
            ))
            .build()
            .unwrap();
        assert!(catalog.rule("recurrent_mi").is_some());
    }

    #[test]
    fn test_missing_recommendations_are_empty() {
        let catalog = builder().build().unwrap();
        assert!(catalog.recommendations_for(Tier::High).is_empty());
        assert_eq!(catalog.tier_label(Tier::High), "High");
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("cvrisk-catalog-{}.json", std::process::id()));
        fs::write(&json_path, r#"{ "catalog_version": "3", "name": "From JSON" }"#).unwrap();
        let catalog = Catalog::load(&CatalogSource::File(json_path.clone())).unwrap();
        assert_eq!(catalog.name(), "From JSON");
        fs::remove_file(json_path).unwrap();

        let missing = Catalog::from_file(dir.join("cvrisk-no-such-catalog.yaml"));
        assert!(matches!(missing, Err(CatalogError::IoError(_))));
    }
}
