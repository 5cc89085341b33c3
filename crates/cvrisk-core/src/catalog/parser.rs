//! Catalog parsing from YAML/JSON.
//!
//! Loading goes through four gates, and any failure rejects the whole
//! document:
//! 1. syntax (YAML or JSON)
//! 2. JSON Schema validation of the document shape
//! 3. typed deserialization
//! 4. compilation: tier names, attribute references and the invariants
//!    enforced by [`CatalogBuilder`]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attributes::{Flag, Measure};
use crate::metabolic::MetabolicThresholds;
use crate::types::{InvalidTier, Tier};

use super::predicate::{Predicate, Threshold};
use super::schema::validate_catalog_schema;
use super::{Catalog, CatalogBuilder, Rule};

/// Errors that can occur when loading a catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Catalog schema validation failed: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid code '{0}': expected lowercase letters, digits and underscores")]
    InvalidCode(String),

    #[error("Duplicate rule code: {0}")]
    DuplicateRuleCode(String),

    #[error("Duplicate risk factor code: {0}")]
    DuplicateRiskFactorCode(String),

    #[error("Unknown tier '{tier}' in {owner}")]
    UnknownTier { owner: String, tier: String },

    #[error("Rule {0} targets the terminal 'undefined' tier")]
    UndefinedTier(String),

    #[error("Unknown {kind} '{name}' referenced by {owner}")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        name: String,
    },

    #[error("Invalid reference '{name}' in {owner}: {reason}")]
    InvalidReference {
        owner: String,
        name: String,
        reason: String,
    },

    #[error("Empty '{combinator}' condition in {owner}")]
    EmptyCondition {
        owner: String,
        combinator: &'static str,
    },
}

/// Serialized form of a catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogDocument {
    /// Version of this catalog (dotted numeric)
    pub catalog_version: String,

    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Localized tier labels keyed by tier code
    #[serde(default)]
    pub tiers: BTreeMap<String, String>,

    #[serde(default)]
    pub metabolic_syndrome: MetabolicThresholds,

    /// Checklist risk factors, in display order
    #[serde(default)]
    pub risk_factors: Vec<RiskFactorDocument>,

    /// Tier rules, in priority order
    #[serde(default)]
    pub rules: Vec<RuleDocument>,

    /// Recommendations keyed by tier code
    #[serde(default)]
    pub recommendations: BTreeMap<String, Vec<String>>,
}

/// A checklist risk factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskFactorDocument {
    pub code: String,
    pub label: String,
    pub when: ConditionDocument,
}

/// A tier rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDocument {
    pub code: String,
    pub label: String,
    pub tier: String,
    pub when: ConditionDocument,

    /// Rule-specific recommendations
    #[serde(default)]
    pub advice: Vec<String>,
}

/// Declarative predicate, written as a single-key map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionDocument {
    Flag(String),
    AtLeast(ComparisonDocument),
    Below(ComparisonDocument),
    All(Vec<ConditionDocument>),
    Any(Vec<ConditionDocument>),
    Not(Box<ConditionDocument>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonDocument {
    pub measure: String,
    pub value: Threshold,
}

/// Parse and validate a YAML catalog.
pub fn parse_yaml(yaml: &str) -> Result<Catalog, CatalogError> {
    let value: serde_json::Value = serde_yaml::from_str(yaml)?;
    parse_value(value)
}

/// Parse and validate a JSON catalog.
pub fn parse_json(json: &str) -> Result<Catalog, CatalogError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    parse_value(value)
}

fn parse_value(value: serde_json::Value) -> Result<Catalog, CatalogError> {
    validate_catalog_schema(&value).map_err(CatalogError::SchemaError)?;
    let document: CatalogDocument = serde_json::from_value(value)?;
    document.compile()
}

impl CatalogDocument {
    /// Resolve names and hand the typed catalog to the builder for the
    /// structural checks.
    pub fn compile(self) -> Result<Catalog, CatalogError> {
        let mut builder = CatalogBuilder::new(self.name, self.catalog_version)
            .metabolic_thresholds(self.metabolic_syndrome);

        if let Some(description) = self.description {
            builder = builder.description(description);
        }

        for (code, label) in self.tiers {
            let tier = parse_tier("tiers", &code)?;
            builder = builder.tier_label(tier, label);
        }

        for factor in self.risk_factors {
            let owner = format!("risk factor {}", factor.code);
            let predicate = factor.when.compile(&owner)?;
            builder = builder.risk_factor(factor.code, factor.label, predicate);
        }

        for rule in self.rules {
            let owner = format!("rule {}", rule.code);
            let tier = parse_tier(&owner, &rule.tier)?;
            let predicate = rule.when.compile(&owner)?;
            builder = builder
                .rule(Rule::new(rule.code, rule.label, tier, predicate).with_advice(rule.advice));
        }

        for (code, recommendations) in self.recommendations {
            let tier = parse_tier("recommendations", &code)?;
            builder = builder.recommendations(tier, recommendations);
        }

        builder.build()
    }
}

impl ConditionDocument {
    fn compile(self, owner: &str) -> Result<Predicate, CatalogError> {
        Ok(match self {
            ConditionDocument::Flag(name) => {
                Predicate::Flag(name.parse::<Flag>().map_err(|_| CatalogError::UnknownReference {
                    owner: owner.to_string(),
                    kind: "flag",
                    name,
                })?)
            }
            ConditionDocument::AtLeast(comparison) => {
                Predicate::at_least(comparison.parse_measure(owner)?, comparison.value)
            }
            ConditionDocument::Below(comparison) => {
                Predicate::below(comparison.parse_measure(owner)?, comparison.value)
            }
            ConditionDocument::All(conditions) => {
                Predicate::All(compile_all(conditions, owner)?)
            }
            ConditionDocument::Any(conditions) => {
                Predicate::Any(compile_all(conditions, owner)?)
            }
            ConditionDocument::Not(condition) => Predicate::not(condition.compile(owner)?),
        })
    }
}

fn compile_all(conditions: Vec<ConditionDocument>, owner: &str) -> Result<Vec<Predicate>, CatalogError> {
    conditions
        .into_iter()
        .map(|condition| condition.compile(owner))
        .collect()
}

impl ComparisonDocument {
    fn parse_measure(&self, owner: &str) -> Result<Measure, CatalogError> {
        self.measure
            .parse::<Measure>()
            .map_err(|_| CatalogError::UnknownReference {
                owner: owner.to_string(),
                kind: "measure",
                name: self.measure.clone(),
            })
    }
}

fn parse_tier(owner: &str, code: &str) -> Result<Tier, CatalogError> {
    code.parse::<Tier>().map_err(|InvalidTier(tier)| CatalogError::UnknownTier {
        owner: owner.to_string(),
        tier,
    })
}
