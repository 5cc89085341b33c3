//! Core types shared across the evaluation pipeline.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categorical risk tier, most severe first.
///
/// `Undefined` is the terminal value: no rule matched, so there is no basis
/// to classify. Catalog rules can never target it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ExtremelyHigh,
    VeryHigh,
    High,
    Medium,
    Low,
    Undefined,
}

impl Tier {
    /// All tiers, most severe first.
    pub const ALL: [Tier; 6] = [
        Tier::ExtremelyHigh,
        Tier::VeryHigh,
        Tier::High,
        Tier::Medium,
        Tier::Low,
        Tier::Undefined,
    ];

    /// Severity rank; higher is more severe, `Undefined` is 0.
    pub fn severity(&self) -> u8 {
        match self {
            Tier::ExtremelyHigh => 5,
            Tier::VeryHigh => 4,
            Tier::High => 3,
            Tier::Medium => 2,
            Tier::Low => 1,
            Tier::Undefined => 0,
        }
    }

    /// Stable wire code, e.g. `very_high`.
    pub fn code(&self) -> &'static str {
        match self {
            Tier::ExtremelyHigh => "extremely_high",
            Tier::VeryHigh => "very_high",
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
            Tier::Undefined => "undefined",
        }
    }

    /// Label used when a catalog does not localize this tier.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            Tier::ExtremelyHigh => "Extremely high",
            Tier::VeryHigh => "Very high",
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
            Tier::Undefined => "Undefined",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Tier::Undefined)
    }
}

impl Ord for Tier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl PartialOrd for Tier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A tier code outside the tier domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown tier '{0}'")]
pub struct InvalidTier(pub String);

impl FromStr for Tier {
    type Err = InvalidTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .iter()
            .copied()
            .find(|tier| tier.code() == s)
            .ok_or_else(|| InvalidTier(s.to_string()))
    }
}

/// A catalog rule whose predicate held for the evaluated attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub code: String,
    pub label: String,
}

/// One checklist entry; emitted for every catalog risk factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactorItem {
    pub code: String,
    pub label: String,
    pub present: bool,
}

/// Hit state of the five metabolic syndrome components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicComponents {
    pub abdominal_obesity: bool,
    pub elevated_blood_pressure: bool,
    pub elevated_glucose: bool,
    pub elevated_triglyceride: bool,
    pub low_hdl: bool,
}

impl MetabolicComponents {
    /// Number of components that are present.
    pub fn count(&self) -> u8 {
        [
            self.abdominal_obesity,
            self.elevated_blood_pressure,
            self.elevated_glucose,
            self.elevated_triglyceride,
            self.low_hdl,
        ]
        .iter()
        .filter(|present| **present)
        .count() as u8
    }
}

/// Where a metabolic syndrome count came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetabolicBasis {
    /// Every component was evaluated from raw measurements.
    Measured,
    /// Measurements were incomplete; the caller's precomputed count is used
    /// and components are left unknown.
    Supplied,
    /// Neither measurements nor a precomputed count were available.
    #[default]
    Unavailable,
}

/// Metabolic syndrome count and component breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetabolicSyndrome {
    /// Present components, 0..=5.
    pub count: u8,
    pub components: MetabolicComponents,
    pub basis: MetabolicBasis,
}

impl MetabolicSyndrome {
    pub fn measured(components: MetabolicComponents) -> Self {
        Self {
            count: components.count(),
            components,
            basis: MetabolicBasis::Measured,
        }
    }

    pub fn supplied(count: u8) -> Self {
        Self {
            count,
            components: MetabolicComponents::default(),
            basis: MetabolicBasis::Supplied,
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Final risk stratification for one attribute set.
///
/// Serialized in the camelCase shape the HTTP layer returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Localized tier label
    pub level: String,

    pub level_code: Tier,

    /// Every matched rule, in catalog order
    pub matched_rules: Vec<MatchedRule>,

    pub risk_factor_count: usize,

    /// Full checklist, one entry per catalog risk factor
    pub risk_factors: Vec<RiskFactorItem>,

    pub metabolic_syndrome: MetabolicSyndrome,

    pub recommendations: Vec<String>,

    /// Version of the catalog snapshot that produced this result
    pub catalog_version: String,

    pub evaluated_at: DateTime<Utc>,
}
