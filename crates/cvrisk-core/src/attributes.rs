//! Patient attribute set.
//!
//! The attribute set is the validated, immutable input of one evaluation.
//! Range checks and enum coercion happen upstream; this module only models
//! the record and exposes its fields by name so catalog predicates can
//! reference them.
//!
//! Every numeric measurement is an `Option`: `None` means "unknown" and is
//! never read as zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reported gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Validated clinical attributes for a single patient.
///
/// Field names follow the request contract (snake_case). Boolean history
/// flags default to `false`; measurements default to unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSet {
    // Demographics
    #[serde(default)]
    pub age: Option<f64>,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub is_male: bool,

    // Disease history
    #[serde(default)]
    pub has_hypertension: bool,
    #[serde(default)]
    pub family_history_early_chd: bool,
    #[serde(default)]
    pub has_diabetes: bool,
    #[serde(default)]
    pub has_ckd: bool,
    #[serde(default)]
    pub has_ascvd_history: bool,
    #[serde(default)]
    pub has_significant_plaque: bool,
    #[serde(default)]
    pub has_cad: bool,
    #[serde(default)]
    pub has_multivessel_obstruction: bool,
    #[serde(default)]
    pub has_acs_with_diabetes: bool,
    #[serde(default)]
    pub has_pad: bool,
    #[serde(default)]
    pub has_carotid_stenosis: bool,
    #[serde(default)]
    pub has_stroke_with_atherosclerosis: bool,

    // Event history
    #[serde(default)]
    pub mi_within_1_year: bool,
    #[serde(default)]
    pub mi_history_count: u32,

    // Labs and measurements
    #[serde(default)]
    pub hdl_c: Option<f64>,
    #[serde(default)]
    pub ldl_c: Option<f64>,
    #[serde(default)]
    pub fasting_glucose: Option<f64>,
    #[serde(default)]
    pub triglyceride: Option<f64>,
    #[serde(default)]
    pub egfr: Option<f64>,
    #[serde(default)]
    pub waist_cm: Option<f64>,
    #[serde(default)]
    pub systolic: Option<f64>,
    #[serde(default)]
    pub diastolic: Option<f64>,
    #[serde(default)]
    pub cac_score: Option<u32>,

    // Medication
    #[serde(default)]
    pub hypertension_medication: bool,
    #[serde(default)]
    pub diabetes_medication: bool,
    #[serde(default)]
    pub lipid_medication: bool,

    // Lifestyle
    #[serde(default)]
    pub is_smoker: bool,

    /// Metabolic syndrome component count computed by the caller, if any.
    #[serde(default)]
    pub metabolic_syndrome_factors: Option<u8>,
}

impl AttributeSet {
    /// Read a boolean attribute.
    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::IsMale => self.is_male,
            Flag::HasHypertension => self.has_hypertension,
            Flag::FamilyHistoryEarlyChd => self.family_history_early_chd,
            Flag::HasDiabetes => self.has_diabetes,
            Flag::HasCkd => self.has_ckd,
            Flag::HasAscvdHistory => self.has_ascvd_history,
            Flag::HasSignificantPlaque => self.has_significant_plaque,
            Flag::HasCad => self.has_cad,
            Flag::HasMultivesselObstruction => self.has_multivessel_obstruction,
            Flag::HasAcsWithDiabetes => self.has_acs_with_diabetes,
            Flag::HasPad => self.has_pad,
            Flag::HasCarotidStenosis => self.has_carotid_stenosis,
            Flag::HasStrokeWithAtherosclerosis => self.has_stroke_with_atherosclerosis,
            Flag::MiWithin1Year => self.mi_within_1_year,
            Flag::HypertensionMedication => self.hypertension_medication,
            Flag::DiabetesMedication => self.diabetes_medication,
            Flag::LipidMedication => self.lipid_medication,
            Flag::IsSmoker => self.is_smoker,
        }
    }

    /// Read a recorded measurement.
    ///
    /// The metabolic syndrome count and the risk factor count are computed
    /// during evaluation, so they read as `None` here; the evaluation context
    /// resolves them.
    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Age => self.age,
            Measure::HdlC => self.hdl_c,
            Measure::LdlC => self.ldl_c,
            Measure::FastingGlucose => self.fasting_glucose,
            Measure::Triglyceride => self.triglyceride,
            Measure::Egfr => self.egfr,
            Measure::WaistCm => self.waist_cm,
            Measure::Systolic => self.systolic,
            Measure::Diastolic => self.diastolic,
            Measure::CacScore => self.cac_score.map(f64::from),
            Measure::MiHistoryCount => Some(f64::from(self.mi_history_count)),
            Measure::MetabolicSyndromeFactors => self.metabolic_syndrome_factors.map(f64::from),
            Measure::MetabolicSyndromeCount | Measure::RiskFactorCount => None,
        }
    }
}

/// Boolean attributes addressable from catalog predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    IsMale,
    HasHypertension,
    FamilyHistoryEarlyChd,
    HasDiabetes,
    HasCkd,
    HasAscvdHistory,
    HasSignificantPlaque,
    HasCad,
    HasMultivesselObstruction,
    HasAcsWithDiabetes,
    HasPad,
    HasCarotidStenosis,
    HasStrokeWithAtherosclerosis,
    MiWithin1Year,
    HypertensionMedication,
    DiabetesMedication,
    LipidMedication,
    IsSmoker,
}

impl Flag {
    pub const ALL: [Flag; 18] = [
        Flag::IsMale,
        Flag::HasHypertension,
        Flag::FamilyHistoryEarlyChd,
        Flag::HasDiabetes,
        Flag::HasCkd,
        Flag::HasAscvdHistory,
        Flag::HasSignificantPlaque,
        Flag::HasCad,
        Flag::HasMultivesselObstruction,
        Flag::HasAcsWithDiabetes,
        Flag::HasPad,
        Flag::HasCarotidStenosis,
        Flag::HasStrokeWithAtherosclerosis,
        Flag::MiWithin1Year,
        Flag::HypertensionMedication,
        Flag::DiabetesMedication,
        Flag::LipidMedication,
        Flag::IsSmoker,
    ];

    /// Attribute name as it appears in requests and catalogs.
    pub fn name(&self) -> &'static str {
        match self {
            Flag::IsMale => "is_male",
            Flag::HasHypertension => "has_hypertension",
            Flag::FamilyHistoryEarlyChd => "family_history_early_chd",
            Flag::HasDiabetes => "has_diabetes",
            Flag::HasCkd => "has_ckd",
            Flag::HasAscvdHistory => "has_ascvd_history",
            Flag::HasSignificantPlaque => "has_significant_plaque",
            Flag::HasCad => "has_cad",
            Flag::HasMultivesselObstruction => "has_multivessel_obstruction",
            Flag::HasAcsWithDiabetes => "has_acs_with_diabetes",
            Flag::HasPad => "has_pad",
            Flag::HasCarotidStenosis => "has_carotid_stenosis",
            Flag::HasStrokeWithAtherosclerosis => "has_stroke_with_atherosclerosis",
            Flag::MiWithin1Year => "mi_within_1_year",
            Flag::HypertensionMedication => "hypertension_medication",
            Flag::DiabetesMedication => "diabetes_medication",
            Flag::LipidMedication => "lipid_medication",
            Flag::IsSmoker => "is_smoker",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Flag {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flag::ALL
            .iter()
            .copied()
            .find(|flag| flag.name() == s)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

/// Numeric values addressable from catalog predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Age,
    HdlC,
    LdlC,
    FastingGlucose,
    Triglyceride,
    Egfr,
    WaistCm,
    Systolic,
    Diastolic,
    CacScore,
    MiHistoryCount,
    /// Component count supplied by the caller.
    MetabolicSyndromeFactors,
    /// Component count resolved by the metabolic syndrome evaluator.
    MetabolicSyndromeCount,
    /// Number of present checklist risk factors.
    RiskFactorCount,
}

impl Measure {
    pub const ALL: [Measure; 14] = [
        Measure::Age,
        Measure::HdlC,
        Measure::LdlC,
        Measure::FastingGlucose,
        Measure::Triglyceride,
        Measure::Egfr,
        Measure::WaistCm,
        Measure::Systolic,
        Measure::Diastolic,
        Measure::CacScore,
        Measure::MiHistoryCount,
        Measure::MetabolicSyndromeFactors,
        Measure::MetabolicSyndromeCount,
        Measure::RiskFactorCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Measure::Age => "age",
            Measure::HdlC => "hdl_c",
            Measure::LdlC => "ldl_c",
            Measure::FastingGlucose => "fasting_glucose",
            Measure::Triglyceride => "triglyceride",
            Measure::Egfr => "egfr",
            Measure::WaistCm => "waist_cm",
            Measure::Systolic => "systolic",
            Measure::Diastolic => "diastolic",
            Measure::CacScore => "cac_score",
            Measure::MiHistoryCount => "mi_history_count",
            Measure::MetabolicSyndromeFactors => "metabolic_syndrome_factors",
            Measure::MetabolicSyndromeCount => "metabolic_syndrome_count",
            Measure::RiskFactorCount => "risk_factor_count",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Measure::ALL
            .iter()
            .copied()
            .find(|measure| measure.name() == s)
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

/// A flag or measure name that the attribute set does not define.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown attribute '{0}'")]
pub struct UnknownAttribute(pub String);
