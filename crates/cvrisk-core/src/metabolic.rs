//! Metabolic syndrome evaluation.
//!
//! Resolution order:
//! 1. All raw measurements present: each of the five components is
//!    evaluated against its threshold, and the count is the number of
//!    present components. Being on medication for a condition counts as the
//!    component being present.
//! 2. Measurements incomplete, precomputed count supplied: the count is
//!    taken as-is and components are left unknown (false).
//! 3. Neither: count 0, all components false.

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeSet;
use crate::catalog::Threshold;
use crate::types::{MetabolicComponents, MetabolicSyndrome};

/// Component thresholds.
///
/// Measurements at or above a threshold count as elevated, except HDL-C
/// where values below the threshold count as low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetabolicThresholds {
    pub waist_cm: Threshold,
    pub systolic: Threshold,
    pub diastolic: Threshold,
    pub fasting_glucose: Threshold,
    pub triglyceride: Threshold,
    pub hdl_c: Threshold,
}

impl Default for MetabolicThresholds {
    fn default() -> Self {
        Self {
            waist_cm: Threshold::BySex {
                male: 90.0,
                female: 80.0,
            },
            systolic: Threshold::Uniform(130.0),
            diastolic: Threshold::Uniform(85.0),
            fasting_glucose: Threshold::Uniform(100.0),
            triglyceride: Threshold::Uniform(150.0),
            hdl_c: Threshold::BySex {
                male: 40.0,
                female: 50.0,
            },
        }
    }
}

/// Raw measurements needed to evaluate every component.
struct Measurements {
    waist_cm: f64,
    systolic: f64,
    diastolic: f64,
    fasting_glucose: f64,
    triglyceride: f64,
    hdl_c: f64,
}

impl Measurements {
    fn from_attributes(attributes: &AttributeSet) -> Option<Self> {
        Some(Self {
            waist_cm: attributes.waist_cm?,
            systolic: attributes.systolic?,
            diastolic: attributes.diastolic?,
            fasting_glucose: attributes.fasting_glucose?,
            triglyceride: attributes.triglyceride?,
            hdl_c: attributes.hdl_c?,
        })
    }
}

/// Evaluate metabolic syndrome for an attribute set.
pub fn evaluate(attributes: &AttributeSet, thresholds: &MetabolicThresholds) -> MetabolicSyndrome {
    if let Some(measurements) = Measurements::from_attributes(attributes) {
        return MetabolicSyndrome::measured(components(attributes, &measurements, thresholds));
    }

    match attributes.metabolic_syndrome_factors {
        Some(count) => MetabolicSyndrome::supplied(count),
        None => MetabolicSyndrome::unavailable(),
    }
}

fn components(
    attributes: &AttributeSet,
    m: &Measurements,
    thresholds: &MetabolicThresholds,
) -> MetabolicComponents {
    let is_male = attributes.is_male;

    MetabolicComponents {
        abdominal_obesity: m.waist_cm >= thresholds.waist_cm.resolve(is_male),
        elevated_blood_pressure: m.systolic >= thresholds.systolic.resolve(is_male)
            || m.diastolic >= thresholds.diastolic.resolve(is_male)
            || attributes.hypertension_medication,
        elevated_glucose: m.fasting_glucose >= thresholds.fasting_glucose.resolve(is_male)
            || attributes.diabetes_medication,
        elevated_triglyceride: m.triglyceride >= thresholds.triglyceride.resolve(is_male)
            || attributes.lipid_medication,
        low_hdl: m.hdl_c < thresholds.hdl_c.resolve(is_male),
    }
}
