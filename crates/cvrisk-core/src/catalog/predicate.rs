//! Rule predicates.
//!
//! A predicate is a pure function of the evaluation context. Catalog
//! documents describe predicates declaratively (flags, threshold comparisons
//! and boolean combinators); catalogs built in code may also attach
//! arbitrary closures.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeSet, Flag, Measure};
use crate::types::MetabolicSyndrome;

/// A comparison threshold, optionally sex-specific.
///
/// Sex-specific thresholds resolve through `is_male`: the `female` value
/// applies to every attribute set that is not flagged male.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Uniform(f64),
    BySex { male: f64, female: f64 },
}

impl Threshold {
    pub fn resolve(&self, is_male: bool) -> f64 {
        match self {
            Threshold::Uniform(value) => *value,
            Threshold::BySex { male, female } => {
                if is_male {
                    *male
                } else {
                    *female
                }
            }
        }
    }
}

impl From<f64> for Threshold {
    fn from(value: f64) -> Self {
        Threshold::Uniform(value)
    }
}

/// Everything a predicate may look at during one evaluation.
///
/// The risk factor count is only known once the checklist has been built,
/// so it reads as unknown while checklist predicates run.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    attributes: &'a AttributeSet,
    metabolic: &'a MetabolicSyndrome,
    risk_factor_count: Option<usize>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(attributes: &'a AttributeSet, metabolic: &'a MetabolicSyndrome) -> Self {
        Self {
            attributes,
            metabolic,
            risk_factor_count: None,
        }
    }

    pub fn with_risk_factor_count(mut self, count: usize) -> Self {
        self.risk_factor_count = Some(count);
        self
    }

    pub fn attributes(&self) -> &'a AttributeSet {
        self.attributes
    }

    pub fn metabolic(&self) -> &'a MetabolicSyndrome {
        self.metabolic
    }

    pub fn risk_factor_count(&self) -> Option<usize> {
        self.risk_factor_count
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.attributes.flag(flag)
    }

    /// Resolve a measure, including derived ones. `None` means unknown.
    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::MetabolicSyndromeCount => Some(f64::from(self.metabolic.count)),
            Measure::RiskFactorCount => self.risk_factor_count.map(|count| count as f64),
            other => self.attributes.measure(other),
        }
    }
}

type PredicateFn = dyn Fn(&EvaluationContext<'_>) -> bool + Send + Sync;

/// Code-defined predicate.
#[derive(Clone)]
pub struct CustomPredicate(Arc<PredicateFn>);

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPredicate(..)")
    }
}

/// A compiled rule predicate.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// True iff the boolean attribute is set.
    Flag(Flag),

    /// True iff the measure is known and `>=` the threshold.
    AtLeast { measure: Measure, threshold: Threshold },

    /// True iff the measure is known and `<` the threshold.
    Below { measure: Measure, threshold: Threshold },

    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
    Custom(CustomPredicate),
}

impl Predicate {
    pub fn flag(flag: Flag) -> Self {
        Predicate::Flag(flag)
    }

    pub fn at_least(measure: Measure, threshold: impl Into<Threshold>) -> Self {
        Predicate::AtLeast {
            measure,
            threshold: threshold.into(),
        }
    }

    pub fn below(measure: Measure, threshold: impl Into<Threshold>) -> Self {
        Predicate::Below {
            measure,
            threshold: threshold.into(),
        }
    }

    pub fn all(predicates: Vec<Predicate>) -> Self {
        Predicate::All(predicates)
    }

    pub fn any(predicates: Vec<Predicate>) -> Self {
        Predicate::Any(predicates)
    }

    pub fn not(predicate: Predicate) -> Self {
        Predicate::Not(Box::new(predicate))
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&EvaluationContext<'_>) -> bool + Send + Sync + 'static,
    {
        Predicate::Custom(CustomPredicate(Arc::new(f)))
    }

    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> bool {
        match self {
            Predicate::Flag(flag) => ctx.flag(*flag),
            Predicate::AtLeast { measure, threshold } => ctx
                .measure(*measure)
                .is_some_and(|value| value >= threshold.resolve(ctx.flag(Flag::IsMale))),
            Predicate::Below { measure, threshold } => ctx
                .measure(*measure)
                .is_some_and(|value| value < threshold.resolve(ctx.flag(Flag::IsMale))),
            Predicate::All(predicates) => predicates.iter().all(|p| p.evaluate(ctx)),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.evaluate(ctx)),
            Predicate::Not(predicate) => !predicate.evaluate(ctx),
            Predicate::Custom(CustomPredicate(f)) => f(ctx),
        }
    }

    /// Visit this predicate and every nested one, depth first.
    pub fn walk<'p>(&'p self, visit: &mut dyn FnMut(&'p Predicate)) {
        visit(self);
        match self {
            Predicate::All(predicates) | Predicate::Any(predicates) => {
                for predicate in predicates {
                    predicate.walk(visit);
                }
            }
            Predicate::Not(predicate) => predicate.walk(visit),
            _ => {}
        }
    }

    /// Measures referenced anywhere in this predicate. Custom predicates are
    /// opaque and contribute nothing.
    pub fn measures(&self) -> Vec<Measure> {
        let mut measures = Vec::new();
        self.walk(&mut |predicate| match predicate {
            Predicate::AtLeast { measure, .. } | Predicate::Below { measure, .. } => {
                if !measures.contains(measure) {
                    measures.push(*measure);
                }
            }
            _ => {}
        });
        measures
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Uniform(value) => write!(f, "{value}"),
            Threshold::BySex { male, female } => write!(f, "{male} (male) / {female} (female)"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Flag(flag) => f.write_str(flag.name()),
            Predicate::AtLeast { measure, threshold } => {
                write!(f, "{} >= {}", measure.name(), threshold)
            }
            Predicate::Below { measure, threshold } => {
                write!(f, "{} < {}", measure.name(), threshold)
            }
            Predicate::All(predicates) => write_joined(f, predicates, " and "),
            Predicate::Any(predicates) => write_joined(f, predicates, " or "),
            Predicate::Not(predicate) => write!(f, "not {predicate}"),
            Predicate::Custom(_) => f.write_str("<custom>"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, predicates: &[Predicate], separator: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{predicate}")?;
    }
    f.write_str(")")
}
