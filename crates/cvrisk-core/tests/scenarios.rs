use std::sync::Arc;
use std::thread;

use chrono::Utc;

use cvrisk_core::{
    AttributeSet, Catalog, CatalogError, CatalogSource, CatalogStore, Engine, MetabolicBasis, Tier,
};

const DUPLICATE_CODES: &str = r#"
catalog_version: "9.9"
name: "Broken"
rules:
  - code: diabetes
    label: "Diabetes"
    tier: high
    when: { flag: has_diabetes }
  - code: diabetes
    label: "Diabetes on medication"
    tier: high
    when: { flag: diabetes_medication }
"#;

fn builtin_engine() -> Engine {
    Engine::new(Arc::new(Catalog::builtin().unwrap()))
}

fn matched_codes(attributes: &AttributeSet, engine: &Engine) -> Vec<String> {
    engine
        .evaluate(attributes)
        .matched_rules
        .into_iter()
        .map(|rule| rule.code)
        .collect()
}

#[test]
fn most_severe_tier_wins_over_ascvd_history() {
    let attributes = AttributeSet {
        is_male: true,
        has_ascvd_history: true,
        has_cad: true,
        mi_within_1_year: true,
        has_multivessel_obstruction: true,
        ..Default::default()
    };

    let engine = builtin_engine();
    let assessment = engine.evaluate(&attributes);

    assert_eq!(assessment.level_code, Tier::ExtremelyHigh);
    assert_eq!(assessment.level, "極高");
    assert_eq!(
        matched_codes(&attributes, &engine),
        vec!["cad_recent_mi", "cad_multivessel", "ascvd_history"]
    );
    assert_eq!(
        assessment.recommendations,
        engine.catalog().recommendations_for(Tier::ExtremelyHigh)
    );
}

#[test]
fn missing_data_resolves_to_undefined() {
    let attributes: AttributeSet = serde_json::from_str(r#"{ "is_male": false }"#).unwrap();

    let engine = builtin_engine();
    let assessment = engine.evaluate(&attributes);

    assert_eq!(assessment.level_code, Tier::Undefined);
    assert_eq!(assessment.level, "未定義");
    assert!(assessment.matched_rules.is_empty());
    assert!(assessment.recommendations.is_empty());
    assert_eq!(assessment.metabolic_syndrome.count, 0);
    assert_eq!(assessment.metabolic_syndrome.basis, MetabolicBasis::Unavailable);
    assert!(!assessment.risk_factors.is_empty());
    assert!(assessment.risk_factors.iter().all(|item| !item.present));
    assert_eq!(assessment.risk_factor_count, 0);
}

#[test]
fn supplied_metabolic_count_is_used_when_measurements_are_incomplete() {
    let attributes = AttributeSet {
        waist_cm: Some(100.0),
        systolic: Some(150.0),
        metabolic_syndrome_factors: Some(4),
        ..Default::default()
    };

    let assessment = builtin_engine().evaluate(&attributes);

    assert_eq!(assessment.metabolic_syndrome.basis, MetabolicBasis::Supplied);
    assert_eq!(assessment.metabolic_syndrome.count, 4);
    assert!(!assessment.metabolic_syndrome.components.abdominal_obesity);
    assert_eq!(assessment.risk_factor_count, 1);
    assert_eq!(assessment.level_code, Tier::Low);
}

#[test]
fn failed_reload_keeps_active_catalog_under_concurrent_evaluation() {
    let store = CatalogStore::new(Catalog::builtin().unwrap());
    let before = store.snapshot();

    let attributes = AttributeSet {
        has_diabetes: true,
        is_smoker: true,
        has_hypertension: true,
        ..Default::default()
    };
    let at = Utc::now();
    let expected = store.engine().evaluate_at(&attributes, at);

    thread::scope(|scope| {
        let evaluators: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let assessment = store.engine().evaluate(&attributes);
                        assert_eq!(assessment.level_code, expected.level_code);
                        assert_eq!(assessment.matched_rules, expected.matched_rules);
                        assert_eq!(assessment.catalog_version, before.version());
                    }
                })
            })
            .collect();

        scope.spawn(|| {
            for _ in 0..50 {
                let result = store.reload(&CatalogSource::Yaml(DUPLICATE_CODES.to_string()));
                assert!(matches!(result, Err(CatalogError::DuplicateRuleCode(ref code)) if code == "diabetes"));
            }
        });

        for evaluator in evaluators {
            evaluator.join().unwrap();
        }
    });

    let after = store.snapshot();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(store.engine().evaluate_at(&attributes, at), expected);
}
