//! Tests for schema types.

use procwatch_core::Value;

use super::*;

const THRESHOLD_RULE_YAML: &str = r#"
apiVersion: v1
kind: RedFlagRule
metadata:
  id: high-value-award
  name: High value award
  description: Award value above one million
  tags: [financial, awards]
  enabled: true
rule_type: threshold
category: financial
parameters:
  field: value_amount
  threshold: 1000000
  operator: ">"
  severity: high
  base_confidence: 0.8
"#;

const BLOB_RULE_YAML: &str = r#"
apiVersion: v1
kind: RedFlagRule
metadata:
  id: suspicious-title
  name: Suspicious title
rule_type: Pattern
parameters: '{"field": "title", "pattern": "suspicious", "category": "compliance"}'
"#;

fn definition(kind: &str, params: serde_json::Value) -> RuleDefinition {
    RuleDefinition::new("r1", "Rule", RuleKind::from(kind), RawParameters::from(params))
}

#[test]
fn parse_rule_file_with_inline_parameters() {
    let file: RuleFile = serde_yaml::from_str(THRESHOLD_RULE_YAML).unwrap();
    file.check_header().unwrap();
    assert_eq!(file.metadata.id, "high-value-award");
    assert_eq!(file.rule_type, RuleKind::Threshold);

    let def = file.into_definition();
    assert_eq!(def.category, "financial");
    assert!(def.is_active);
    assert_eq!(def.description, "Award value above one million");

    match def.compile_params().unwrap() {
        RuleParams::Threshold(p) => {
            assert_eq!(p.field.as_str(), "value_amount");
            assert_eq!(p.threshold, Value::Number(1_000_000.0));
            assert_eq!(p.operator, ThresholdOperator::Gt);
            assert_eq!(p.common.severity, Severity::High);
            assert_eq!(p.common.base_confidence, 0.8);
            assert_eq!(p.common.category, None);
        }
        other => panic!("expected threshold params, got {other:?}"),
    }
}

#[test]
fn parse_rule_file_with_blob_parameters() {
    let file: RuleFile = serde_yaml::from_str(BLOB_RULE_YAML).unwrap();
    assert!(matches!(file.parameters, RawParameters::Blob(_)));
    assert_eq!(file.rule_type, RuleKind::Pattern);
    assert_eq!(file.category, DEFAULT_CATEGORY);
    assert!(file.metadata.enabled);

    match file.into_definition().compile_params().unwrap() {
        RuleParams::Pattern(p) => {
            assert_eq!(p.pattern, "suspicious");
            assert_eq!(p.common.category.as_deref(), Some("compliance"));
            assert_eq!(p.common.severity, Severity::Medium);
            assert_eq!(p.common.base_confidence, DEFAULT_BASE_CONFIDENCE);
        }
        other => panic!("expected pattern params, got {other:?}"),
    }
}

#[test]
fn rule_file_header_is_checked() {
    let yaml = THRESHOLD_RULE_YAML.replace("apiVersion: v1", "apiVersion: v2");
    let file: RuleFile = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(file.check_header().unwrap_err().field, "apiVersion");

    let yaml = THRESHOLD_RULE_YAML.replace("kind: RedFlagRule", "kind: AnomalyRule");
    let file: RuleFile = serde_yaml::from_str(&yaml).unwrap();
    let err = file.check_header().unwrap_err();
    assert_eq!(err.field, "kind");
    assert!(err.message.contains("AnomalyRule"));
}

#[test]
fn definition_accepts_integer_ids_and_defaults() {
    let def: RuleDefinition = serde_json::from_str(
        r#"{"id": 7, "name": "Big", "rule_type": "anomaly", "parameters": "{\"field\": \"x\"}"}"#,
    )
    .unwrap();
    assert_eq!(def.id, "7");
    assert_eq!(def.id.as_int(), Some(7));
    assert_eq!(def.category, "general");
    assert!(def.is_active);
    assert_eq!(def.description, "");
}

#[test]
fn rule_ids_serialize_as_written() {
    let numeric: RuleId = serde_json::from_str("42").unwrap();
    let slug: RuleId = serde_json::from_str(r#""42""#).unwrap();
    assert_eq!(numeric.to_string(), slug.to_string());
    assert_ne!(numeric, slug);
    assert_eq!(serde_json::to_string(&numeric).unwrap(), "42");
    assert_eq!(serde_json::to_string(&slug).unwrap(), r#""42""#);
}

#[test]
fn pattern_requires_field_and_pattern() {
    let err = definition("pattern", serde_json::json!({"field": "title"}))
        .compile_params()
        .unwrap_err();
    assert!(err.to_string().contains("pattern"), "{err}");

    let err = definition("pattern", serde_json::json!({"pattern": "x"}))
        .compile_params()
        .unwrap_err();
    assert!(err.to_string().contains("field"), "{err}");

    let err = definition("pattern", serde_json::json!({"field": "title", "pattern": ""}))
        .compile_params()
        .unwrap_err();
    assert!(matches!(err, ParamError::Invalid { name: "pattern", .. }));
}

#[test]
fn threshold_requires_non_null_threshold() {
    let err = definition("threshold", serde_json::json!({"field": "v"}))
        .compile_params()
        .unwrap_err();
    assert!(err.to_string().contains("threshold"), "{err}");

    let err = definition("threshold", serde_json::json!({"field": "v", "threshold": null}))
        .compile_params()
        .unwrap_err();
    assert!(matches!(err, ParamError::Missing("threshold")));
}

#[test]
fn threshold_keeps_string_threshold_for_later_coercion() {
    let params = definition(
        "threshold",
        serde_json::json!({"field": "v", "threshold": "not a number", "operator": "~"}),
    )
    .compile_params()
    .unwrap();
    match params {
        RuleParams::Threshold(p) => {
            assert_eq!(p.threshold, Value::from("not a number"));
            assert_eq!(p.operator, ThresholdOperator::Unrecognized("~".into()));
        }
        other => panic!("expected threshold params, got {other:?}"),
    }
}

#[test]
fn anomaly_bounds_default_to_infinity() {
    let params = definition("anomaly", serde_json::json!({"field": "v", "max_value": 10}))
        .compile_params()
        .unwrap();
    match params {
        RuleParams::Anomaly(p) => {
            assert_eq!(p.min_bound(), f64::NEG_INFINITY);
            assert_eq!(p.max_bound(), 10.0);
        }
        other => panic!("expected anomaly params, got {other:?}"),
    }
}

#[test]
fn null_anomaly_bound_is_invalid() {
    for (name, params) in [
        ("min_value", serde_json::json!({"field": "v", "min_value": null, "max_value": 10})),
        ("max_value", serde_json::json!({"field": "v", "max_value": null})),
    ] {
        let err = definition("anomaly", params).compile_params().unwrap_err();
        assert!(
            matches!(err, ParamError::Invalid { name: n, .. } if n == name),
            "{name}: {err}"
        );
    }
}

#[test]
fn malformed_blob_is_a_param_error() {
    let def = RuleDefinition::new("r", "R", RuleKind::Threshold, RawParameters::from("{not json"));
    assert!(matches!(def.compile_params(), Err(ParamError::Json(_))));

    let def = RuleDefinition::new("r", "R", RuleKind::Threshold, RawParameters::from("[1, 2]"));
    assert!(matches!(
        def.compile_params(),
        Err(ParamError::NotAnObject("array"))
    ));
}

#[test]
fn unknown_severity_is_a_param_error() {
    let err = definition(
        "pattern",
        serde_json::json!({"field": "t", "pattern": "x", "severity": "urgent"}),
    )
    .compile_params()
    .unwrap_err();
    assert!(err.to_string().contains("urgent"), "{err}");
}

#[test]
fn unsupported_kind_skips_parameter_parsing() {
    let def = RuleDefinition::new("r", "R", RuleKind::from("ml_model"), RawParameters::from("garbage"));
    assert_eq!(
        def.compile_params().unwrap(),
        RuleParams::Unsupported {
            kind: "ml_model".into()
        }
    );
}

#[test]
fn rule_kind_parses_case_insensitively() {
    assert_eq!(RuleKind::from("THRESHOLD"), RuleKind::Threshold);
    assert_eq!(RuleKind::from(" anomaly "), RuleKind::Anomaly);
    assert!(!RuleKind::from("statistical").is_supported());
}

#[test]
fn severity_orders_and_parses() {
    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::High < Severity::Critical);
    assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
    assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
    assert!("severe".parse::<Severity>().is_err());
}
