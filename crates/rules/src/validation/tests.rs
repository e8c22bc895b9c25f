use serde_json::json;

use super::*;
use crate::schema::{RawParameters, RuleKind};

fn def(kind: &str, params: serde_json::Value) -> RuleDefinition {
    RuleDefinition::new("r1", "Rule one", RuleKind::from(kind), RawParameters::from(params))
}

fn warning_paths(result: &ValidationResult) -> Vec<&str> {
    result.warnings.iter().map(|w| w.path.as_str()).collect()
}

#[test]
fn clean_threshold_rule() {
    let result = validate_definition(&def(
        "threshold",
        json!({"field": "value_amount", "threshold": 1000000, "operator": ">="}),
    ));
    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert!(!result.has_warnings());
}

#[test]
fn empty_id_and_name_are_errors() {
    let mut d = def("pattern", json!({"field": "title", "pattern": "x"}));
    d.id = " ".into();
    d.name = String::new();
    let result = validate_definition(&d);
    assert!(!result.valid);
    let paths: Vec<&str> = result.errors.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["id", "name"]);
}

#[test]
fn unparsable_parameters_are_errors() {
    let d = RuleDefinition::new("r1", "R", RuleKind::Threshold, RawParameters::from("{not json"));
    let result = validate_definition(&d);
    assert!(!result.valid);
    assert_eq!(result.errors[0].path, "parameters");

    let missing = validate_definition(&def("threshold", json!({"field": "value_amount"})));
    assert!(!missing.valid);
    assert!(missing.errors[0].message.contains("threshold"));
}

#[test]
fn parameter_errors_say_the_rule_is_skipped() {
    let missing = validate_definition(&def("pattern", json!({"field": "title"})));
    assert!(missing.errors[0].message.ends_with("skipped at detection time"));
}

#[test]
fn unknown_severity_is_an_error_with_suggestion() {
    let result = validate_definition(&def(
        "pattern",
        json!({"field": "title", "pattern": "x", "severity": "hihg"}),
    ));
    assert!(!result.valid);
    let err = &result.errors[0];
    assert_eq!(err.path, "parameters.severity");
    assert!(err.message.contains("hihg"), "{}", err.message);
    assert!(err.message.contains("skipped at detection time"));
    assert_eq!(err.suggestion.as_deref(), Some("high"));
}

#[test]
fn unsupported_type_warns_with_suggestion() {
    let result = validate_definition(&def("treshold", json!({"anything": true})));
    assert!(result.valid, "unsupported kinds are skipped, not failed");
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].path, "rule_type");
    assert_eq!(result.warnings[0].suggestion.as_deref(), Some("threshold"));
}

#[test]
fn unrecognized_operator_warns_with_suggestion() {
    let result = validate_definition(&def(
        "threshold",
        json!({"field": "v", "threshold": 10, "operator": ">=="}),
    ));
    assert!(result.valid);
    assert_eq!(warning_paths(&result), vec!["parameters.operator"]);
    assert_eq!(result.warnings[0].suggestion.as_deref(), Some(">="));
}

#[test]
fn non_numeric_threshold_warns() {
    let result = validate_definition(&def("threshold", json!({"field": "v", "threshold": "lots"})));
    assert!(result.valid);
    assert_eq!(warning_paths(&result), vec!["parameters.threshold"]);
}

#[test]
fn base_confidence_out_of_range_warns() {
    let result = validate_definition(&def(
        "pattern",
        json!({"field": "title", "pattern": "x", "base_confidence": 1.5}),
    ));
    assert!(result.valid);
    assert_eq!(warning_paths(&result), vec!["parameters.base_confidence"]);
}

#[test]
fn anomaly_bound_warnings() {
    let inverted = validate_definition(&def(
        "anomaly",
        json!({"field": "v", "min_value": 100, "max_value": 10}),
    ));
    assert_eq!(warning_paths(&inverted), vec!["parameters.min_value"]);

    let unbounded = validate_definition(&def("anomaly", json!({"field": "v"})));
    assert_eq!(warning_paths(&unbounded), vec!["parameters"]);

    let ok = validate_definition(&def("anomaly", json!({"field": "v", "min_value": 1})));
    assert!(!ok.has_warnings());
}

#[test]
fn validate_yaml_reports_header_errors() {
    let yaml = r#"
apiVersion: v2
kind: RedFlagRule
metadata:
  id: award-check
  name: Award check
rule_type: pattern
parameters:
  field: title
  pattern: urgent
"#;
    let result = validate_yaml(yaml);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].path, "apiVersion");
}

#[test]
fn validate_yaml_parse_error() {
    let result = validate_yaml("metadata: [");
    assert!(!result.valid);
    assert!(result.errors[0].message.starts_with("YAML parse error"));
}

#[test]
fn validate_yaml_clean_file() {
    let yaml = r#"
apiVersion: v1
kind: RedFlagRule
metadata:
  id: award-check
  name: Award check
rule_type: anomaly
category: financial
parameters:
  field: value_amount
  min_value: 1000
  max_value: 50000000
"#;
    let result = validate_yaml(yaml);
    assert!(result.valid, "{:?}", result.errors);
    assert!(!result.has_warnings());
}

#[test]
fn suggestion_skipped_in_json_when_absent() {
    let result = validate_definition(&def("anomaly", json!({"field": "v"})));
    let text = serde_json::to_string(&result).unwrap();
    assert!(!text.contains("suggestion"));
}
