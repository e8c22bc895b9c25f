//! Individual checks: file header, identity, rule type, parameters.

use crate::schema::{
    RuleDefinition, RuleFile, RuleKind, RuleParams, Severity, ThresholdOperator, API_VERSION,
    KNOWN_RULE_TYPES, OPERATOR_SYMBOLS, RULE_FILE_KIND, SEVERITY_NAMES,
};

use super::fuzzy::fuzzy_match;
use super::ValidationResult;

pub(super) fn validate_header(file: &RuleFile, result: &mut ValidationResult) {
    if file.api_version != API_VERSION {
        result.error(
            "apiVersion",
            format!("apiVersion must be '{}', got '{}'", API_VERSION, file.api_version),
        );
    }

    if file.kind != RULE_FILE_KIND {
        result.error(
            "kind",
            format!("kind must be '{}', got '{}'", RULE_FILE_KIND, file.kind),
        );
    }
}

pub(super) fn validate_identity(def: &RuleDefinition, result: &mut ValidationResult) {
    if def.id.as_str().trim().is_empty() {
        result.error("id", "rule id must not be empty");
    }
    if def.name.trim().is_empty() {
        result.error("name", "rule name must not be empty");
    }
}

pub(super) fn validate_kind(def: &RuleDefinition, result: &mut ValidationResult) {
    if let RuleKind::Unsupported(kind) = &def.rule_type {
        result.warn_with_suggestion(
            "rule_type",
            format!(
                "unsupported rule type '{}', the rule will never match (expected one of: {})",
                kind,
                KNOWN_RULE_TYPES.join(", ")
            ),
            fuzzy_match(kind, KNOWN_RULE_TYPES),
        );
    }
}

pub(super) fn validate_parameters(def: &RuleDefinition, result: &mut ValidationResult) {
    // Parameters of an unsupported kind are never read.
    if !def.rule_type.is_supported() {
        return;
    }

    let params = match def.compile_params() {
        Ok(params) => params,
        Err(e) => {
            let message = format!("{e}, so the rule will be skipped at detection time");
            match unknown_severity(def) {
                Some(severity) => result.error_with_suggestion(
                    "parameters.severity",
                    message,
                    fuzzy_match(&severity, SEVERITY_NAMES),
                ),
                None => result.error("parameters", message),
            }
            return;
        }
    };

    let confidence = params.common().base_confidence;
    if !(0.0..=1.0).contains(&confidence) {
        result.warn(
            "parameters.base_confidence",
            format!("base_confidence {confidence} is outside [0, 1], scores will be clamped"),
        );
    }

    match &params {
        RuleParams::Threshold(p) => {
            if let ThresholdOperator::Unrecognized(op) = &p.operator {
                result.warn_with_suggestion(
                    "parameters.operator",
                    format!(
                        "unrecognized operator '{}', the rule will never match (expected one of: {})",
                        op,
                        OPERATOR_SYMBOLS.join(" ")
                    ),
                    fuzzy_match(op, OPERATOR_SYMBOLS),
                );
            }
            if p.threshold.as_f64_lossy().is_none() {
                result.warn(
                    "parameters.threshold",
                    format!("threshold {} is not numeric, the rule will never match", p.threshold),
                );
            }
        }
        RuleParams::Anomaly(p) => match (p.min_value, p.max_value) {
            (None, None) => {
                result.warn(
                    "parameters",
                    "anomaly rule sets neither min_value nor max_value, it will never match",
                );
            }
            (Some(min), Some(max)) if min > max => {
                result.warn(
                    "parameters.min_value",
                    format!("min_value {min} is greater than max_value {max}, every value is out of range"),
                );
            }
            _ => {}
        },
        RuleParams::Pattern(_) | RuleParams::Unsupported { .. } => {}
    }
}

/// The `severity` parameter, when it is a string no severity level accepts.
fn unknown_severity(def: &RuleDefinition) -> Option<String> {
    let params = def.parameters.to_json().ok()?;
    let severity = params.get("severity")?.as_str()?;
    severity.parse::<Severity>().is_err().then(|| severity.to_string())
}
