//! Confidence and severity heuristics for matched rules.
//!
//! Neither value is calibrated. Confidence rewards rules whose field is
//! actually present in the record; severity is driven by the magnitude of
//! a numeric field and overrides the configured level whenever the field
//! is a number.

use procwatch_core::Value;

use crate::schema::{RuleParams, Severity};

/// Added to `base_confidence` when the rule's field is present.
pub const FIELD_PRESENT_BONUS: f64 = 0.2;

/// Numeric field values above this are `high`.
pub const HIGH_VALUE_THRESHOLD: f64 = 1_000_000.0;

/// Numeric field values above this (and not above the high mark) are `medium`.
pub const MEDIUM_VALUE_THRESHOLD: f64 = 100_000.0;

/// Confidence for a matched rule, always within `[0.0, 1.0]`.
pub fn confidence(params: &RuleParams, record: &Value) -> f64 {
    let mut score = params.common().base_confidence;
    let present = params
        .field()
        .and_then(|field| field.resolve(record))
        .is_some_and(Value::is_present);
    if present {
        score += FIELD_PRESENT_BONUS;
    }
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Severity for a matched rule.
///
/// A numeric field value always wins over the configured severity, even
/// when that lowers a configured `critical` to `low`.
pub fn severity(params: &RuleParams, record: &Value) -> Severity {
    let numeric = params
        .field()
        .and_then(|field| field.resolve(record))
        .and_then(Value::as_number);
    match numeric {
        Some(v) => classify_amount(v),
        None => params.common().severity,
    }
}

/// Bucket a numeric amount into `low` / `medium` / `high`.
pub fn classify_amount(value: f64) -> Severity {
    if value > HIGH_VALUE_THRESHOLD {
        Severity::High
    } else if value > MEDIUM_VALUE_THRESHOLD {
        Severity::Medium
    } else {
        Severity::Low
    }
}
