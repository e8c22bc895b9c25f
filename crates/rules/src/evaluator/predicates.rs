//! Match predicates, one per rule kind.
//!
//! Every predicate fails closed: a missing field, a value of the wrong
//! type or a failed numeric coercion is simply "no match".

use procwatch_core::Value;

use crate::schema::{AnomalyParams, PatternParams, ThresholdParams};

/// Case-insensitive substring match on a string-valued field.
pub fn pattern_matches(params: &PatternParams, record: &Value) -> bool {
    let Some(text) = params.field.resolve(record).and_then(Value::as_str) else {
        return false;
    };
    text.to_lowercase().contains(&params.pattern.to_lowercase())
}

/// Compare the coerced field value against the coerced threshold.
pub fn threshold_matches(params: &ThresholdParams, record: &Value) -> bool {
    let Some(value) = params.field.resolve(record).and_then(Value::as_f64_lossy) else {
        return false;
    };
    let Some(threshold) = params.threshold.as_f64_lossy() else {
        return false;
    };
    params.operator.compare(value, threshold)
}

/// True when the coerced field value lies strictly outside `[min, max]`.
pub fn anomaly_matches(params: &AnomalyParams, record: &Value) -> bool {
    let Some(value) = params.field.resolve(record).and_then(Value::as_f64_lossy) else {
        return false;
    };
    value < params.min_bound() || value > params.max_bound()
}
