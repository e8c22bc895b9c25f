//! Rule evaluation: dispatches a typed parameter set to its predicate.
//!
//! Three strategies:
//! - **Pattern**: case-insensitive substring match on a string field
//! - **Threshold**: numeric comparison with `>`, `>=`, `<`, `<=`, `==`
//! - **Anomaly**: value outside an optional `[min_value, max_value]` range
//!
//! Unsupported kinds never match.

mod predicates;

use procwatch_core::Value;

use crate::schema::RuleParams;

pub use predicates::*;

/// Evaluate `params` against `record`.
pub fn matches(params: &RuleParams, record: &Value) -> bool {
    match params {
        RuleParams::Pattern(p) => pattern_matches(p, record),
        RuleParams::Threshold(p) => threshold_matches(p, record),
        RuleParams::Anomaly(p) => anomaly_matches(p, record),
        RuleParams::Unsupported { .. } => false,
    }
}

// ── Tests ───────────────────────────────────────────────────────────
