//! Output types of a detection call.

use serde::{Deserialize, Serialize};

use crate::schema::{RuleId, RuleKind, Severity};

/// Value of [`DetectionResult::source`] for every engine finding.
pub const RESULT_SOURCE: &str = "rule_engine";

/// One red flag raised by one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub rule_description: String,
    #[serde(rename = "rule_type")]
    pub rule_kind: RuleKind,
    /// Heuristic score in `[0.0, 1.0]`.
    pub confidence_score: f64,
    pub severity: Severity,
    pub category: String,
    pub source: String,
}

/// A rule that was skipped because its parameters could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDiagnostic {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub rule_type: RuleKind,
    pub message: String,
}

/// Everything a detection call returns: findings in rule order plus
/// diagnostics for rules that could not be evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub red_flags: Vec<DetectionResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl DetectionReport {
    pub fn is_clean(&self) -> bool {
        self.red_flags.is_empty()
    }

    /// Highest severity among the findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.red_flags.iter().map(|r| r.severity).max()
    }

    /// Keep only findings at or above `min`.
    pub fn retain_min_severity(&mut self, min: Severity) {
        self.red_flags.retain(|r| r.severity >= min);
    }
}
