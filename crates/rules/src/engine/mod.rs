//! Detection orchestrator.
//!
//! Runs every active rule against one record, isolates per-rule parameter
//! failures and returns findings in the order the rules were supplied.
//! Large rule sets are evaluated on the rayon pool; collection is
//! order-preserving so the output is identical either way.

mod detector;
mod result;
mod ruleset;

use procwatch_core::config::EngineConfig;
use procwatch_core::Value;
use rayon::prelude::*;
use tracing::debug;

use crate::schema::RuleDefinition;

pub use detector::Detector;
pub use result::*;
pub use ruleset::{CompiledRule, RuleSet};

/// Failure of the detection call itself (as opposed to one rule).
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("record must not be null")]
    NullRecord,
}

/// What one rule contributed to a detection call.
enum RuleOutcome {
    Matched(DetectionResult),
    NoMatch,
    Failed(RuleDiagnostic),
}

/// Stateless red-flag detector.
#[derive(Debug, Clone, Default)]
pub struct DetectionEngine {
    config: EngineConfig,
}

impl DetectionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `rules` against `record`.
    ///
    /// Each definition's parameters are parsed for this call. Inactive
    /// definitions are ignored. Only a null record fails the call.
    pub fn detect(
        &self,
        rules: &[RuleDefinition],
        record: &Value,
    ) -> Result<DetectionReport, DetectError> {
        check_record(record)?;
        let active: Vec<&RuleDefinition> = rules.iter().filter(|d| d.is_active).collect();
        let outcomes = self.map_ordered(&active, |def| {
            match CompiledRule::compile(def) {
                Ok(rule) => rule
                    .evaluate(record)
                    .map_or(RuleOutcome::NoMatch, RuleOutcome::Matched),
                Err(diag) => RuleOutcome::Failed(diag),
            }
        });
        Ok(assemble(outcomes, Vec::new()))
    }

    /// Evaluate a precompiled snapshot against `record`.
    ///
    /// The snapshot's compile diagnostics are carried into the report.
    pub fn detect_compiled(
        &self,
        rules: &RuleSet,
        record: &Value,
    ) -> Result<DetectionReport, DetectError> {
        check_record(record)?;
        let outcomes = self.map_ordered(rules.rules(), |rule| {
            rule.evaluate(record)
                .map_or(RuleOutcome::NoMatch, RuleOutcome::Matched)
        });
        Ok(assemble(outcomes, rules.diagnostics().to_vec()))
    }

    /// Map `f` over `items`, in parallel for large batches, keeping order.
    fn map_ordered<T, F>(&self, items: &[T], f: F) -> Vec<RuleOutcome>
    where
        T: Sync,
        F: Fn(&T) -> RuleOutcome + Sync + Send,
    {
        if self.config.is_parallel(items.len()) {
            debug!(rules = items.len(), "evaluating rules in parallel");
            items.par_iter().map(&f).collect()
        } else {
            items.iter().map(&f).collect()
        }
    }
}

/// Free-function form of [`DetectionEngine::detect`] with default settings.
pub fn detect(rules: &[RuleDefinition], record: &Value) -> Result<DetectionReport, DetectError> {
    DetectionEngine::default().detect(rules, record)
}

fn check_record(record: &Value) -> Result<(), DetectError> {
    if matches!(record, Value::Null) {
        return Err(DetectError::NullRecord);
    }
    Ok(())
}

fn assemble(outcomes: Vec<RuleOutcome>, mut diagnostics: Vec<RuleDiagnostic>) -> DetectionReport {
    let mut red_flags = Vec::new();
    for outcome in outcomes {
        match outcome {
            RuleOutcome::Matched(result) => red_flags.push(result),
            RuleOutcome::NoMatch => {}
            RuleOutcome::Failed(diag) => diagnostics.push(diag),
        }
    }
    DetectionReport {
        red_flags,
        diagnostics,
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawParameters, RuleKind, Severity};

    fn rule(id: &str, kind: &str, params: serde_json::Value) -> RuleDefinition {
        RuleDefinition::new(id, format!("Rule {id}"), RuleKind::from(kind), RawParameters::from(params))
    }

    fn record(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn ids(report: &DetectionReport) -> Vec<&str> {
        report.red_flags.iter().map(|r| r.rule_id.as_str()).collect()
    }

    #[test]
    fn end_to_end_two_rules() {
        let rules = vec![
            rule(
                "1",
                "threshold",
                serde_json::json!({
                    "field": "value_amount", "threshold": 1000000, "operator": ">",
                    "severity": "high", "base_confidence": 0.8, "category": "financial"
                }),
            ),
            rule(
                "2",
                "pattern",
                serde_json::json!({
                    "field": "title", "pattern": "suspicious",
                    "severity": "medium", "base_confidence": 0.6, "category": "compliance"
                }),
            ),
        ];
        let rec = record(serde_json::json!({"value_amount": 2000000, "title": "ACME Suspicious Corp"}));

        let report = detect(&rules, &rec).unwrap();
        assert_eq!(report.red_flags.len(), 2);
        assert!(report.diagnostics.is_empty());

        let first = &report.red_flags[0];
        assert_eq!(first.rule_id, "1");
        assert_eq!(first.confidence_score, 1.0);
        assert_eq!(first.severity, Severity::High);
        assert_eq!(first.category, "financial");
        assert_eq!(first.source, RESULT_SOURCE);
        assert_eq!(first.rule_kind, RuleKind::Threshold);

        let second = &report.red_flags[1];
        assert!((second.confidence_score - 0.8).abs() < 1e-9);
        assert_eq!(second.severity, Severity::Medium);
        assert_eq!(second.category, "compliance");
    }

    #[test]
    fn bad_rule_does_not_suppress_others() {
        let rules = vec![
            rule("a", "anomaly", serde_json::json!({"field": "v", "max_value": 1})),
            RuleDefinition::new("b", "Broken", RuleKind::Threshold, RawParameters::from("{oops")),
            rule("c", "threshold", serde_json::json!({"field": "v", "threshold": 0})),
        ];
        let report = detect(&rules, &record(serde_json::json!({"v": 5}))).unwrap();
        assert_eq!(ids(&report), vec!["a", "c"]);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].rule_id, "b");
    }

    #[test]
    fn order_follows_supplied_rules_minus_non_matching() {
        let rules = vec![
            rule("z", "threshold", serde_json::json!({"field": "v", "threshold": 1})),
            rule("m", "threshold", serde_json::json!({"field": "v", "threshold": 100})),
            rule("a", "anomaly", serde_json::json!({"field": "v", "min_value": 10})),
        ];
        let report = detect(&rules, &record(serde_json::json!({"v": 5}))).unwrap();
        assert_eq!(ids(&report), vec!["z", "a"]);
    }

    #[test]
    fn unsupported_and_inactive_rules_contribute_nothing() {
        let rules = vec![
            rule("x", "ml_model", serde_json::json!({"field": "v"})),
            rule("y", "threshold", serde_json::json!({"field": "v", "threshold": 0})).inactive(),
        ];
        let report = detect(&rules, &record(serde_json::json!({"v": 5}))).unwrap();
        assert!(report.is_clean());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn null_record_is_a_contract_violation() {
        let rules = vec![rule("a", "anomaly", serde_json::json!({"field": "v"}))];
        assert!(matches!(detect(&rules, &Value::Null), Err(DetectError::NullRecord)));
    }

    #[test]
    fn non_object_record_yields_no_findings() {
        let rules = vec![rule("a", "pattern", serde_json::json!({"field": "t", "pattern": "x"}))];
        let report = detect(&rules, &Value::from("x")).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn empty_rule_set_yields_empty_report() {
        let report = detect(&[], &record(serde_json::json!({"v": 1}))).unwrap();
        assert_eq!(report, DetectionReport::default());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let rules: Vec<RuleDefinition> = (0..200)
            .map(|i| {
                if i % 7 == 0 {
                    RuleDefinition::new(i.to_string(), "broken", RuleKind::Pattern, RawParameters::from("{}"))
                } else {
                    rule(&i.to_string(), "threshold", serde_json::json!({"field": "v", "threshold": i}))
                }
            })
            .collect();
        let rec = record(serde_json::json!({"v": 120}));

        let sequential = DetectionEngine::new(EngineConfig { parallel_threshold: 0 })
            .detect(&rules, &rec)
            .unwrap();
        let parallel = DetectionEngine::new(EngineConfig { parallel_threshold: 2 })
            .detect(&rules, &rec)
            .unwrap();

        assert_eq!(sequential, parallel);
        assert!(!sequential.red_flags.is_empty());
        let numeric: Vec<u32> = parallel.red_flags.iter().map(|r| r.rule_id.as_str().parse().unwrap()).collect();
        let mut sorted = numeric.clone();
        sorted.sort_unstable();
        assert_eq!(numeric, sorted);
    }

    #[test]
    fn compiled_snapshot_matches_per_call_detection() {
        let rules = vec![
            rule("1", "threshold", serde_json::json!({"field": "v", "threshold": 10, "category": "financial"})),
            RuleDefinition::new("2", "broken", RuleKind::Anomaly, RawParameters::from("null")),
            rule("3", "pattern", serde_json::json!({"field": "t", "pattern": "abc"})).with_category("text"),
        ];
        let rec = record(serde_json::json!({"v": 11, "t": "xxABCxx"}));

        let set = RuleSet::compile(&rules);
        assert_eq!(set.len(), 2);
        assert_eq!(set.diagnostics().len(), 1);
        assert_eq!(set.get("3").unwrap().category, "text");

        let engine = DetectionEngine::default();
        assert_eq!(
            engine.detect_compiled(&set, &rec).unwrap(),
            engine.detect(&rules, &rec).unwrap()
        );
    }

    #[test]
    fn report_serializes_invocation_envelope() {
        let rules = vec![rule("7", "threshold", serde_json::json!({"field": "v", "threshold": 1}))];
        let report = detect(&rules, &record(serde_json::json!({"v": 2}))).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("diagnostics").is_none());
        let flag = &json["red_flags"][0];
        assert_eq!(flag["rule_id"], "7");
        assert_eq!(flag["rule_type"], "threshold");
        assert_eq!(flag["severity"], "low");
        assert_eq!(flag["source"], "rule_engine");
        assert_eq!(flag["category"], "general");
    }

    #[test]
    fn min_severity_filter() {
        let rules = vec![
            rule("lo", "threshold", serde_json::json!({"field": "v", "threshold": 0})),
            rule("hi", "pattern", serde_json::json!({"field": "t", "pattern": "x", "severity": "critical"})),
        ];
        let mut report = detect(&rules, &record(serde_json::json!({"v": 5, "t": "x"}))).unwrap();
        assert_eq!(report.max_severity(), Some(Severity::Critical));
        report.retain_min_severity(Severity::High);
        assert_eq!(ids(&report), vec!["hi"]);
    }
}
