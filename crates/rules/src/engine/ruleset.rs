//! Compiled rules and immutable rule-set snapshots.

use procwatch_core::Value;
use tracing::{debug, warn};

use crate::evaluator;
use crate::schema::{RuleDefinition, RuleId, RuleKind, RuleParams};
use crate::scoring;

use super::result::{DetectionResult, RuleDiagnostic, RESULT_SOURCE};

/// A rule whose parameters have been parsed and validated for its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub kind: RuleKind,
    /// Parameter category if set, otherwise the definition's category.
    pub category: String,
    pub params: RuleParams,
}

impl CompiledRule {
    /// Compile a definition. A parameter failure becomes a diagnostic.
    pub fn compile(def: &RuleDefinition) -> Result<Self, RuleDiagnostic> {
        match def.compile_params() {
            Ok(params) => {
                if let RuleParams::Unsupported { kind } = &params {
                    debug!(rule_id = %def.id, kind = %kind, "unsupported rule type, rule will never match");
                }
                let category = params
                    .common()
                    .category
                    .clone()
                    .unwrap_or_else(|| def.category.clone());
                Ok(Self {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    description: def.description.clone(),
                    kind: def.rule_type.clone(),
                    category,
                    params,
                })
            }
            Err(e) => {
                warn!(rule_id = %def.id, rule_type = %def.rule_type, error = %e, "skipping rule with invalid parameters");
                Err(RuleDiagnostic {
                    rule_id: def.id.clone(),
                    rule_name: def.name.clone(),
                    rule_type: def.rule_type.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Evaluate against `record`, producing a finding on match.
    pub fn evaluate(&self, record: &Value) -> Option<DetectionResult> {
        if !evaluator::matches(&self.params, record) {
            return None;
        }
        Some(DetectionResult {
            rule_id: self.id.clone(),
            rule_name: self.name.clone(),
            rule_description: self.description.clone(),
            rule_kind: self.kind.clone(),
            confidence_score: scoring::confidence(&self.params, record),
            severity: scoring::severity(&self.params, record),
            category: self.category.clone(),
            source: RESULT_SOURCE.to_string(),
        })
    }
}

/// Immutable snapshot of active compiled rules, in source order, together
/// with the diagnostics of rules that failed to compile.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    diagnostics: Vec<RuleDiagnostic>,
}

impl RuleSet {
    /// Compile every active definition. Inactive ones are dropped.
    pub fn compile(definitions: &[RuleDefinition]) -> Self {
        let mut rules = Vec::with_capacity(definitions.len());
        let mut diagnostics = Vec::new();
        for def in definitions.iter().filter(|d| d.is_active) {
            match CompiledRule::compile(def) {
                Ok(rule) => rules.push(rule),
                Err(diag) => diagnostics.push(diag),
            }
        }
        Self { rules, diagnostics }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn diagnostics(&self) -> &[RuleDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.id.as_str() == id)
    }
}
