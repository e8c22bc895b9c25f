//! Typed parameter sets, one per rule kind.

use std::fmt;

use procwatch_core::{FieldPath, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{RawParameters, RuleKind, Severity};

/// Why a rule's parameters could not be loaded for its declared kind.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// Blob is not JSON, or a key has the wrong type / is missing.
    #[error("invalid parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parameters must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required parameter `{0}`")]
    Missing(&'static str),

    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

// ── Shared optional keys ────────────────────────────────────────────

pub const DEFAULT_BASE_CONFIDENCE: f64 = 0.5;

fn default_base_confidence() -> f64 {
    DEFAULT_BASE_CONFIDENCE
}

/// The optional `category` / `severity` / `base_confidence` trio every kind accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonParams {
    /// Overrides the definition's category when set.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            category: None,
            severity: Severity::default(),
            base_confidence: DEFAULT_BASE_CONFIDENCE,
        }
    }
}

// ── Pattern ─────────────────────────────────────────────────────────

/// Case-insensitive substring match on a string field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternParams {
    pub field: FieldPath,
    pub pattern: String,
    #[serde(flatten)]
    pub common: CommonParams,
}

// ── Threshold ───────────────────────────────────────────────────────

/// Numeric comparison of a field against a fixed threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParams {
    pub field: FieldPath,
    /// Kept as written; coerced to a number at evaluation time so that a
    /// non-numeric threshold fails closed instead of failing the rule.
    pub threshold: Value,
    #[serde(default)]
    pub operator: ThresholdOperator,
    #[serde(flatten)]
    pub common: CommonParams,
}

/// Comparison operators for threshold rules.
///
/// Operators outside the known set are preserved as `Unrecognized` and
/// never match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThresholdOperator {
    #[default]
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Unrecognized(String),
}

pub const OPERATOR_SYMBOLS: &[&str] = &[">", ">=", "<", "<=", "=="];

impl ThresholdOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ThresholdOperator::Gt => ">",
            ThresholdOperator::Gte => ">=",
            ThresholdOperator::Lt => "<",
            ThresholdOperator::Lte => "<=",
            ThresholdOperator::Eq => "==",
            ThresholdOperator::Unrecognized(op) => op.as_str(),
        }
    }

    /// Apply the operator; `Unrecognized` is always false.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdOperator::Gt => value > threshold,
            ThresholdOperator::Gte => value >= threshold,
            ThresholdOperator::Lt => value < threshold,
            ThresholdOperator::Lte => value <= threshold,
            ThresholdOperator::Eq => value == threshold,
            ThresholdOperator::Unrecognized(_) => false,
        }
    }
}

impl From<String> for ThresholdOperator {
    fn from(op: String) -> Self {
        match op.as_str() {
            ">" => ThresholdOperator::Gt,
            ">=" => ThresholdOperator::Gte,
            "<" => ThresholdOperator::Lt,
            "<=" => ThresholdOperator::Lte,
            "==" => ThresholdOperator::Eq,
            _ => ThresholdOperator::Unrecognized(op),
        }
    }
}

impl From<&str> for ThresholdOperator {
    fn from(op: &str) -> Self {
        ThresholdOperator::from(op.to_string())
    }
}

impl From<ThresholdOperator> for String {
    fn from(op: ThresholdOperator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for ThresholdOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Anomaly ─────────────────────────────────────────────────────────

/// Out-of-range check against optional lower/upper bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyParams {
    pub field: FieldPath,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(flatten)]
    pub common: CommonParams,
}

impl AnomalyParams {
    /// Lower bound; an omitted bound is `-inf` and never triggers.
    pub fn min_bound(&self) -> f64 {
        self.min_value.unwrap_or(f64::NEG_INFINITY)
    }

    /// Upper bound; an omitted bound is `+inf` and never triggers.
    pub fn max_bound(&self) -> f64 {
        self.max_value.unwrap_or(f64::INFINITY)
    }
}

// ── Tagged union ────────────────────────────────────────────────────

/// A validated parameter set tagged by rule kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleParams {
    Pattern(PatternParams),
    Threshold(ThresholdParams),
    Anomaly(AnomalyParams),
    /// Declared kind is not one the engine evaluates. Never matches.
    Unsupported { kind: String },
}

impl RuleParams {
    /// Parse `raw` according to `kind`, validating required keys.
    ///
    /// Unsupported kinds are accepted without looking at the parameters.
    pub fn parse(kind: &RuleKind, raw: &RawParameters) -> Result<Self, ParamError> {
        match kind {
            RuleKind::Pattern => {
                let p: PatternParams = decode(raw)?;
                check_field(&p.field)?;
                if p.pattern.is_empty() {
                    return Err(ParamError::Invalid {
                        name: "pattern",
                        reason: "must not be empty".to_string(),
                    });
                }
                Ok(RuleParams::Pattern(p))
            }
            RuleKind::Threshold => {
                let p: ThresholdParams = decode(raw)?;
                check_field(&p.field)?;
                if !p.threshold.is_present() {
                    return Err(ParamError::Missing("threshold"));
                }
                Ok(RuleParams::Threshold(p))
            }
            RuleKind::Anomaly => {
                let json = object(raw)?;
                // Only an omitted bound is open; a written null is a broken rule.
                for name in ["min_value", "max_value"] {
                    if json.get(name).is_some_and(serde_json::Value::is_null) {
                        return Err(ParamError::Invalid {
                            name,
                            reason: "must be a number when present, got null".to_string(),
                        });
                    }
                }
                let p: AnomalyParams = serde_json::from_value(json)?;
                check_field(&p.field)?;
                Ok(RuleParams::Anomaly(p))
            }
            RuleKind::Unsupported(other) => Ok(RuleParams::Unsupported {
                kind: other.clone(),
            }),
        }
    }

    /// The field path the rule inspects, if any.
    pub fn field(&self) -> Option<&FieldPath> {
        match self {
            RuleParams::Pattern(p) => Some(&p.field),
            RuleParams::Threshold(p) => Some(&p.field),
            RuleParams::Anomaly(p) => Some(&p.field),
            RuleParams::Unsupported { .. } => None,
        }
    }

    /// The shared optional keys; defaults for unsupported kinds.
    pub fn common(&self) -> &CommonParams {
        match self {
            RuleParams::Pattern(p) => &p.common,
            RuleParams::Threshold(p) => &p.common,
            RuleParams::Anomaly(p) => &p.common,
            RuleParams::Unsupported { .. } => &UNSUPPORTED_COMMON,
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleParams::Pattern(_) => RuleKind::Pattern,
            RuleParams::Threshold(_) => RuleKind::Threshold,
            RuleParams::Anomaly(_) => RuleKind::Anomaly,
            RuleParams::Unsupported { kind } => RuleKind::Unsupported(kind.clone()),
        }
    }
}

static UNSUPPORTED_COMMON: CommonParams = CommonParams {
    category: None,
    severity: Severity::Medium,
    base_confidence: DEFAULT_BASE_CONFIDENCE,
};

fn object(raw: &RawParameters) -> Result<serde_json::Value, ParamError> {
    let json = raw.to_json()?;
    if !json.is_object() {
        return Err(ParamError::NotAnObject(json_type_name(&json)));
    }
    Ok(json)
}

fn decode<T: DeserializeOwned>(raw: &RawParameters) -> Result<T, ParamError> {
    Ok(serde_json::from_value(object(raw)?)?)
}

fn check_field(field: &FieldPath) -> Result<(), ParamError> {
    if field.as_str().is_empty() {
        return Err(ParamError::Missing("field"));
    }
    if !field.is_well_formed() {
        return Err(ParamError::Invalid {
            name: "field",
            reason: format!("'{}' contains an empty path segment", field),
        });
    }
    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
