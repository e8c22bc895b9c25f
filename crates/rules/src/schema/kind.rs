//! Declared rule kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The evaluation strategy a rule declares through its `rule_type`.
///
/// Anything outside the three known kinds is kept as `Unsupported` so the
/// rule can be carried through a snapshot and silently never match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    Pattern,
    Threshold,
    Anomaly,
    Unsupported(String),
}

/// Rule type names accepted in `rule_type`, used for suggestions.
pub const KNOWN_RULE_TYPES: &[&str] = &["pattern", "threshold", "anomaly"];

impl RuleKind {
    pub fn as_str(&self) -> &str {
        match self {
            RuleKind::Pattern => "pattern",
            RuleKind::Threshold => "threshold",
            RuleKind::Anomaly => "anomaly",
            RuleKind::Unsupported(other) => other.as_str(),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, RuleKind::Unsupported(_))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(RuleKind::from(s))
    }
}

impl From<String> for RuleKind {
    fn from(s: String) -> Self {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "pattern" => RuleKind::Pattern,
            "threshold" => RuleKind::Threshold,
            "anomaly" => RuleKind::Anomaly,
            _ => RuleKind::Unsupported(s),
        }
    }
}

impl From<&str> for RuleKind {
    fn from(s: &str) -> Self {
        RuleKind::from(s.to_string())
    }
}

impl From<RuleKind> for String {
    fn from(kind: RuleKind) -> Self {
        kind.as_str().to_string()
    }
}
