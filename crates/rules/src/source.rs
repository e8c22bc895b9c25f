//! Rule sources: where the active rule set comes from.
//!
//! The engine never stores rules itself. A [`RuleSource`] hands over an
//! ordered list of definitions whenever a snapshot is built.

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::schema::RuleDefinition;

/// Errors raised while fetching rules from a source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse rule bundle: {0}")]
    Parse(String),

    /// The source produced no rule collection at all (as opposed to an empty one).
    #[error("rule collection is null")]
    NullRuleSet,

    #[error("rule source unavailable: {0}")]
    Unavailable(String),
}

/// Supplier of the active rule set, in evaluation order.
pub trait RuleSource {
    /// Active rules only, in the order they should be evaluated.
    fn active_rules(&self) -> Result<Vec<RuleDefinition>, SourceError>;
}

impl<T: RuleSource + ?Sized> RuleSource for &T {
    fn active_rules(&self) -> Result<Vec<RuleDefinition>, SourceError> {
        (**self).active_rules()
    }
}

impl<T: RuleSource + ?Sized> RuleSource for Arc<T> {
    fn active_rules(&self) -> Result<Vec<RuleDefinition>, SourceError> {
        (**self).active_rules()
    }
}

/// In-memory rule source. The list can be swapped at runtime.
#[derive(Debug, Default)]
pub struct StaticRuleSource {
    rules: RwLock<Vec<RuleDefinition>>,
}

impl StaticRuleSource {
    pub fn new(rules: Vec<RuleDefinition>) -> Self {
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Replace the whole rule list.
    pub fn replace(&self, rules: Vec<RuleDefinition>) {
        *self.rules.write().expect("rules lock poisoned") = rules;
    }
}

impl RuleSource for StaticRuleSource {
    fn active_rules(&self) -> Result<Vec<RuleDefinition>, SourceError> {
        Ok(self
            .rules
            .read()
            .expect("rules lock poisoned")
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }
}

/// Read a bundle file holding an array of rule definitions.
///
/// `.json` files are parsed as JSON, anything else as YAML. A bundle whose
/// top level is `null` is rejected; an empty array is a valid empty set.
pub fn load_bundle(path: &Path) -> Result<Vec<RuleDefinition>, SourceError> {
    let contents = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let parsed: Option<Vec<RuleDefinition>> = if is_json {
        serde_json::from_str(&contents).map_err(|e| SourceError::Parse(e.to_string()))?
    } else {
        serde_yaml::from_str(&contents).map_err(|e| SourceError::Parse(e.to_string()))?
    };
    let rules = parsed.ok_or(SourceError::NullRuleSet)?;
    info!(path = %path.display(), rules = rules.len(), "loaded rule bundle");
    Ok(rules)
}
