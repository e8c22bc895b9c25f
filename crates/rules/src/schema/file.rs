//! On-disk rule document with an `apiVersion` / `kind` / `metadata` header.

use serde::{Deserialize, Serialize};

use super::definition::{default_category, default_true};
use super::{RawParameters, RuleDefinition, RuleKind};

pub const API_VERSION: &str = "v1";
pub const RULE_FILE_KIND: &str = "RedFlagRule";

/// A red-flag rule as written in a YAML (or JSON) file.
///
/// ```yaml
/// apiVersion: v1
/// kind: RedFlagRule
/// metadata:
///   id: high-value-award
///   name: High value award
/// rule_type: threshold
/// category: financial
/// parameters:
///   field: value_amount
///   threshold: 1000000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: RuleMetadata,
    pub rule_type: RuleKind,
    #[serde(default = "default_category")]
    pub category: String,
    pub parameters: RawParameters,
}

/// Identity and lifecycle fields of a rule file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A header field of a rule file that is present but wrong.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HeaderError {
    /// `apiVersion`, `kind` or `metadata.id`.
    pub field: &'static str,
    pub message: String,
}

impl HeaderError {
    fn new(field: &'static str, message: String) -> Self {
        Self { field, message }
    }
}

impl RuleFile {
    /// Check the header fields that serde cannot express.
    pub fn check_header(&self) -> Result<(), HeaderError> {
        if self.api_version != API_VERSION {
            return Err(HeaderError::new(
                "apiVersion",
                format!("apiVersion must be '{}', got '{}'", API_VERSION, self.api_version),
            ));
        }
        if self.kind != RULE_FILE_KIND {
            return Err(HeaderError::new(
                "kind",
                format!("kind must be '{}', got '{}'", RULE_FILE_KIND, self.kind),
            ));
        }
        if self.metadata.id.trim().is_empty() {
            return Err(HeaderError::new(
                "metadata.id",
                "rule metadata.id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Flatten into the stored form the engine consumes.
    pub fn into_definition(self) -> RuleDefinition {
        RuleDefinition {
            id: self.metadata.id.into(),
            name: self.metadata.name,
            description: self.metadata.description.unwrap_or_default(),
            rule_type: self.rule_type,
            category: self.category,
            is_active: self.metadata.enabled,
            parameters: self.parameters,
        }
    }
}
