//! Rule validation with structured errors and suggestions.
//!
//! Errors mean the rule cannot run: the detector skips it and reports it
//! as a failed rule. Warnings flag definitions that load fine but will
//! probably not do what the author intended.

mod checks;
pub mod fuzzy;

use serde::{Deserialize, Serialize};

use crate::schema::{RuleDefinition, RuleFile};

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location inside the definition, e.g. `"parameters.threshold"`.
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
    /// Optional "did you mean" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<&str>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: suggestion.map(str::to_string),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn warn_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<&str>,
    ) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
            suggestion: suggestion.map(str::to_string),
        });
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a stored rule definition.
pub fn validate_definition(def: &RuleDefinition) -> ValidationResult {
    let mut result = ValidationResult::new();
    checks::validate_identity(def, &mut result);
    checks::validate_kind(def, &mut result);
    checks::validate_parameters(def, &mut result);
    result
}

/// Parse a YAML rule file and validate it. Parse and header problems are
/// reported as errors.
pub fn validate_yaml(yaml: &str) -> ValidationResult {
    let file = match serde_yaml::from_str::<RuleFile>(yaml) {
        Ok(file) => file,
        Err(e) => {
            let mut result = ValidationResult::new();
            result.error("", format!("YAML parse error: {e}"));
            return result;
        }
    };
    let mut result = ValidationResult::new();
    checks::validate_header(&file, &mut result);
    let def = file.into_definition();
    checks::validate_identity(&def, &mut result);
    checks::validate_kind(&def, &mut result);
    checks::validate_parameters(&def, &mut result);
    result
}

#[cfg(test)]
mod tests;
