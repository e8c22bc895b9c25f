//! Red-flag detection rule engine for procurement records.
//!
//! This crate provides:
//! - Rule definitions with typed, per-kind parameter sets
//! - Pattern, threshold and anomaly evaluators over dynamic records
//! - Confidence scoring and severity classification
//! - A detection orchestrator with per-rule failure isolation
//! - Rule sources (in-memory, bundle files, hot-reloaded rule directory)
//!   and result sinks
//! - Rule validation with "did you mean" suggestions

pub mod engine;
pub mod evaluator;
pub mod loader;
pub mod schema;
pub mod scoring;
pub mod sink;
pub mod source;
pub mod validation;

pub use engine::{
    detect, DetectError, DetectionEngine, DetectionReport, DetectionResult, Detector,
    RuleDiagnostic, RuleSet,
};
pub use schema::{RawParameters, RuleDefinition, RuleId, RuleKind, RuleParams, Severity};
