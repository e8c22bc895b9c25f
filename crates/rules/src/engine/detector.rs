//! Long-lived detector holding a compiled rule snapshot.

use std::sync::{Arc, RwLock};

use procwatch_core::Value;
use tracing::info;

use crate::source::{RuleSource, SourceError};

use super::{DetectError, DetectionEngine, DetectionReport, RuleSet};

/// Detector bound to a [`RuleSource`].
///
/// The active rules are compiled once into an [`Arc<RuleSet>`] snapshot.
/// The snapshot never changes behind the caller's back: call
/// [`Detector::reload`] to pull a fresh rule set from the source. A
/// detection already running keeps the snapshot it started with.
pub struct Detector<S> {
    source: S,
    engine: DetectionEngine,
    snapshot: RwLock<Arc<RuleSet>>,
}

impl<S: RuleSource> Detector<S> {
    /// Build a detector and load the initial snapshot.
    pub fn new(source: S, engine: DetectionEngine) -> Result<Self, SourceError> {
        let snapshot = compile_from(&source)?;
        Ok(Self {
            source,
            engine,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Re-read the source and swap in a new snapshot.
    ///
    /// On error the previous snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<RuleSet>, SourceError> {
        let fresh = Arc::new(compile_from(&self.source)?);
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::clone(&fresh);
        Ok(fresh)
    }

    /// The snapshot detections currently run against.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Evaluate the current snapshot against `record`.
    pub fn detect(&self, record: &Value) -> Result<DetectionReport, DetectError> {
        let rules = self.snapshot();
        self.engine.detect_compiled(&rules, record)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn engine(&self) -> &DetectionEngine {
        &self.engine
    }
}

fn compile_from<S: RuleSource>(source: &S) -> Result<RuleSet, SourceError> {
    let definitions = source.active_rules()?;
    let set = RuleSet::compile(&definitions);
    info!(
        rules = set.len(),
        skipped = set.diagnostics().len(),
        "compiled rule snapshot"
    );
    Ok(set)
}
