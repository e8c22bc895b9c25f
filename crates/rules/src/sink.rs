//! Result sinks: where findings go after a detection call.
//!
//! The engine has no write side effects. Callers hand a report's findings
//! to a [`ResultSink`] for persistence or alerting.

use std::io::Write;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::engine::DetectionResult;
use crate::schema::Severity;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Consumer of detection results.
pub trait ResultSink {
    fn accept(&self, results: &[DetectionResult]) -> Result<(), SinkError>;
}

/// The red-flag shape stored by the surrounding platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlagRecord {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub confidence_score: f64,
    pub category: String,
    pub source: String,
    pub is_active: bool,
}

impl From<&DetectionResult> for RedFlagRecord {
    fn from(result: &DetectionResult) -> Self {
        Self {
            title: result.rule_name.clone(),
            description: result.rule_description.clone(),
            severity: result.severity,
            confidence_score: result.confidence_score,
            category: result.category.clone(),
            source: result.source.clone(),
            is_active: true,
        }
    }
}

/// Collects every accepted result in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    results: Mutex<Vec<DetectionResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<DetectionResult> {
        self.results.lock().expect("sink lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.results.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn accept(&self, results: &[DetectionResult]) -> Result<(), SinkError> {
        self.results
            .lock()
            .expect("sink lock poisoned")
            .extend_from_slice(results);
        Ok(())
    }
}

/// Output layout for [`JsonWriterSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{"red_flags": [...]}`, one document per accepted batch.
    #[default]
    Envelope,
    /// One [`RedFlagRecord`] per line.
    Records,
}

#[derive(Serialize)]
struct Envelope<'a> {
    red_flags: &'a [DetectionResult],
}

/// Writes accepted results as newline-delimited JSON.
pub struct JsonWriterSink<W: Write> {
    writer: Mutex<W>,
    format: OutputFormat,
}

impl<W: Write> JsonWriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write> ResultSink for JsonWriterSink<W> {
    fn accept(&self, results: &[DetectionResult]) -> Result<(), SinkError> {
        let mut out = self.writer.lock().expect("writer lock poisoned");
        match self.format {
            OutputFormat::Envelope => {
                serde_json::to_writer(&mut *out, &Envelope { red_flags: results })?;
                writeln!(out)?;
            }
            OutputFormat::Records => {
                for result in results {
                    serde_json::to_writer(&mut *out, &RedFlagRecord::from(result))?;
                    writeln!(out)?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}
