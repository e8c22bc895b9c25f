//! Why a rule file failed to load, and the per-file report of a scan.

use std::io;
use std::path::PathBuf;

use crate::schema::HeaderError;

/// A rule file that could not become a [`RuleDefinition`](crate::schema::RuleDefinition).
///
/// Parameter problems are not load errors: they surface per rule at
/// detection time.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a rule document: {0}")]
    Malformed(#[from] serde_yaml::Error),

    #[error("bad rule header: {0}")]
    Header(#[from] HeaderError),

    #[error("rules watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;

/// What a directory scan did with one file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    /// Parsed and stored. Disabled rules are stored too.
    Loaded { rule_id: String, enabled: bool },
    Skipped(SkipReason),
    Failed(RuleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Dotfile,
    NotRuleFile,
}

impl LoadResult {
    pub fn rule_id(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Loaded { rule_id, .. } => Some(rule_id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RuleError> {
        match &self.status {
            LoadStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}
