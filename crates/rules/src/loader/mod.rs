//! Filesystem rule loader with hot-reload via `notify` watcher.
//!
//! Scans the rules directory for YAML/JSON rule files, keeps the parsed
//! definitions in memory keyed by rule id, and serves them as a
//! [`RuleSource`](crate::source::RuleSource). The watcher re-reads files
//! that change and drops rules whose file is deleted.

mod core;
mod error;
mod watcher;


pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError, SkipReason};
