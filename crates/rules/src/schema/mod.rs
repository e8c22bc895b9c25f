//! Rule schema types with serde deserialization.
//!
//! Defines the type hierarchy for red-flag rules:
//! - `RuleDefinition`: the stored form handed over by a rule source, with
//!   its parameters still an opaque blob
//! - `RuleKind` / `RuleParams`: the declared kind and its typed, validated
//!   parameter set
//! - `RuleFile`: the on-disk YAML envelope read by the filesystem loader

mod definition;
mod file;
mod kind;
mod params;
mod severity;

pub use definition::*;
pub use file::*;
pub use kind::*;
pub use params::*;
pub use severity::*;

#[cfg(test)]
mod tests;
