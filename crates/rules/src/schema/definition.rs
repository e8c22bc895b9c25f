//! Stored rule definitions as supplied by a rule source.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use super::{ParamError, RuleKind, RuleParams};

pub const DEFAULT_CATEGORY: &str = "general";

pub(crate) fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

/// One red-flag rule in its stored form.
///
/// `parameters` is left unparsed; [`RuleDefinition::compile_params`] turns it
/// into the typed set for the declared `rule_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_type: RuleKind,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub parameters: RawParameters,
}

impl RuleDefinition {
    pub fn new(
        id: impl Into<RuleId>,
        name: impl Into<String>,
        rule_type: RuleKind,
        parameters: RawParameters,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            rule_type,
            category: default_category(),
            is_active: true,
            parameters,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Parse and validate the parameter blob for the declared kind.
    pub fn compile_params(&self) -> Result<RuleParams, ParamError> {
        RuleParams::parse(&self.rule_type, &self.parameters)
    }
}

/// Rule parameters as stored: either a JSON text blob or an already
/// structured mapping (rule files write them inline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawParameters {
    Blob(String),
    Inline(serde_json::Value),
}

impl RawParameters {
    /// Decode to a JSON value. Blobs are parsed; inline mappings are cloned.
    pub fn to_json(&self) -> Result<serde_json::Value, ParamError> {
        match self {
            RawParameters::Blob(text) => Ok(serde_json::from_str(text)?),
            RawParameters::Inline(value) => Ok(value.clone()),
        }
    }
}

impl From<serde_json::Value> for RawParameters {
    fn from(value: serde_json::Value) -> Self {
        RawParameters::Inline(value)
    }
}

impl From<&str> for RawParameters {
    fn from(text: &str) -> Self {
        RawParameters::Blob(text.to_string())
    }
}

/// A rule id as its source wrote it.
///
/// Database rows carry integer keys and rule files carry slugs. Ids compare,
/// display and sort by their text, and an integer id serializes back as an
/// integer so results keep the shape callers stored.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId {
    text: String,
    int: Option<i64>,
}

impl RuleId {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The integer form, for ids that were supplied as integers.
    pub fn as_int(&self) -> Option<i64> {
        self.int
    }
}

impl From<String> for RuleId {
    fn from(text: String) -> Self {
        Self { text, int: None }
    }
}

impl From<&str> for RuleId {
    fn from(text: &str) -> Self {
        RuleId::from(text.to_string())
    }
}

impl From<i64> for RuleId {
    fn from(id: i64) -> Self {
        Self {
            text: id.to_string(),
            int: Some(id),
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq<str> for RuleId {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for RuleId {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl Serialize for RuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.int {
            Some(id) => serializer.serialize_i64(id),
            None => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for RuleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = RuleId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer rule id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RuleId, E> {
                Ok(RuleId::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RuleId, E> {
                Ok(RuleId::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RuleId, E> {
                Ok(RuleId::from(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RuleId, E> {
                // Keys past i64 keep their digits but not their integer form.
                Ok(i64::try_from(v).map_or_else(|_| RuleId::from(v.to_string()), RuleId::from))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}
