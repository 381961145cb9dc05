//! Property schema entries

use serde::{Deserialize, Serialize};

use crate::key::PropertyKey;
use crate::value::{TypeTag, Value};

/// Expected type and defaulting rule for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    pub key: PropertyKey,

    #[serde(rename = "type")]
    pub ty: TypeTag,

    /// Resolution fails when a required property resolves nowhere.
    #[serde(default)]
    pub required: bool,

    /// Built-in default used when no layer defines the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed constants for enum properties (empty = any).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

impl PropertySpec {
    pub fn required(key: PropertyKey, ty: TypeTag) -> Self {
        Self {
            key,
            ty,
            required: true,
            default: None,
            allowed: Vec::new(),
        }
    }

    pub fn optional(key: PropertyKey, ty: TypeTag) -> Self {
        Self {
            required: false,
            ..Self::required(key, ty)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_allowed(mut self, allowed: &[&str]) -> Self {
        self.allowed = allowed.iter().map(|s| s.to_string()).collect();
        self
    }
}
