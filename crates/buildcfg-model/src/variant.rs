//! Build variant declarations

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::Value;

/// Setting naming the signing config a variant packages with.
pub const SIGNING_CONFIG: &str = "signingConfig";

/// Setting marking a variant as debuggable.
pub const DEBUGGABLE: &str = "debuggable";

/// Setting enabling code shrinking.
pub const MINIFY_ENABLED: &str = "minifyEnabled";

/// Setting enabling resource shrinking.
pub const SHRINK_RESOURCES: &str = "shrinkResources";

/// A named build variant with optional parent and typed overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildVariant {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub overrides: BTreeMap<String, Value>,
}

impl BuildVariant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_override(mut self, setting: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(setting.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_toml() {
        let variant: BuildVariant = toml::from_str(
            r#"
            name = "release"
            parent = "debug"

            [overrides]
            debuggable = false
            signingConfig = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(variant.parent.as_deref(), Some("debug"));
        assert_eq!(variant.overrides[DEBUGGABLE], Value::Boolean(false));
        assert_eq!(variant.overrides[SIGNING_CONFIG], Value::from("debug"));
    }
}
