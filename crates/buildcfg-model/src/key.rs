//! Dot-qualified property keys

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A validated property key such as `defaultConfig.minSdk`.
///
/// Every dot-separated segment starts with an ASCII letter or underscore and
/// continues with ASCII alphanumerics or underscores.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyKey(String);

impl PropertyKey {
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        if input.is_empty() {
            return Err(invalid(input, "key is empty"));
        }
        for segment in input.split('.') {
            let mut chars = segment.chars();
            match chars.next() {
                None => return Err(invalid(input, "empty segment")),
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
                Some(c) => {
                    return Err(invalid(
                        input,
                        &format!("segment '{}' starts with '{}'", segment, c),
                    ))
                }
            }
            if let Some(c) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
                return Err(invalid(
                    input,
                    &format!("segment '{}' contains '{}'", segment, c),
                ));
            }
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First segment of the key (`android` for `android.compileSdk`).
    pub fn namespace(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

fn invalid(key: &str, reason: &str) -> ModelError {
    ModelError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for PropertyKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PropertyKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PropertyKey> for String {
    fn from(key: PropertyKey) -> Self {
        key.0
    }
}

impl Borrow<str> for PropertyKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
