//! Dependency coordinates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A `[group:]artifact[:version]` coordinate.
///
/// Identity is `group:artifact`, or the bare artifact when no group is
/// given; two coordinates that differ only in version name the same library.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub group: Option<String>,
    pub artifact: String,
    pub version: Option<String>,
}

impl Coordinate {
    /// Parse `group:artifact:version`, `group:artifact` or `artifact:version`.
    ///
    /// A two-part coordinate whose last segment starts with a digit is
    /// `artifact:version`; otherwise it is `group:artifact`.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        if input.chars().any(char::is_whitespace) {
            return Err(invalid(input, "contains whitespace"));
        }

        let parts: Vec<&str> = input.split(':').collect();
        let (group, artifact, version) = match parts.as_slice() {
            [artifact, version] if looks_like_version(version) => (None, *artifact, Some(*version)),
            [group, artifact] => (Some(*group), *artifact, None),
            [group, artifact, version] => (Some(*group), *artifact, Some(*version)),
            _ => {
                return Err(invalid(input, "expected [group:]artifact[:version]"));
            }
        };

        if group == Some("") {
            return Err(invalid(input, "group is empty"));
        }
        if artifact.is_empty() {
            return Err(invalid(input, "artifact is empty"));
        }
        if version == Some("") {
            return Err(invalid(input, "version is empty"));
        }

        Ok(Self {
            group: group.map(str::to_string),
            artifact: artifact.to_string(),
            version: version.map(str::to_string),
        })
    }

    /// `group:artifact`, ignoring version.
    pub fn identity(&self) -> String {
        match &self.group {
            Some(group) => format!("{}:{}", group, self.artifact),
            None => self.artifact.clone(),
        }
    }

    pub fn same_library(&self, other: &Coordinate) -> bool {
        self.group == other.group && self.artifact == other.artifact
    }
}

fn looks_like_version(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_ascii_digit())
}

fn invalid(input: &str, reason: &str) -> ModelError {
    ModelError::InvalidCoordinate {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for Coordinate {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Coordinate> for String {
    fn from(c: Coordinate) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}", self.identity(), v),
            None => f.write_str(&self.identity()),
        }
    }
}

/// A dependency declaration tagged by role.
///
/// Roles mirror build-script configuration names such as `implementation`
/// or `coreLibraryDesugaring`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    pub role: String,
    pub coordinate: Coordinate,
}

impl Dependency {
    pub fn new(role: impl Into<String>, coordinate: &str) -> Result<Self, ModelError> {
        Ok(Self {
            role: role.into(),
            coordinate: Coordinate::parse(coordinate)?,
        })
    }
}
