//! Typed property values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a property or variant setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Integer,
    Boolean,
    Enum,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Enum => write!(f, "enum"),
        }
    }
}

/// A concrete, typed value.
///
/// Serialized as a bare scalar for strings, integers and booleans. Enum
/// constants are written as `{ enum = "VERSION_1_8" }` so they stay
/// distinguishable from free-form strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ValueRepr", into = "ValueRepr")]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Enum(String),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::String(_) => TypeTag::String,
            Self::Integer(_) => TypeTag::Integer,
            Self::Boolean(_) => TypeTag::Boolean,
            Self::Enum(_) => TypeTag::Enum,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Enum constant, if this is an enum value.
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            Self::Enum(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Enum(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Boolean(bool),
    Integer(i64),
    String(String),
    Enum {
        #[serde(rename = "enum")]
        constant: String,
    },
}

impl From<ValueRepr> for Value {
    fn from(repr: ValueRepr) -> Self {
        match repr {
            ValueRepr::Boolean(b) => Self::Boolean(b),
            ValueRepr::Integer(i) => Self::Integer(i),
            ValueRepr::String(s) => Self::String(s),
            ValueRepr::Enum { constant } => Self::Enum(constant),
        }
    }
}

impl From<Value> for ValueRepr {
    fn from(value: Value) -> Self {
        match value {
            Value::Boolean(b) => Self::Boolean(b),
            Value::Integer(i) => Self::Integer(i),
            Value::String(s) => Self::String(s),
            Value::Enum(constant) => Self::Enum { constant },
        }
    }
}
