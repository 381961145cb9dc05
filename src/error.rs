//! Resolution errors
//!
//! Every failure the resolver can report is a [`ResolveError`]. Each error
//! carries a stable [`ErrorKind`] code and the layer/key/variant that
//! triggered it, so a build host can act on it without parsing messages.

use buildcfg_model::{Coordinate, TypeTag};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resolver::ResolverState;

/// Where a value or failure came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A configuration layer
    Layer(String),
    /// A build variant
    Variant(String),
    /// Built-in schema defaults
    Builtin,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer(name) => write!(f, "layer '{}'", name),
            Self::Variant(name) => write!(f, "variant '{}'", name),
            Self::Builtin => write!(f, "built-in defaults"),
        }
    }
}

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    TypeMismatch,
    NotFound,
    PluginConflict,
    DependencyDuplicate,
    VariantCycle,
    UnknownVariantParent,
    ReferenceCycle,
    InvalidValue,
    DuplicateLayer,
    UnknownLayerParent,
    LayerCycle,
    DuplicateVariant,
    UnknownSigningConfig,
    DuplicateSigningConfig,
    ConsistencyViolation,
    EmptyDeclarations,
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::NotFound => "NOT_FOUND",
            Self::PluginConflict => "PLUGIN_CONFLICT",
            Self::DependencyDuplicate => "DEPENDENCY_DUPLICATE",
            Self::VariantCycle => "VARIANT_CYCLE",
            Self::UnknownVariantParent => "UNKNOWN_VARIANT_PARENT",
            Self::ReferenceCycle => "REFERENCE_CYCLE",
            Self::InvalidValue => "INVALID_VALUE",
            Self::DuplicateLayer => "DUPLICATE_LAYER",
            Self::UnknownLayerParent => "UNKNOWN_LAYER_PARENT",
            Self::LayerCycle => "LAYER_CYCLE",
            Self::DuplicateVariant => "DUPLICATE_VARIANT",
            Self::UnknownSigningConfig => "UNKNOWN_SIGNING_CONFIG",
            Self::DuplicateSigningConfig => "DUPLICATE_SIGNING_CONFIG",
            Self::ConsistencyViolation => "CONSISTENCY_VIOLATION",
            Self::EmptyDeclarations => "EMPTY_DECLARATIONS",
            Self::InvalidState => "INVALID_STATE",
        };
        f.write_str(code)
    }
}

/// Errors raised while validating and resolving declarations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Type mismatch for '{key}' in {origin}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        origin: Origin,
        expected: TypeTag,
        found: TypeTag,
    },

    #[error("Property '{key}' is not defined in layer '{layer}' or any ancestor")]
    NotFound { key: String, layer: String },

    #[error("Layer '{layer}' is not declared")]
    LayerNotFound { layer: String },

    #[error("No configuration layers declared")]
    NoTargetLayer,

    #[error("Variant '{variant}' is not defined")]
    VariantNotFound { variant: String },

    #[error("Reference cycle while resolving '{key}' from layer '{layer}': {}", .chain.join(" -> "))]
    ReferenceCycle {
        key: String,
        layer: String,
        chain: Vec<String>,
    },

    #[error("Invalid value for '{key}' in {origin}: {reason}")]
    InvalidValue {
        key: String,
        origin: Origin,
        reason: String,
    },

    #[error("Plugin '{id}' declared with conflicting versions: {} vs {}", display_constraint(.existing), display_constraint(.requested))]
    PluginConflict {
        id: String,
        existing: Option<String>,
        requested: Option<String>,
    },

    #[error("Dependency '{}' already declared for role '{role}' as '{existing}'", .duplicate)]
    DependencyDuplicate {
        role: String,
        existing: Coordinate,
        duplicate: Coordinate,
    },

    #[error("Variant '{variant}' is part of a parent cycle: {}", .cycle.join(" -> "))]
    VariantCycle { variant: String, cycle: Vec<String> },

    #[error("Variant '{variant}' names unknown parent '{parent}'")]
    UnknownVariantParent { variant: String, parent: String },

    #[error("Variant '{variant}' is declared more than once")]
    DuplicateVariant { variant: String },

    #[error("Layer '{layer}' is declared more than once")]
    DuplicateLayer { layer: String },

    #[error("Layer '{layer}' names unknown parent '{parent}'")]
    UnknownLayerParent { layer: String, parent: String },

    #[error("Layer '{layer}' is part of a parent cycle: {}", .cycle.join(" -> "))]
    LayerCycle { layer: String, cycle: Vec<String> },

    #[error("Variant '{variant}' uses undeclared signing config '{signing_config}'")]
    UnknownSigningConfig {
        variant: String,
        signing_config: String,
    },

    #[error("Signing config '{name}' is declared more than once")]
    DuplicateSigningConfig { name: String },

    #[error("Consistency rule '{rule}' failed for '{key}': {message}")]
    ConsistencyViolation {
        rule: String,
        key: String,
        message: String,
    },

    #[error("No declarations were ingested")]
    EmptyDeclarations,

    #[error("Cannot {operation} while resolver is {state:?}")]
    InvalidState {
        state: ResolverState,
        operation: &'static str,
    },
}

fn display_constraint(constraint: &Option<String>) -> String {
    match constraint {
        Some(v) => format!("'{}'", v),
        None => "unconstrained".to_string(),
    }
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::NotFound { .. }
            | Self::LayerNotFound { .. }
            | Self::NoTargetLayer
            | Self::VariantNotFound { .. } => ErrorKind::NotFound,
            Self::ReferenceCycle { .. } => ErrorKind::ReferenceCycle,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::PluginConflict { .. } => ErrorKind::PluginConflict,
            Self::DependencyDuplicate { .. } => ErrorKind::DependencyDuplicate,
            Self::VariantCycle { .. } => ErrorKind::VariantCycle,
            Self::UnknownVariantParent { .. } => ErrorKind::UnknownVariantParent,
            Self::DuplicateVariant { .. } => ErrorKind::DuplicateVariant,
            Self::DuplicateLayer { .. } => ErrorKind::DuplicateLayer,
            Self::UnknownLayerParent { .. } => ErrorKind::UnknownLayerParent,
            Self::LayerCycle { .. } => ErrorKind::LayerCycle,
            Self::UnknownSigningConfig { .. } => ErrorKind::UnknownSigningConfig,
            Self::DuplicateSigningConfig { .. } => ErrorKind::DuplicateSigningConfig,
            Self::ConsistencyViolation { .. } => ErrorKind::ConsistencyViolation,
            Self::EmptyDeclarations => ErrorKind::EmptyDeclarations,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// The layer, key and variant this failure points at.
    pub fn location(&self) -> Location {
        let mut location = Location::default();
        match self {
            Self::TypeMismatch { key, origin, .. } | Self::InvalidValue { key, origin, .. } => {
                location.key = Some(key.clone());
                match origin {
                    Origin::Layer(layer) => location.layer = Some(layer.clone()),
                    Origin::Variant(variant) => location.variant = Some(variant.clone()),
                    Origin::Builtin => {}
                }
            }
            Self::NotFound { key, layer } | Self::ReferenceCycle { key, layer, .. } => {
                location.key = Some(key.clone());
                location.layer = Some(layer.clone());
            }
            Self::LayerNotFound { layer }
            | Self::DuplicateLayer { layer }
            | Self::UnknownLayerParent { layer, .. }
            | Self::LayerCycle { layer, .. } => {
                location.layer = Some(layer.clone());
            }
            Self::VariantNotFound { variant }
            | Self::VariantCycle { variant, .. }
            | Self::UnknownVariantParent { variant, .. }
            | Self::DuplicateVariant { variant }
            | Self::UnknownSigningConfig { variant, .. } => {
                location.variant = Some(variant.clone());
            }
            Self::PluginConflict { id, .. } => location.key = Some(format!("plugins.{}", id)),
            Self::DependencyDuplicate { role, duplicate, .. } => {
                location.key = Some(format!("dependencies.{}.{}", role, duplicate.identity()));
            }
            Self::DuplicateSigningConfig { name } => {
                location.key = Some(format!("signing_configs.{}", name));
            }
            Self::ConsistencyViolation { key, .. } => location.key = Some(key.clone()),
            Self::NoTargetLayer | Self::EmptyDeclarations | Self::InvalidState { .. } => {}
        }
        location
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            kind: self.kind(),
            location: self.location(),
            message: self.to_string(),
        }
    }
}

/// Offending layer/key/variant of a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// Structured failure report handed to the build host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,

    #[serde(flatten)]
    pub location: Location,

    pub message: String,
}
