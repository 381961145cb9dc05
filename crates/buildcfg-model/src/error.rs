//! Errors raised while building or parsing declarations.

/// Shape errors in a declaration.
///
/// These are raised before resolution starts; the resolver never sees a
/// declaration that failed to construct.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid property key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Invalid coordinate '{input}': {reason}")]
    InvalidCoordinate { input: String, reason: String },

    #[error("Property '{key}' is declared twice in layer '{layer}'")]
    DuplicateProperty { layer: String, key: String },

    #[error("Invalid property binding: {0}")]
    InvalidBinding(String),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
