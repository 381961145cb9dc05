//! Effective configuration
//!
//! The immutable result of one successful resolution. It carries no
//! timestamps, so resolving the same declarations twice yields equal values
//! and byte-identical JSON.

use buildcfg_model::{Coordinate, Dependency, PluginDeclaration, SigningConfig, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::ErrorKind;
use crate::options::ResolverOptions;
use crate::property::ResolvedProperty;
use crate::variant::{ResolvedVariant, SigningReuse};

/// Schema version for effective_configuration.json
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "buildcfg/effective_configuration@1";

/// Something legal but worth a second look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Warning {
    /// A second coordinate for a (role, library) pair was ignored
    DuplicateDependency {
        role: String,
        kept: Coordinate,
        ignored: Coordinate,
    },

    /// A variant could not be resolved and was left out
    VariantOmitted {
        variant: String,
        kind: ErrorKind,
        reason: String,
    },

    /// A release variant shares a debuggable variant's signing config
    SigningReuse(SigningReuse),
}

/// Resolved configuration of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfiguration {
    schema_version: u32,
    schema_id: String,

    /// SHA-256 of the canonical (JCS) declaration tree
    declaration_digest: String,

    target_layer: String,

    properties: BTreeMap<String, ResolvedProperty>,

    /// Plugins in application order
    plugins: Vec<PluginDeclaration>,

    /// Dependencies sorted by role, then library
    dependencies: Vec<Dependency>,

    variants: BTreeMap<String, ResolvedVariant>,

    /// Signing configs with passwords redacted
    signing_configs: BTreeMap<String, SigningConfig>,

    warnings: Vec<Warning>,

    /// Redacted key paths
    redactions: Vec<String>,

    options: ResolverOptions,
}

/// Parts assembled by the resolver.
pub(crate) struct Parts {
    pub declaration_digest: String,
    pub target_layer: String,
    pub properties: BTreeMap<String, ResolvedProperty>,
    pub plugins: Vec<PluginDeclaration>,
    pub dependencies: Vec<Dependency>,
    pub variants: BTreeMap<String, ResolvedVariant>,
    pub signing_configs: BTreeMap<String, SigningConfig>,
    pub warnings: Vec<Warning>,
    pub redactions: Vec<String>,
    pub options: ResolverOptions,
}

impl EffectiveConfiguration {
    pub(crate) fn from_parts(parts: Parts) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            declaration_digest: parts.declaration_digest,
            target_layer: parts.target_layer,
            properties: parts.properties,
            plugins: parts.plugins,
            dependencies: parts.dependencies,
            variants: parts.variants,
            signing_configs: parts.signing_configs,
            warnings: parts.warnings,
            redactions: parts.redactions,
            options: parts.options,
        }
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn declaration_digest(&self) -> &str {
        &self.declaration_digest
    }

    pub fn target_layer(&self) -> &str {
        &self.target_layer
    }

    /// Resolved value of a property
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).map(|p| &p.value)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_enum(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_enum)
    }

    /// Resolved property with its provenance
    pub fn property(&self, key: &str) -> Option<&ResolvedProperty> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &BTreeMap<String, ResolvedProperty> {
        &self.properties
    }

    pub fn plugins(&self) -> &[PluginDeclaration] {
        &self.plugins
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn dependencies_for<'a>(
        &'a self,
        role: &'a str,
    ) -> impl Iterator<Item = &'a Coordinate> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| d.role == role)
            .map(|d| &d.coordinate)
    }

    pub fn variant(&self, name: &str) -> Option<&ResolvedVariant> {
        self.variants.get(name)
    }

    pub fn variants(&self) -> &BTreeMap<String, ResolvedVariant> {
        &self.variants
    }

    pub fn signing_config(&self, name: &str) -> Option<&SigningConfig> {
        self.signing_configs.get(name)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn redactions(&self) -> &[String] {
        &self.redactions
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            )
        })?;
        fs::write(path, json)
    }
}
