//! Property schema
//!
//! The schema lists which properties must resolve, their types, and the
//! built-in defaults used when no layer defines them. Declarations may carry
//! their own schema; otherwise [`Schema::application_module`] applies.

use buildcfg_model::{ModelError, PropertyKey, PropertySpec, TypeTag, Value};
use std::collections::BTreeMap;

use crate::error::{Origin, ResolveError};
use crate::property::ResolvedProperty;

/// Java language levels accepted for compile options.
pub const JAVA_VERSIONS: &[&str] = &["VERSION_1_8", "VERSION_11", "VERSION_17", "VERSION_21"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    specs: BTreeMap<PropertyKey, PropertySpec>,
}

impl Schema {
    /// Build a schema, checking every default against its own spec.
    pub fn new(specs: Vec<PropertySpec>) -> Result<Self, ResolveError> {
        let mut indexed = BTreeMap::new();
        for spec in specs {
            if let Some(default) = &spec.default {
                check_value(&spec, default, &Origin::Builtin)?;
            }
            if indexed.contains_key(&spec.key) {
                return Err(ResolveError::InvalidValue {
                    key: spec.key.to_string(),
                    origin: Origin::Builtin,
                    reason: "declared more than once in schema".to_string(),
                });
            }
            indexed.insert(spec.key.clone(), spec);
        }
        Ok(Self { specs: indexed })
    }

    /// Schema for an application module.
    pub fn application_module() -> Result<Self, ResolveError> {
        let specs = application_specs().map_err(|e| ResolveError::InvalidValue {
            key: "schema".to_string(),
            origin: Origin::Builtin,
            reason: e.to_string(),
        })?;
        Self::new(specs)
    }

    pub fn get(&self, key: &str) -> Option<&PropertySpec> {
        self.specs.get(key)
    }

    pub fn specs(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.specs.keys()
    }

    /// Check a resolved property against its spec, if it has one.
    pub fn check(&self, key: &str, resolved: &ResolvedProperty) -> Result<(), ResolveError> {
        match self.get(key) {
            Some(spec) => check_value(spec, &resolved.value, &resolved.origin),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn check_value(spec: &PropertySpec, value: &Value, origin: &Origin) -> Result<(), ResolveError> {
    if value.type_tag() != spec.ty {
        return Err(ResolveError::TypeMismatch {
            key: spec.key.to_string(),
            origin: origin.clone(),
            expected: spec.ty,
            found: value.type_tag(),
        });
    }
    if let Value::Enum(constant) = value {
        if !spec.allowed.is_empty() && !spec.allowed.contains(constant) {
            return Err(ResolveError::InvalidValue {
                key: spec.key.to_string(),
                origin: origin.clone(),
                reason: format!(
                    "'{}' is not one of {}",
                    constant,
                    spec.allowed.join(", ")
                ),
            });
        }
    }
    Ok(())
}

fn application_specs() -> Result<Vec<PropertySpec>, ModelError> {
    let key = PropertyKey::parse;
    Ok(vec![
        PropertySpec::required(key("android.namespace")?, TypeTag::String),
        PropertySpec::required(key("android.compileSdk")?, TypeTag::Integer),
        PropertySpec::optional(key("android.ndkVersion")?, TypeTag::String),
        PropertySpec::optional(key("compileOptions.sourceCompatibility")?, TypeTag::Enum)
            .with_default(Value::Enum("VERSION_1_8".to_string()))
            .with_allowed(JAVA_VERSIONS),
        PropertySpec::optional(key("compileOptions.targetCompatibility")?, TypeTag::Enum)
            .with_default(Value::Enum("VERSION_1_8".to_string()))
            .with_allowed(JAVA_VERSIONS),
        PropertySpec::optional(key("compileOptions.coreLibraryDesugaring")?, TypeTag::Boolean)
            .with_default(false),
        PropertySpec::optional(key("kotlinOptions.jvmTarget")?, TypeTag::String)
            .with_default("1.8"),
        PropertySpec::required(key("defaultConfig.applicationId")?, TypeTag::String),
        PropertySpec::optional(key("defaultConfig.minSdk")?, TypeTag::Integer).with_default(21),
        PropertySpec::required(key("defaultConfig.targetSdk")?, TypeTag::Integer),
        PropertySpec::optional(key("defaultConfig.versionCode")?, TypeTag::Integer)
            .with_default(1),
        PropertySpec::optional(key("defaultConfig.versionName")?, TypeTag::String)
            .with_default("1.0"),
        PropertySpec::optional(key("defaultConfig.multiDexEnabled")?, TypeTag::Boolean)
            .with_default(false),
        PropertySpec::optional(key("flutter.source")?, TypeTag::String),
    ])
}
