//! Configuration layers
//!
//! A layer is a named, ordered set of property bindings with at most one
//! parent. Layers are written in TOML as:
//!
//! ```toml
//! [[layers]]
//! name = "app"
//! parent = "flutter"
//!
//! [layers.properties]
//! "android.namespace" = "com.example.fast_flow"
//! "android.compileSdk" = { ref = "flutter.compileSdkVersion" }
//! "compileOptions.sourceCompatibility" = { enum = "VERSION_1_8" }
//! "defaultConfig.versionCode" = { inherit = true, type = "integer" }
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::ModelError;
use crate::key::PropertyKey;
use crate::value::{TypeTag, Value};

/// How a layer binds a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BindingRepr", into = "BindingRepr")]
pub enum Binding {
    /// A concrete value.
    Value(Value),

    /// Explicitly defer to the parent layer.
    Inherit { ty: Option<TypeTag> },

    /// Take the value of another key, looked up through the same chain.
    Reference { key: PropertyKey, ty: Option<TypeTag> },
}

impl Binding {
    /// Type declared by this binding, if it declares one.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Self::Value(v) => Some(v.type_tag()),
            Self::Inherit { ty } | Self::Reference { ty, .. } => *ty,
        }
    }

    pub fn inherit() -> Self {
        Self::Inherit { ty: None }
    }

    pub fn reference(key: &str) -> Result<Self, ModelError> {
        Ok(Self::Reference {
            key: PropertyKey::parse(key)?,
            ty: None,
        })
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Binding {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<i64> for Binding {
    fn from(i: i64) -> Self {
        Self::Value(Value::Integer(i))
    }
}

impl From<i32> for Binding {
    fn from(i: i32) -> Self {
        Self::Value(Value::Integer(i64::from(i)))
    }
}

impl From<bool> for Binding {
    fn from(b: bool) -> Self {
        Self::Value(Value::Boolean(b))
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum BindingRepr {
    Value(Value),
    Marker(MarkerRepr),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkerRepr {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    reference: Option<PropertyKey>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    inherit: bool,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    ty: Option<TypeTag>,
}

impl TryFrom<BindingRepr> for Binding {
    type Error = ModelError;

    fn try_from(repr: BindingRepr) -> Result<Self, Self::Error> {
        match repr {
            BindingRepr::Value(v) => Ok(Self::Value(v)),
            BindingRepr::Marker(MarkerRepr {
                reference: Some(key),
                inherit: false,
                ty,
            }) => Ok(Self::Reference { key, ty }),
            BindingRepr::Marker(MarkerRepr {
                reference: None,
                inherit: true,
                ty,
            }) => Ok(Self::Inherit { ty }),
            BindingRepr::Marker(_) => Err(ModelError::InvalidBinding(
                "expected exactly one of 'ref' or 'inherit = true'".to_string(),
            )),
        }
    }
}

impl From<Binding> for BindingRepr {
    fn from(binding: Binding) -> Self {
        match binding {
            Binding::Value(v) => Self::Value(v),
            Binding::Inherit { ty } => Self::Marker(MarkerRepr {
                reference: None,
                inherit: true,
                ty,
            }),
            Binding::Reference { key, ty } => Self::Marker(MarkerRepr {
                reference: Some(key),
                inherit: false,
                ty,
            }),
        }
    }
}

/// One property binding inside a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: PropertyKey,
    pub binding: Binding,
}

impl Property {
    pub fn type_tag(&self) -> Option<TypeTag> {
        self.binding.type_tag()
    }
}

/// A named configuration layer.
///
/// Property keys are unique within a layer and keep their declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayerRepr", into = "LayerRepr")]
pub struct ConfigLayer {
    name: String,
    parent: Option<String>,
    properties: Vec<Property>,
}

impl ConfigLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Bind `key` in this layer.
    pub fn define(
        &mut self,
        key: &str,
        binding: impl Into<Binding>,
    ) -> Result<&mut Self, ModelError> {
        let key = PropertyKey::parse(key)?;
        self.insert(key, binding.into())?;
        Ok(self)
    }

    /// Builder form of [`ConfigLayer::define`].
    pub fn with(mut self, key: &str, binding: impl Into<Binding>) -> Result<Self, ModelError> {
        self.define(key, binding)?;
        Ok(self)
    }

    pub fn insert(&mut self, key: PropertyKey, binding: Binding) -> Result<(), ModelError> {
        if self.get(key.as_str()).is_some() {
            return Err(ModelError::DuplicateProperty {
                layer: self.name.clone(),
                key: key.to_string(),
            });
        }
        self.properties.push(Property { key, binding });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&Binding> {
        self.properties
            .iter()
            .find(|p| p.key.as_str() == key)
            .map(|p| &p.binding)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayerRepr {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default)]
    properties: OrderedProperties,
}

impl TryFrom<LayerRepr> for ConfigLayer {
    type Error = ModelError;

    fn try_from(repr: LayerRepr) -> Result<Self, Self::Error> {
        let mut layer = ConfigLayer::new(repr.name);
        layer.parent = repr.parent;
        for (key, binding) in repr.properties.0 {
            layer.insert(key, binding)?;
        }
        Ok(layer)
    }
}

impl From<ConfigLayer> for LayerRepr {
    fn from(layer: ConfigLayer) -> Self {
        Self {
            name: layer.name,
            parent: layer.parent,
            properties: OrderedProperties(
                layer
                    .properties
                    .into_iter()
                    .map(|p| (p.key, p.binding))
                    .collect(),
            ),
        }
    }
}

/// Property table that keeps document order and surfaces duplicates
/// instead of silently collapsing them.
#[derive(Clone, Default)]
struct OrderedProperties(Vec<(PropertyKey, Binding)>);

impl Serialize for OrderedProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, binding) in &self.0 {
            map.serialize_entry(key, binding)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrderedProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of property bindings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, binding)) = access.next_entry::<PropertyKey, Binding>()? {
                    entries.push((key, binding));
                }
                Ok(OrderedProperties(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
