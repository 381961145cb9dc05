//! Single-property lookup over a layer chain

use buildcfg_model::{Binding, PropertyKey, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::graph::LayerGraph;
use crate::error::{Origin, ResolveError};

/// A property value together with the layer that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedProperty {
    pub value: Value,

    /// Layer (or built-in default) supplying the value
    pub origin: Origin,

    /// Key the value was taken from when bound by reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<PropertyKey>,
}

impl ResolvedProperty {
    pub fn builtin(value: Value) -> Self {
        Self {
            value,
            origin: Origin::Builtin,
            via: None,
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        self.value.type_tag()
    }
}

/// Pure lookups over a validated [`LayerGraph`].
pub struct PropertyResolver<'g> {
    graph: &'g LayerGraph,
}

impl<'g> PropertyResolver<'g> {
    pub fn new(graph: &'g LayerGraph) -> Self {
        Self { graph }
    }

    /// Resolve `key` as seen from `layer`.
    pub fn resolve(&self, layer: &str, key: &str) -> Result<ResolvedProperty, ResolveError> {
        let mut stack = Vec::new();
        self.resolve_with_stack(layer, key, &mut stack)
    }

    /// Every key bound anywhere in the chain of `layer`.
    pub fn visible_keys(&self, layer: &str) -> Result<BTreeSet<PropertyKey>, ResolveError> {
        let mut keys = BTreeSet::new();
        for l in self.graph.chain(layer)? {
            keys.extend(l.properties().iter().map(|p| p.key.clone()));
        }
        Ok(keys)
    }

    fn resolve_with_stack(
        &self,
        start: &str,
        key: &str,
        stack: &mut Vec<String>,
    ) -> Result<ResolvedProperty, ResolveError> {
        if stack.iter().any(|k| k == key) {
            let mut chain = stack.clone();
            chain.push(key.to_string());
            return Err(ResolveError::ReferenceCycle {
                key: stack.first().cloned().unwrap_or_else(|| key.to_string()),
                layer: start.to_string(),
                chain,
            });
        }
        stack.push(key.to_string());
        let result = self.walk(start, key, stack);
        stack.pop();
        result
    }

    fn walk(
        &self,
        start: &str,
        key: &str,
        stack: &mut Vec<String>,
    ) -> Result<ResolvedProperty, ResolveError> {
        let mut winner: Option<ResolvedProperty> = None;
        // Type promised by an `inherit` marker shallower than the winner.
        let mut promised: Option<(TypeTag, String)> = None;

        for layer in self.graph.chain(start)? {
            let Some(binding) = layer.get(key) else {
                continue;
            };

            if let Some(found) = &winner {
                if let Some(declared) = binding.type_tag() {
                    if declared != found.type_tag() {
                        return Err(ResolveError::TypeMismatch {
                            key: key.to_string(),
                            origin: found.origin.clone(),
                            expected: declared,
                            found: found.type_tag(),
                        });
                    }
                }
                continue;
            }

            let candidate = match binding {
                Binding::Value(value) => ResolvedProperty {
                    value: value.clone(),
                    origin: Origin::Layer(layer.name().to_string()),
                    via: None,
                },
                Binding::Inherit { ty } => {
                    if promised.is_none() {
                        promised = ty.map(|ty| (ty, layer.name().to_string()));
                    }
                    continue;
                }
                Binding::Reference { key: target, ty } => {
                    let resolved = self.resolve_with_stack(start, target.as_str(), stack)?;
                    if let Some(ty) = ty {
                        if *ty != resolved.type_tag() {
                            return Err(ResolveError::TypeMismatch {
                                key: key.to_string(),
                                origin: Origin::Layer(layer.name().to_string()),
                                expected: *ty,
                                found: resolved.type_tag(),
                            });
                        }
                    }
                    ResolvedProperty {
                        value: resolved.value,
                        origin: Origin::Layer(layer.name().to_string()),
                        via: Some(target.clone()),
                    }
                }
            };

            if let Some((ty, _)) = &promised {
                if *ty != candidate.type_tag() {
                    return Err(ResolveError::TypeMismatch {
                        key: key.to_string(),
                        origin: candidate.origin.clone(),
                        expected: *ty,
                        found: candidate.type_tag(),
                    });
                }
            }

            debug!(key, layer = layer.name(), "Property bound");
            winner = Some(candidate);
        }

        winner.ok_or_else(|| ResolveError::NotFound {
            key: key.to_string(),
            layer: start.to_string(),
        })
    }
}
