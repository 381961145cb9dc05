//! Validated layer graph

use buildcfg_model::ConfigLayer;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::ResolveError;

/// Layers indexed by name, checked for dangling parents and cycles.
#[derive(Debug, Clone, Default)]
pub struct LayerGraph {
    layers: BTreeMap<String, ConfigLayer>,
}

impl LayerGraph {
    /// Build a graph, rejecting duplicate names, unknown parents and
    /// parent cycles.
    pub fn build(layers: Vec<ConfigLayer>) -> Result<Self, ResolveError> {
        let mut indexed = BTreeMap::new();
        let mut order = Vec::with_capacity(layers.len());
        for layer in layers {
            let name = layer.name().to_string();
            if indexed.contains_key(&name) {
                return Err(ResolveError::DuplicateLayer { layer: name });
            }
            order.push(name.clone());
            indexed.insert(name, layer);
        }

        for name in &order {
            if let Some(parent) = indexed[name].parent() {
                if !indexed.contains_key(parent) {
                    return Err(ResolveError::UnknownLayerParent {
                        layer: name.clone(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        let graph = Self { layers: indexed };
        for name in &order {
            graph.chain_names(name)?;
        }
        debug!(layers = order.len(), "Layer graph validated");
        Ok(graph)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigLayer> {
        self.layers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The layer and its ancestors, most specific first.
    pub fn chain(&self, name: &str) -> Result<Vec<&ConfigLayer>, ResolveError> {
        self.chain_names(name)?
            .into_iter()
            .map(|n| {
                self.layers
                    .get(n)
                    .ok_or_else(|| ResolveError::LayerNotFound { layer: n.to_string() })
            })
            .collect()
    }

    fn chain_names<'a>(&'a self, name: &'a str) -> Result<Vec<&'a str>, ResolveError> {
        let mut chain: Vec<&str> = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = Some(name);

        while let Some(layer_name) = current {
            let layer = self
                .layers
                .get(layer_name)
                .ok_or_else(|| ResolveError::LayerNotFound {
                    layer: layer_name.to_string(),
                })?;

            if !seen.insert(layer_name) {
                let start = chain.iter().position(|n| *n == layer_name).unwrap_or(0);
                let mut cycle: Vec<String> = chain[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(layer_name.to_string());
                return Err(ResolveError::LayerCycle {
                    layer: name.to_string(),
                    cycle,
                });
            }

            chain.push(layer_name);
            current = layer.parent();
        }

        Ok(chain)
    }
}
