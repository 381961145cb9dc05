//! Variant definitions and parent-chain resolution

use buildcfg_model::variant::{DEBUGGABLE, MINIFY_ENABLED, SHRINK_RESOURCES, SIGNING_CONFIG};
use buildcfg_model::{BuildVariant, TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{Origin, ResolveError};

/// Well-known settings and the type each must have.
const WELL_KNOWN_SETTINGS: &[(&str, TypeTag)] = &[
    (SIGNING_CONFIG, TypeTag::String),
    (DEBUGGABLE, TypeTag::Boolean),
    (MINIFY_ENABLED, TypeTag::Boolean),
    (SHRINK_RESOURCES, TypeTag::Boolean),
];

/// A setting value and the variant that supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSetting {
    pub value: Value,

    /// Variant the value was declared on
    pub from: String,

    /// True when declared on the resolved variant itself
    pub explicit: bool,
}

/// Effective settings of one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVariant {
    pub name: String,

    /// The variant followed by its ancestors
    pub chain: Vec<String>,

    pub settings: BTreeMap<String, ResolvedSetting>,
}

impl ResolvedVariant {
    pub fn get(&self, setting: &str) -> Option<&Value> {
        self.settings.get(setting).map(|s| &s.value)
    }

    pub fn setting(&self, setting: &str) -> Option<&ResolvedSetting> {
        self.settings.get(setting)
    }

    pub fn signing_config(&self) -> Option<&str> {
        self.get(SIGNING_CONFIG).and_then(Value::as_str)
    }

    pub fn is_debuggable(&self) -> bool {
        self.get(DEBUGGABLE).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn minify_enabled(&self) -> bool {
        self.get(MINIFY_ENABLED).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn shrink_resources(&self) -> bool {
        self.get(SHRINK_RESOURCES).and_then(Value::as_bool).unwrap_or(false)
    }

    fn check_well_known(&self) -> Result<(), ResolveError> {
        for (name, expected) in WELL_KNOWN_SETTINGS {
            if let Some(setting) = self.settings.get(*name) {
                let found = setting.value.type_tag();
                if found != *expected {
                    return Err(ResolveError::TypeMismatch {
                        key: name.to_string(),
                        origin: Origin::Variant(setting.from.clone()),
                        expected: *expected,
                        found,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Defined variants, each with a sound parent chain.
#[derive(Debug, Clone, Default)]
pub struct BuildVariantTable {
    variants: BTreeMap<String, BuildVariant>,
}

impl BuildVariantTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define one variant. Its parent must already be defined.
    pub fn define(&mut self, variant: BuildVariant) -> Result<(), ResolveError> {
        if self.variants.contains_key(&variant.name) {
            return Err(ResolveError::DuplicateVariant {
                variant: variant.name,
            });
        }
        if let Some(parent) = &variant.parent {
            if *parent == variant.name {
                return Err(ResolveError::VariantCycle {
                    cycle: vec![variant.name.clone(), variant.name.clone()],
                    variant: variant.name,
                });
            }
            if !self.variants.contains_key(parent) {
                return Err(ResolveError::UnknownVariantParent {
                    parent: parent.clone(),
                    variant: variant.name,
                });
            }
        }

        debug!(variant = %variant.name, parent = ?variant.parent, "Variant defined");
        self.variants.insert(variant.name.clone(), variant);
        Ok(())
    }

    /// Define a batch in dependency order.
    ///
    /// Declaration order inside the batch does not matter. Returns the
    /// variants that could not be defined, each with the reason; everything
    /// else is defined.
    pub fn define_all(&mut self, batch: Vec<BuildVariant>) -> Vec<(String, ResolveError)> {
        let mut rejected = Vec::new();
        let mut pending: BTreeMap<String, BuildVariant> = BTreeMap::new();
        let mut order = Vec::new();

        for variant in batch {
            if self.variants.contains_key(&variant.name) || pending.contains_key(&variant.name) {
                rejected.push((
                    variant.name.clone(),
                    ResolveError::DuplicateVariant {
                        variant: variant.name,
                    },
                ));
                continue;
            }
            order.push(variant.name.clone());
            pending.insert(variant.name.clone(), variant);
        }

        let mut remaining = Vec::new();
        for name in order {
            match self.check_chain(&name, &pending) {
                Ok(()) => remaining.push(name),
                Err(err) => rejected.push((name, err)),
            }
        }

        // Parents first. Every remaining chain ends in a defined variant or a
        // root, so each pass defines at least one.
        while !remaining.is_empty() {
            let before = remaining.len();
            let mut blocked = Vec::new();
            for name in remaining {
                let ready = pending
                    .get(&name)
                    .and_then(|v| v.parent.as_ref())
                    .map_or(true, |p| self.variants.contains_key(p));
                if !ready {
                    blocked.push(name);
                    continue;
                }
                if let Some(variant) = pending.remove(&name) {
                    if let Err(err) = self.define(variant) {
                        rejected.push((name, err));
                    }
                }
            }

            if blocked.len() == before {
                for name in blocked {
                    let parent = pending
                        .get(&name)
                        .and_then(|v| v.parent.clone())
                        .unwrap_or_default();
                    rejected.push((
                        name.clone(),
                        ResolveError::UnknownVariantParent {
                            variant: name,
                            parent,
                        },
                    ));
                }
                break;
            }
            remaining = blocked;
        }

        rejected
    }

    /// Walk the pending parent graph from `name`, reporting the first cycle
    /// or dangling parent on the way.
    fn check_chain(
        &self,
        name: &str,
        pending: &BTreeMap<String, BuildVariant>,
    ) -> Result<(), ResolveError> {
        let mut path: Vec<&str> = vec![name];
        let mut current = name;

        loop {
            let Some(parent) = pending.get(current).and_then(|v| v.parent.as_deref()) else {
                return Ok(());
            };
            if self.variants.contains_key(parent) {
                return Ok(());
            }
            if let Some(pos) = path.iter().position(|n| *n == parent) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
                cycle.push(parent.to_string());
                return Err(ResolveError::VariantCycle {
                    variant: name.to_string(),
                    cycle,
                });
            }
            if !pending.contains_key(parent) {
                return Err(ResolveError::UnknownVariantParent {
                    variant: current.to_string(),
                    parent: parent.to_string(),
                });
            }
            path.push(parent);
            current = parent;
        }
    }

    /// Effective settings of `name`, most specific variant winning.
    pub fn resolve(&self, name: &str) -> Result<ResolvedVariant, ResolveError> {
        if !self.variants.contains_key(name) {
            return Err(ResolveError::VariantNotFound {
                variant: name.to_string(),
            });
        }

        let mut chain: Vec<&BuildVariant> = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = Some(name);
        while let Some(variant_name) = current {
            if !seen.insert(variant_name) {
                let mut cycle: Vec<String> = chain.iter().map(|v| v.name.clone()).collect();
                cycle.push(variant_name.to_string());
                return Err(ResolveError::VariantCycle {
                    variant: name.to_string(),
                    cycle,
                });
            }
            let variant =
                self.variants
                    .get(variant_name)
                    .ok_or_else(|| ResolveError::UnknownVariantParent {
                        variant: chain
                            .last()
                            .map(|v| v.name.clone())
                            .unwrap_or_else(|| name.to_string()),
                        parent: variant_name.to_string(),
                    })?;
            chain.push(variant);
            current = variant.parent.as_deref();
        }

        let mut settings: BTreeMap<String, ResolvedSetting> = BTreeMap::new();
        for variant in &chain {
            for (setting, value) in &variant.overrides {
                match settings.get(setting) {
                    None => {
                        settings.insert(
                            setting.clone(),
                            ResolvedSetting {
                                value: value.clone(),
                                from: variant.name.clone(),
                                explicit: variant.name == name,
                            },
                        );
                    }
                    Some(existing) if existing.value.type_tag() != value.type_tag() => {
                        return Err(ResolveError::TypeMismatch {
                            key: setting.clone(),
                            origin: Origin::Variant(existing.from.clone()),
                            expected: value.type_tag(),
                            found: existing.value.type_tag(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        let resolved = ResolvedVariant {
            name: name.to_string(),
            chain: chain.iter().map(|v| v.name.clone()).collect(),
            settings,
        };
        resolved.check_well_known()?;
        Ok(resolved)
    }

    pub fn get(&self, name: &str) -> Option<&BuildVariant> {
        self.variants.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    /// Defined variant names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
