//! Resolution orchestrator
//!
//! States: EMPTY → INGESTING → VALIDATING → {RESOLVED | FAILED}
//!
//! Declarations are collected while ingesting and only inspected once the
//! caller calls [`ConfigurationResolver::finish`]. Validation stops at the
//! first failure and produces no partial output.

mod effective;

pub use effective::{EffectiveConfiguration, Warning, SCHEMA_ID, SCHEMA_VERSION};

use buildcfg_model::{
    BuildVariant, ConfigLayer, DeclarationTree, Dependency, PluginDeclaration, PropertySpec,
    SigningConfig,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use self::effective::Parts;
use crate::dependency::DependencyLedger;
use crate::error::{Origin, ResolveError};
use crate::options::ResolverOptions;
use crate::plugin::PluginRegistry;
use crate::property::{LayerGraph, PropertyResolver, ResolvedProperty};
use crate::rules::{builtin_rules, RuleContext};
use crate::schema::Schema;
use crate::variant::{audit_signing, BuildVariantTable, ResolvedVariant};

/// Resolver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolverState {
    /// Nothing ingested yet
    Empty,
    /// Accepting declarations
    Ingesting,
    /// Checking the collected declarations
    Validating,
    /// Produced an effective configuration
    Resolved,
    /// Validation failed
    Failed,
}

impl ResolverState {
    pub fn can_transition_to(&self, target: ResolverState) -> bool {
        matches!(
            (self, target),
            (Self::Empty, Self::Ingesting)
                | (Self::Empty, Self::Failed)
                | (Self::Ingesting, Self::Validating)
                | (Self::Validating, Self::Resolved)
                | (Self::Validating, Self::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }
}

/// Collects the declarations of one module and resolves them once.
#[derive(Debug, Clone)]
pub struct ConfigurationResolver {
    options: ResolverOptions,
    state: ResolverState,
    pending: DeclarationTree,
    failure: Option<ResolveError>,
}

impl ConfigurationResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            state: ResolverState::Empty,
            pending: DeclarationTree::default(),
            failure: None,
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// The error that moved the resolver to FAILED.
    pub fn failure(&self) -> Option<&ResolveError> {
        self.failure.as_ref()
    }

    /// Ingest a whole declaration tree.
    ///
    /// An empty tree is accepted but does not leave EMPTY.
    pub fn ingest_tree(&mut self, tree: DeclarationTree) -> Result<(), ResolveError> {
        self.accept("ingest declarations")?;
        if tree.is_empty() {
            return Ok(());
        }

        let DeclarationTree {
            target,
            layers,
            plugins,
            dependencies,
            variants,
            signing_configs,
            schema,
        } = tree;
        if target.is_some() {
            self.pending.target = target;
        }
        if schema.is_some() {
            self.pending.schema = schema;
        }
        self.pending.layers.extend(layers);
        self.pending.plugins.extend(plugins);
        self.pending.dependencies.extend(dependencies);
        self.pending.variants.extend(variants);
        self.pending.signing_configs.extend(signing_configs);
        self.begin_ingesting();
        Ok(())
    }

    pub fn add_layer(&mut self, layer: ConfigLayer) -> Result<(), ResolveError> {
        self.accept("add layer")?;
        self.pending.layers.push(layer);
        self.begin_ingesting();
        Ok(())
    }

    pub fn add_plugin(&mut self, plugin: PluginDeclaration) -> Result<(), ResolveError> {
        self.accept("add plugin")?;
        self.pending.plugins.push(plugin);
        self.begin_ingesting();
        Ok(())
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> Result<(), ResolveError> {
        self.accept("add dependency")?;
        self.pending.dependencies.push(dependency);
        self.begin_ingesting();
        Ok(())
    }

    pub fn add_variant(&mut self, variant: BuildVariant) -> Result<(), ResolveError> {
        self.accept("add variant")?;
        self.pending.variants.push(variant);
        self.begin_ingesting();
        Ok(())
    }

    pub fn add_signing_config(&mut self, config: SigningConfig) -> Result<(), ResolveError> {
        self.accept("add signing config")?;
        self.pending.signing_configs.push(config);
        self.begin_ingesting();
        Ok(())
    }

    /// Resolve for `layer` instead of the last declared layer.
    pub fn set_target(&mut self, layer: impl Into<String>) -> Result<(), ResolveError> {
        self.accept("set target")?;
        self.pending.target = Some(layer.into());
        self.begin_ingesting();
        Ok(())
    }

    /// Replace the built-in property schema.
    pub fn set_schema(&mut self, schema: Vec<PropertySpec>) -> Result<(), ResolveError> {
        self.accept("set schema")?;
        self.pending.schema = Some(schema);
        self.begin_ingesting();
        Ok(())
    }

    /// Signal that ingestion is complete and resolve.
    pub fn finish(&mut self) -> Result<EffectiveConfiguration, ResolveError> {
        match self.state {
            ResolverState::Ingesting => {}
            ResolverState::Empty => {
                let err = ResolveError::EmptyDeclarations;
                self.fail(err.clone());
                return Err(err);
            }
            state => {
                return Err(ResolveError::InvalidState {
                    state,
                    operation: "finish",
                })
            }
        }

        self.transition(ResolverState::Validating);
        match validate(&self.pending, &self.options) {
            Ok(effective) => {
                self.transition(ResolverState::Resolved);
                info!(
                    target_layer = %effective.target_layer(),
                    properties = effective.properties().len(),
                    variants = effective.variants().len(),
                    warnings = effective.warnings().len(),
                    "Resolution complete"
                );
                Ok(effective)
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    fn accept(&self, operation: &'static str) -> Result<(), ResolveError> {
        match self.state {
            ResolverState::Empty | ResolverState::Ingesting => Ok(()),
            state => Err(ResolveError::InvalidState { state, operation }),
        }
    }

    fn begin_ingesting(&mut self) {
        if self.state == ResolverState::Empty {
            self.transition(ResolverState::Ingesting);
        }
    }

    fn fail(&mut self, err: ResolveError) {
        warn!(kind = %err.kind(), error = %err, "Resolution failed");
        self.transition(ResolverState::Failed);
        self.failure = Some(err);
    }

    fn transition(&mut self, target: ResolverState) {
        debug_assert!(
            self.state.can_transition_to(target),
            "invalid transition {:?} -> {:?}",
            self.state,
            target
        );
        debug!(from = ?self.state, to = ?target, "Resolver state");
        self.state = target;
    }
}

/// Resolve a complete declaration tree in one call.
pub fn resolve(
    tree: DeclarationTree,
    options: &ResolverOptions,
) -> Result<EffectiveConfiguration, ResolveError> {
    let mut resolver = ConfigurationResolver::new(*options);
    resolver.ingest_tree(tree)?;
    resolver.finish()
}

/// Dependencies in canonical order: role, group, artifact, version.
fn canonical_dependencies(dependencies: &[Dependency]) -> Vec<Dependency> {
    let mut sorted = dependencies.to_vec();
    sorted.sort();
    sorted
}

/// SHA-256 over the JCS form of the declarations, dependencies sorted.
fn declaration_digest(tree: &DeclarationTree) -> Result<String, ResolveError> {
    let mut canonical = tree.clone();
    canonical.dependencies = canonical_dependencies(&tree.dependencies);

    let jcs_bytes =
        serde_json_canonicalizer::to_vec(&canonical).map_err(|e| ResolveError::InvalidValue {
            key: "declarations".to_string(),
            origin: Origin::Builtin,
            reason: format!("JCS canonicalization error: {}", e),
        })?;

    let mut hasher = Sha256::new();
    hasher.update(&jcs_bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn validate(
    tree: &DeclarationTree,
    options: &ResolverOptions,
) -> Result<EffectiveConfiguration, ResolveError> {
    let declaration_digest = declaration_digest(tree)?;
    let mut warnings = Vec::new();

    // Layers
    let graph = LayerGraph::build(tree.layers.clone())?;
    let target = tree.target_layer().ok_or(ResolveError::NoTargetLayer)?;
    if !graph.contains(target) {
        return Err(ResolveError::LayerNotFound {
            layer: target.to_string(),
        });
    }

    // Plugins
    let mut registry = PluginRegistry::new();
    for plugin in &tree.plugins {
        registry.register(plugin.clone())?;
    }

    // Dependencies
    let mut ledger = DependencyLedger::new();
    for dependency in canonical_dependencies(&tree.dependencies) {
        match ledger.add_dependency(dependency) {
            Ok(()) => {}
            Err(ResolveError::DependencyDuplicate {
                role,
                existing,
                duplicate,
            }) if !options.strict_dependencies => {
                warn!(
                    %role,
                    kept = %existing,
                    ignored = %duplicate,
                    "Duplicate dependency ignored"
                );
                warnings.push(Warning::DuplicateDependency {
                    role,
                    kept: existing,
                    ignored: duplicate,
                });
            }
            Err(err) => return Err(err),
        }
    }

    // Signing configs
    let mut signing_configs = BTreeMap::new();
    let mut redactions = Vec::new();
    for config in &tree.signing_configs {
        if signing_configs.contains_key(&config.name) {
            return Err(ResolveError::DuplicateSigningConfig {
                name: config.name.clone(),
            });
        }
        let (redacted, paths) = config.redacted();
        redactions.extend(paths);
        signing_configs.insert(config.name.clone(), redacted);
    }

    // Properties
    let schema = match &tree.schema {
        Some(specs) => Schema::new(specs.clone())?,
        None => Schema::application_module()?,
    };
    let properties = resolve_properties(&graph, target, &schema)?;

    // Consistency rules
    if options.consistency_checks {
        let ctx = RuleContext {
            properties: &properties,
            dependencies: &ledger,
        };
        for rule in builtin_rules() {
            rule.check(&ctx)?;
            debug!(rule = rule.name(), "Consistency rule passed");
        }
    }

    // Variants
    let variants = resolve_variants(tree, &signing_configs, options, &mut warnings)?;

    if options.audit_signing {
        for finding in audit_signing(&variants) {
            warn!(
                variant = %finding.variant,
                signing_config = %finding.signing_config,
                "Non-debuggable variant shares a debug signing config"
            );
            warnings.push(Warning::SigningReuse(finding));
        }
    }

    Ok(EffectiveConfiguration::from_parts(Parts {
        declaration_digest,
        target_layer: target.to_string(),
        properties,
        plugins: registry.into_plugins(),
        dependencies: ledger.into_entries(),
        variants,
        signing_configs,
        warnings,
        redactions,
        options: *options,
    }))
}

/// Resolve every key visible from `target` plus every schema key.
///
/// A schema key nothing binds falls back to its default; without a default
/// it is an error when required and left out otherwise. A key outside the
/// schema that only inherits is an error.
fn resolve_properties(
    graph: &LayerGraph,
    target: &str,
    schema: &Schema,
) -> Result<BTreeMap<String, ResolvedProperty>, ResolveError> {
    let resolver = PropertyResolver::new(graph);
    let mut keys = resolver.visible_keys(target)?;
    keys.extend(schema.keys().cloned());

    let mut properties = BTreeMap::new();
    for key in keys {
        let resolved = match resolver.resolve(target, key.as_str()) {
            Ok(resolved) => resolved,
            Err(ResolveError::NotFound { key: missing, layer }) if missing == key.as_str() => {
                match schema.get(key.as_str()) {
                    Some(PropertySpec {
                        default: Some(default),
                        ..
                    }) => ResolvedProperty::builtin(default.clone()),
                    Some(spec) if !spec.required => continue,
                    _ => {
                        return Err(ResolveError::NotFound {
                            key: missing,
                            layer,
                        })
                    }
                }
            }
            Err(err) => return Err(err),
        };
        schema.check(key.as_str(), &resolved)?;
        properties.insert(key.to_string(), resolved);
    }
    Ok(properties)
}

fn resolve_variants(
    tree: &DeclarationTree,
    signing_configs: &BTreeMap<String, SigningConfig>,
    options: &ResolverOptions,
    warnings: &mut Vec<Warning>,
) -> Result<BTreeMap<String, ResolvedVariant>, ResolveError> {
    let mut omit = |variant: String, err: ResolveError| -> Result<(), ResolveError> {
        if options.require_all_variants_resolve {
            return Err(err);
        }
        warn!(%variant, error = %err, "Variant omitted");
        warnings.push(Warning::VariantOmitted {
            variant,
            kind: err.kind(),
            reason: err.to_string(),
        });
        Ok(())
    };

    let mut batch = tree.variants.clone();
    batch.sort_by(|a, b| a.name.cmp(&b.name));

    let mut table = BuildVariantTable::new();
    for (variant, err) in table.define_all(batch) {
        omit(variant, err)?;
    }

    let mut variants = BTreeMap::new();
    for name in table.names() {
        let outcome = table.resolve(name).and_then(|resolved| {
            match resolved.signing_config() {
                Some(config) if !signing_configs.contains_key(config) => {
                    Err(ResolveError::UnknownSigningConfig {
                        variant: name.to_string(),
                        signing_config: config.to_string(),
                    })
                }
                _ => Ok(resolved),
            }
        });
        match outcome {
            Ok(resolved) => {
                debug!(variant = %name, chain = ?resolved.chain, "Variant resolved");
                variants.insert(name.to_string(), resolved);
            }
            Err(err) => omit(name.to_string(), err)?,
        }
    }
    Ok(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use buildcfg_model::{Binding, Value};

    fn layer(name: &str, parent: Option<&str>, props: &[(&str, Binding)]) -> ConfigLayer {
        let mut layer = ConfigLayer::new(name);
        if let Some(parent) = parent {
            layer = layer.with_parent(parent);
        }
        for (key, binding) in props {
            layer.define(key, binding.clone()).unwrap();
        }
        layer
    }

    fn sdk_schema() -> Vec<PropertySpec> {
        vec![PropertySpec::required(
            "sdk.target".parse().unwrap(),
            buildcfg_model::TypeTag::Integer,
        )]
    }

    #[test]
    fn test_state_transitions() {
        assert!(ResolverState::Empty.can_transition_to(ResolverState::Ingesting));
        assert!(ResolverState::Ingesting.can_transition_to(ResolverState::Validating));
        assert!(ResolverState::Validating.can_transition_to(ResolverState::Resolved));
        assert!(ResolverState::Validating.can_transition_to(ResolverState::Failed));
        assert!(!ResolverState::Ingesting.can_transition_to(ResolverState::Resolved));
        assert!(!ResolverState::Resolved.can_transition_to(ResolverState::Ingesting));
        assert!(ResolverState::Failed.is_terminal());
        assert!(!ResolverState::Validating.is_terminal());
    }

    #[test]
    fn test_lifecycle_to_resolved() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        assert_eq!(resolver.state(), ResolverState::Empty);

        resolver.set_schema(sdk_schema()).unwrap();
        assert_eq!(resolver.state(), ResolverState::Ingesting);
        resolver
            .add_layer(layer("parent", None, &[("sdk.target", 30.into())]))
            .unwrap();
        resolver
            .add_layer(layer("child", Some("parent"), &[("sdk.target", 33.into())]))
            .unwrap();

        let effective = resolver.finish().unwrap();
        assert_eq!(resolver.state(), ResolverState::Resolved);
        assert_eq!(effective.get_i64("sdk.target"), Some(33));
        assert_eq!(effective.target_layer(), "child");
        assert_eq!(
            effective.property("sdk.target").unwrap().origin,
            Origin::Layer("child".to_string())
        );
    }

    #[test]
    fn test_ingest_after_finish_rejected() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.set_schema(sdk_schema()).unwrap();
        resolver
            .add_layer(layer("app", None, &[("sdk.target", 33.into())]))
            .unwrap();
        resolver.finish().unwrap();

        let err = resolver
            .add_plugin(PluginDeclaration::new("com.android.application"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::InvalidState {
                state: ResolverState::Resolved,
                operation: "add plugin",
            }
        );
        assert_eq!(resolver.finish().unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn test_finish_empty() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.ingest_tree(DeclarationTree::default()).unwrap();
        assert_eq!(resolver.state(), ResolverState::Empty);

        let err = resolver.finish().unwrap_err();
        assert_eq!(err, ResolveError::EmptyDeclarations);
        assert_eq!(resolver.state(), ResolverState::Failed);
        assert_eq!(resolver.failure(), Some(&ResolveError::EmptyDeclarations));
    }

    #[test]
    fn test_ingest_target_only_tree() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.set_schema(sdk_schema()).unwrap();
        resolver
            .add_layer(layer("parent", None, &[("sdk.target", 30.into())]))
            .unwrap();
        resolver
            .add_layer(layer("child", Some("parent"), &[("sdk.target", 33.into())]))
            .unwrap();
        resolver
            .ingest_tree(DeclarationTree {
                target: Some("parent".to_string()),
                ..DeclarationTree::default()
            })
            .unwrap();

        let effective = resolver.finish().unwrap();
        assert_eq!(effective.target_layer(), "parent");
        assert_eq!(effective.get_i64("sdk.target"), Some(30));
    }

    #[test]
    fn test_ingest_schema_only_tree() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver
            .ingest_tree(DeclarationTree {
                schema: Some(sdk_schema()),
                ..DeclarationTree::default()
            })
            .unwrap();
        assert_eq!(resolver.state(), ResolverState::Ingesting);

        resolver
            .add_layer(layer("app", None, &[("other.key", "x".into())]))
            .unwrap();
        assert_eq!(resolver.finish().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_failure_recorded() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.set_schema(sdk_schema()).unwrap();
        resolver
            .add_layer(layer("app", None, &[("other.key", "x".into())]))
            .unwrap();

        let err = resolver.finish().unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFound {
                key: "sdk.target".to_string(),
                layer: "app".to_string(),
            }
        );
        assert_eq!(resolver.state(), ResolverState::Failed);
        assert_eq!(resolver.failure(), Some(&err));
    }

    #[test]
    fn test_default_fills_missing_property() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver
            .set_schema(vec![PropertySpec::optional(
                "sdk.min".parse().unwrap(),
                buildcfg_model::TypeTag::Integer,
            )
            .with_default(21)])
            .unwrap();
        resolver.add_layer(ConfigLayer::new("app")).unwrap();

        let effective = resolver.finish().unwrap();
        let min = effective.property("sdk.min").unwrap();
        assert_eq!(min.value, Value::Integer(21));
        assert_eq!(min.origin, Origin::Builtin);
    }

    #[test]
    fn test_optional_without_default_left_out() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver
            .set_schema(vec![PropertySpec::optional(
                "ndk.version".parse().unwrap(),
                buildcfg_model::TypeTag::String,
            )])
            .unwrap();
        resolver.add_layer(ConfigLayer::new("app")).unwrap();

        let effective = resolver.finish().unwrap();
        assert!(effective.get("ndk.version").is_none());
    }

    #[test]
    fn test_missing_reference_is_not_defaulted() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver
            .set_schema(vec![PropertySpec::optional(
                "sdk.min".parse().unwrap(),
                buildcfg_model::TypeTag::Integer,
            )
            .with_default(21)])
            .unwrap();
        resolver
            .add_layer(layer(
                "app",
                None,
                &[("sdk.min", Binding::reference("flutter.minSdkVersion").unwrap())],
            ))
            .unwrap();

        let err = resolver.finish().unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound { ref key, .. } if key == "flutter.minSdkVersion"
        ));
    }

    #[test]
    fn test_unknown_target_layer() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.add_layer(ConfigLayer::new("app")).unwrap();
        resolver.set_target("lib").unwrap();

        assert_eq!(
            resolver.finish().unwrap_err(),
            ResolveError::LayerNotFound {
                layer: "lib".to_string()
            }
        );
    }

    #[test]
    fn test_no_layers() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver
            .add_plugin(PluginDeclaration::new("com.android.application"))
            .unwrap();
        assert_eq!(resolver.finish().unwrap_err(), ResolveError::NoTargetLayer);
    }

    #[test]
    fn test_unknown_signing_config() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.set_schema(Vec::new()).unwrap();
        resolver.add_layer(ConfigLayer::new("app")).unwrap();
        resolver
            .add_variant(BuildVariant::new("release").with_override("signingConfig", "upload"))
            .unwrap();

        let err = resolver.finish().unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnknownSigningConfig {
                variant: "release".to_string(),
                signing_config: "upload".to_string(),
            }
        );
    }

    #[test]
    fn test_lenient_omits_broken_variant() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::lenient());
        resolver.set_schema(Vec::new()).unwrap();
        resolver.add_layer(ConfigLayer::new("app")).unwrap();
        resolver.add_variant(BuildVariant::new("debug")).unwrap();
        resolver
            .add_variant(BuildVariant::new("staging").with_parent("qa"))
            .unwrap();

        let effective = resolver.finish().unwrap();
        assert!(effective.variant("debug").is_some());
        assert!(effective.variant("staging").is_none());
        assert!(matches!(
            &effective.warnings()[0],
            Warning::VariantOmitted { variant, kind: ErrorKind::UnknownVariantParent, .. }
                if variant == "staging"
        ));
    }

    #[test]
    fn test_duplicate_signing_config() {
        let mut resolver = ConfigurationResolver::new(ResolverOptions::default());
        resolver.add_layer(ConfigLayer::new("app")).unwrap();
        resolver.add_signing_config(SigningConfig::new("debug")).unwrap();
        resolver.add_signing_config(SigningConfig::new("debug")).unwrap();

        assert_eq!(
            resolver.finish().unwrap_err().kind(),
            ErrorKind::DuplicateSigningConfig
        );
    }

    #[test]
    fn test_digest_ignores_dependency_order() {
        let a = Dependency::new("implementation", "com.example:a:1.0").unwrap();
        let b = Dependency::new("implementation", "com.example:b:1.0").unwrap();
        let tree = |deps: Vec<Dependency>| DeclarationTree {
            layers: vec![ConfigLayer::new("app")],
            dependencies: deps,
            ..DeclarationTree::default()
        };

        assert_eq!(
            declaration_digest(&tree(vec![a.clone(), b.clone()])).unwrap(),
            declaration_digest(&tree(vec![b, a])).unwrap()
        );
    }
}
