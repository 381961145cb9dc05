//! Plugin registry
//!
//! Plugins apply in the order they are declared, so the registry is an
//! ordered list rather than a set.

use buildcfg_model::PluginDeclaration;
use tracing::debug;

use crate::error::ResolveError;

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// Same id and constraint already registered; nothing changed.
    AlreadyPresent,
}

#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginDeclaration>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, keeping first-declaration order.
    ///
    /// Re-registering the same id with the same constraint is a no-op;
    /// a different constraint is a conflict.
    pub fn register(
        &mut self,
        declaration: PluginDeclaration,
    ) -> Result<Registration, ResolveError> {
        if let Some(existing) = self.get(&declaration.id) {
            if existing.version != declaration.version {
                return Err(ResolveError::PluginConflict {
                    id: declaration.id,
                    existing: existing.version.clone(),
                    requested: declaration.version,
                });
            }
            debug!(plugin = %declaration, "Plugin already registered");
            return Ok(Registration::AlreadyPresent);
        }

        debug!(plugin = %declaration, position = self.plugins.len(), "Plugin registered");
        self.plugins.push(declaration);
        Ok(Registration::Added)
    }

    pub fn get(&self, id: &str) -> Option<&PluginDeclaration> {
        self.plugins.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn plugins(&self) -> &[PluginDeclaration] {
        &self.plugins
    }

    pub fn into_plugins(self) -> Vec<PluginDeclaration> {
        self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(registry: &PluginRegistry) -> Vec<&str> {
        registry.plugins().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_preserves_declaration_order() {
        let mut registry = PluginRegistry::new();
        for id in [
            "com.android.application",
            "kotlin-android",
            "dev.flutter.flutter-gradle-plugin",
        ] {
            registry.register(PluginDeclaration::new(id)).unwrap();
        }
        assert_eq!(
            ids(&registry),
            vec![
                "com.android.application",
                "kotlin-android",
                "dev.flutter.flutter-gradle-plugin"
            ]
        );
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let mut registry = PluginRegistry::new();
        let plugin = PluginDeclaration::new("kotlin-android").with_version("1.9.0");

        assert_eq!(registry.register(plugin.clone()).unwrap(), Registration::Added);
        assert_eq!(
            registry.register(plugin).unwrap(),
            Registration::AlreadyPresent
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_versions() {
        let mut registry = PluginRegistry::new();
        registry
            .register(PluginDeclaration::new("kotlin-android").with_version("1.9.0"))
            .unwrap();

        let err = registry
            .register(PluginDeclaration::new("kotlin-android").with_version("2.0.0"))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::PluginConflict {
                id: "kotlin-android".to_string(),
                existing: Some("1.9.0".to_string()),
                requested: Some("2.0.0".to_string()),
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_constrained_vs_unconstrained_conflicts() {
        let mut registry = PluginRegistry::new();
        registry
            .register(PluginDeclaration::new("com.android.application"))
            .unwrap();
        assert!(registry
            .register(PluginDeclaration::new("com.android.application").with_version("8.1.0"))
            .is_err());
    }

    #[test]
    fn test_duplicate_does_not_move_position() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginDeclaration::new("P1")).unwrap();
        registry.register(PluginDeclaration::new("P2")).unwrap();
        registry.register(PluginDeclaration::new("P1")).unwrap();
        assert_eq!(ids(&registry), vec!["P1", "P2"]);
        assert!(registry.contains("P2"));
    }
}
