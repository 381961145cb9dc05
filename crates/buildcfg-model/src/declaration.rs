//! Declaration tree
//!
//! The already-parsed input of one resolution run. The on-disk form is TOML
//! (or the equivalent JSON):
//!
//! ```toml
//! target = "app"
//!
//! [[layers]]
//! name = "flutter"
//! [layers.properties]
//! "flutter.compileSdkVersion" = 34
//!
//! [[layers]]
//! name = "app"
//! parent = "flutter"
//! [layers.properties]
//! "android.compileSdk" = { ref = "flutter.compileSdkVersion" }
//!
//! [[plugins]]
//! id = "com.android.application"
//!
//! [[dependencies]]
//! role = "coreLibraryDesugaring"
//! coordinate = "com.android.tools:desugar_jdk_libs:2.0.3"
//!
//! [[signing_configs]]
//! name = "debug"
//!
//! [[variants]]
//! name = "release"
//! [variants.overrides]
//! signingConfig = "debug"
//! ```

use serde::{Deserialize, Serialize};

use crate::coordinate::Dependency;
use crate::error::ModelError;
use crate::layer::ConfigLayer;
use crate::plugin::PluginDeclaration;
use crate::schema::PropertySpec;
use crate::signing::SigningConfig;
use crate::variant::BuildVariant;

/// Everything a module declares for one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclarationTree {
    /// Layer the configuration is resolved for (default: last layer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Configuration layers, least to most specific as written
    #[serde(default)]
    pub layers: Vec<ConfigLayer>,

    /// Plugins in application order
    #[serde(default)]
    pub plugins: Vec<PluginDeclaration>,

    /// Role-tagged dependencies (order irrelevant)
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub variants: Vec<BuildVariant>,

    #[serde(default)]
    pub signing_configs: Vec<SigningConfig>,

    /// Property schema; the resolver's built-in schema applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<PropertySpec>>,
}

impl DeclarationTree {
    pub fn from_toml_str(s: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Name of the layer resolution targets.
    pub fn target_layer(&self) -> Option<&str> {
        self.target
            .as_deref()
            .or_else(|| self.layers.last().map(|l| l.name()))
    }

    /// True when the tree declares nothing at all, target and schema included.
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
            && self.schema.is_none()
            && self.layers.is_empty()
            && self.plugins.is_empty()
            && self.dependencies.is_empty()
            && self.variants.is_empty()
            && self.signing_configs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const FAST_FLOW: &str = r#"
        target = "app"

        [[layers]]
        name = "flutter"
        [layers.properties]
        "flutter.compileSdkVersion" = 34
        "flutter.minSdkVersion" = 21

        [[layers]]
        name = "app"
        parent = "flutter"
        [layers.properties]
        "android.namespace" = "com.example.fast_flow"
        "android.compileSdk" = { ref = "flutter.compileSdkVersion" }

        [[plugins]]
        id = "com.android.application"

        [[plugins]]
        id = "kotlin-android"

        [[dependencies]]
        role = "coreLibraryDesugaring"
        coordinate = "com.android.tools:desugar_jdk_libs:2.0.3"

        [[signing_configs]]
        name = "debug"

        [[variants]]
        name = "release"
        [variants.overrides]
        signingConfig = "debug"
    "#;

    #[test]
    fn test_parse_toml_tree() {
        let tree = DeclarationTree::from_toml_str(FAST_FLOW).unwrap();
        assert_eq!(tree.target_layer(), Some("app"));
        assert_eq!(tree.layers.len(), 2);
        assert_eq!(tree.layers[1].parent(), Some("flutter"));
        assert_eq!(tree.plugins[1].id, "kotlin-android");
        assert_eq!(tree.dependencies[0].coordinate.version.as_deref(), Some("2.0.3"));
        assert_eq!(
            tree.variants[0].overrides["signingConfig"],
            Value::from("debug")
        );
        assert!(tree.schema.is_none());
    }

    #[test]
    fn test_json_matches_toml() {
        let from_toml = DeclarationTree::from_toml_str(FAST_FLOW).unwrap();
        let json = serde_json::to_string(&from_toml).unwrap();
        let from_json = DeclarationTree::from_json_str(&json).unwrap();
        assert_eq!(from_toml, from_json);
    }

    #[test]
    fn test_target_defaults_to_last_layer() {
        let tree = DeclarationTree::from_toml_str(
            r#"
            [[layers]]
            name = "base"
            [[layers]]
            name = "module"
            "#,
        )
        .unwrap();
        assert_eq!(tree.target_layer(), Some("module"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = DeclarationTree::from_toml_str("[tasks]\nassemble = true\n");
        assert!(matches!(result, Err(ModelError::Toml(_))));
    }

    #[test]
    fn test_empty_tree() {
        let tree = DeclarationTree::from_toml_str("").unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.target_layer(), None);
    }

    #[test]
    fn test_target_only_tree_not_empty() {
        let tree = DeclarationTree::from_toml_str("target = \"app\"\n").unwrap();
        assert!(!tree.is_empty());
        assert_eq!(tree.target_layer(), Some("app"));
    }
}
