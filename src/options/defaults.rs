//! Built-in option values (layer 1)

use serde::{Deserialize, Serialize};

/// Switches that change how strictly a declaration tree is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverOptions {
    /// Treat a duplicate dependency as fatal (default: true)
    #[serde(default = "enabled", alias = "strictDependencies")]
    pub strict_dependencies: bool,

    /// Fail when any variant cannot be resolved (default: true).
    /// When false the variant is left out and a warning recorded.
    #[serde(default = "enabled", alias = "requireAllVariantsResolve")]
    pub require_all_variants_resolve: bool,

    /// Run the cross-property consistency rules (default: true)
    #[serde(default = "enabled", alias = "consistencyChecks")]
    pub consistency_checks: bool,

    /// Record release variants sharing a debug signing config (default: true)
    #[serde(default = "enabled", alias = "auditSigning")]
    pub audit_signing: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            strict_dependencies: true,
            require_all_variants_resolve: true,
            consistency_checks: true,
            audit_signing: true,
        }
    }
}

impl ResolverOptions {
    /// Lenient options: duplicates and broken variants become warnings.
    pub fn lenient() -> Self {
        Self {
            strict_dependencies: false,
            require_all_variants_resolve: false,
            ..Self::default()
        }
    }

    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "strict_dependencies": self.strict_dependencies,
            "require_all_variants_resolve": self.require_all_variants_resolve,
            "consistency_checks": self.consistency_checks,
            "audit_signing": self.audit_signing,
        })
    }
}
