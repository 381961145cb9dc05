//! Signing reuse audit
//!
//! Packaging a non-debuggable variant with the signing config of a
//! debuggable one (typically release signed with the debug key) is legal,
//! but it is recorded so it can be reviewed. A build host always supplies
//! a debuggable `debug` variant signed with the `debug` config, so when the
//! declarations leave it out it still counts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::table::ResolvedVariant;
use buildcfg_model::variant::SIGNING_CONFIG;

/// Debuggable variant the build host provides when none is declared
pub const HOST_DEBUG_VARIANT: &str = "debug";

/// Signing config of the host-provided debug variant
pub const HOST_DEBUG_SIGNING_CONFIG: &str = "debug";

/// A non-debuggable variant sharing a debuggable variant's signing config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningReuse {
    pub variant: String,
    pub signing_config: String,

    /// Debuggable variants using the same signing config
    pub shared_with: Vec<String>,

    /// Whether the variant sets the signing config itself or inherits it
    pub explicit: bool,
}

pub fn audit_signing(variants: &BTreeMap<String, ResolvedVariant>) -> Vec<SigningReuse> {
    let mut debuggable_by_config: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    if !variants.contains_key(HOST_DEBUG_VARIANT) {
        debuggable_by_config
            .insert(HOST_DEBUG_SIGNING_CONFIG, vec![HOST_DEBUG_VARIANT.to_string()]);
    }
    for variant in variants.values().filter(|v| v.is_debuggable()) {
        if let Some(config) = variant.signing_config() {
            debuggable_by_config
                .entry(config)
                .or_default()
                .push(variant.name.clone());
        }
    }

    variants
        .values()
        .filter(|v| !v.is_debuggable())
        .filter_map(|variant| {
            let config = variant.signing_config()?;
            let shared_with = debuggable_by_config.get(config)?;
            Some(SigningReuse {
                variant: variant.name.clone(),
                signing_config: config.to_string(),
                shared_with: shared_with.clone(),
                explicit: variant
                    .setting(SIGNING_CONFIG)
                    .map(|s| s.explicit)
                    .unwrap_or(false),
            })
        })
        .collect()
}
