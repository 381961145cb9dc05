//! Signing config references
//!
//! The resolver only tracks which signing config a variant names. Key
//! material stays with the build host.

use serde::{Deserialize, Serialize};

const REDACTED: &str = "[REDACTED]";

/// A named signing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_password: Option<String>,
}

impl SigningConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy with passwords replaced by a marker, plus the redacted paths.
    pub fn redacted(&self) -> (SigningConfig, Vec<String>) {
        let mut copy = self.clone();
        let mut paths = Vec::new();
        for (field, slot) in [
            ("store_password", &mut copy.store_password),
            ("key_password", &mut copy.key_password),
        ] {
            if slot.is_some() {
                *slot = Some(REDACTED.to_string());
                paths.push(format!("signing_configs.{}.{}", self.name, field));
            }
        }
        (copy, paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_passwords_only() {
        let config = SigningConfig {
            name: "upload".to_string(),
            store_file: Some("upload.jks".to_string()),
            key_alias: Some("upload".to_string()),
            store_password: Some("hunter2".to_string()),
            key_password: None,
        };

        let (redacted, paths) = config.redacted();
        assert_eq!(redacted.store_password.as_deref(), Some("[REDACTED]"));
        assert_eq!(redacted.key_password, None);
        assert_eq!(redacted.store_file.as_deref(), Some("upload.jks"));
        assert_eq!(paths, vec!["signing_configs.upload.store_password"]);
    }
}
