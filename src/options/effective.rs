//! Effective resolver options with provenance

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::defaults::ResolverOptions;
use super::merge::{merge_layers, normalize_keys};

/// Project options file, looked up next to the declarations.
pub const PROJECT_OPTIONS_FILE: &str = "buildcfg.toml";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OptionsOrigin {
    Builtin,
    Host,
    Project,
    Cli,
}

/// A contributing options source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionsSource {
    pub origin: OptionsOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Merged options plus the sources that contributed to them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectiveOptions {
    pub options: ResolverOptions,

    /// Contributing sources in precedence order
    pub sources: Vec<OptionsSource>,
}

/// Default host options path (~/.config/buildcfg/options.toml)
pub fn default_host_path() -> Result<PathBuf, OptionsError> {
    let home = std::env::var_os("HOME").ok_or(OptionsError::NoHome)?;
    Ok(PathBuf::from(home).join(".config/buildcfg/options.toml"))
}

impl EffectiveOptions {
    /// Merge the option layers. Missing files are skipped.
    pub fn build(
        host_path: Option<&Path>,
        project_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, OptionsError> {
        let mut layers = vec![ResolverOptions::default().to_value()];
        let mut sources = vec![OptionsSource {
            origin: OptionsOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (OptionsOrigin::Host, host_path),
            (OptionsOrigin::Project, project_path),
        ] {
            let Some(path) = path else { continue };
            if !path.exists() {
                debug!(path = %path.display(), ?origin, "options file absent");
                continue;
            }
            let (value, digest) = load_toml_file(path)?;
            layers.push(normalize_keys(value));
            sources.push(OptionsSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(normalize_keys(cli));
            sources.push(OptionsSource {
                origin: OptionsOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let options: ResolverOptions = serde_json::from_value(merged)?;

        debug!(?options, sources = sources.len(), "options merged");
        Ok(Self { options, sources })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Read a TOML options file as JSON, plus the SHA-256 of its bytes.
fn load_toml_file(path: &Path) -> Result<(Value, String), OptionsError> {
    let contents = fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = hex::encode(Sha256::digest(contents.as_bytes()));

    let value = toml::from_str(&contents).map_err(|source| OptionsError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((value, digest))
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("HOME is not set, pass --host-options explicitly")]
    NoHome,

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid options: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_build_with_defaults_only() {
        let effective = EffectiveOptions::build(None, None, None).unwrap();

        assert_eq!(effective.options, ResolverOptions::default());
        assert_eq!(effective.sources.len(), 1);
        assert_eq!(effective.sources[0].origin, OptionsOrigin::Builtin);
    }

    #[test]
    fn test_cli_override() {
        let cli = serde_json::json!({"strict_dependencies": false});
        let effective = EffectiveOptions::build(None, None, Some(cli)).unwrap();

        assert!(!effective.options.strict_dependencies);
        assert_eq!(effective.sources.last().unwrap().origin, OptionsOrigin::Cli);
    }

    #[test]
    fn test_project_overrides_host() {
        let mut host = NamedTempFile::new().unwrap();
        writeln!(host, "audit_signing = false").unwrap();
        writeln!(host, "strict_dependencies = false").unwrap();

        let mut project = NamedTempFile::new().unwrap();
        writeln!(project, "strictDependencies = true").unwrap();

        let effective =
            EffectiveOptions::build(Some(host.path()), Some(project.path()), None).unwrap();

        assert!(effective.options.strict_dependencies);
        assert!(!effective.options.audit_signing);
        assert_eq!(effective.sources.len(), 3);
        assert_eq!(effective.sources[1].origin, OptionsOrigin::Host);
        assert_eq!(effective.sources[2].origin, OptionsOrigin::Project);
        assert_eq!(effective.sources[2].digest.as_ref().unwrap().len(), 64);
    }

    #[test]
    fn test_missing_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("options.toml");

        let effective = EffectiveOptions::build(Some(&missing), None, None).unwrap();
        assert_eq!(effective.sources.len(), 1);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut project = NamedTempFile::new().unwrap();
        writeln!(project, "strict = false").unwrap();

        let err = EffectiveOptions::build(None, Some(project.path()), None).unwrap_err();
        assert!(matches!(err, OptionsError::Invalid(_)));
        assert!(err.to_string().contains("strict"));
    }

    #[test]
    fn test_unreadable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();

        let err = EffectiveOptions::build(None, Some(dir.path()), None).unwrap_err();
        assert!(matches!(err, OptionsError::Io { .. }));
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let cli = serde_json::json!({"audit_signing": "yes"});
        assert!(EffectiveOptions::build(None, None, Some(cli)).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let mut project = NamedTempFile::new().unwrap();
        writeln!(project, "strict_dependencies = ").unwrap();

        let err = EffectiveOptions::build(None, Some(project.path()), None).unwrap_err();
        match err {
            OptionsError::Toml { path, .. } => assert_eq!(path, project.path()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
