//! Declaration file loading
//!
//! The resolver core never touches the filesystem. This module turns a
//! `.toml` or `.json` declaration file into a [`DeclarationTree`].

use buildcfg_model::{DeclarationTree, ModelError};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed declaration file.
#[derive(Debug, Clone)]
pub struct LoadedDeclarations {
    pub tree: DeclarationTree,
    pub path: PathBuf,

    /// SHA-256 of the raw file bytes
    pub digest: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported declaration format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("invalid declarations: {0}")]
    Model(#[from] ModelError),
}

pub fn load_declarations(path: &Path) -> Result<LoadedDeclarations, InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if extension != "toml" && extension != "json" {
        return Err(InputError::UnsupportedFormat(path.display().to_string()));
    }

    let contents = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let digest = hex::encode(Sha256::digest(contents.as_bytes()));

    let tree = if extension == "toml" {
        DeclarationTree::from_toml_str(&contents)?
    } else {
        DeclarationTree::from_json_str(&contents)?
    };

    debug!(
        path = %path.display(),
        layers = tree.layers.len(),
        variants = tree.variants.len(),
        "loaded declarations"
    );
    Ok(LoadedDeclarations {
        tree,
        path: path.to_path_buf(),
        digest,
    })
}
