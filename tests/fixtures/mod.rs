//! Declaration fixtures shared by the integration tests

#![allow(dead_code)]

use buildcfg::model::DeclarationTree;
use std::path::{Path, PathBuf};

/// Path to the Flutter application module fixture
pub fn fast_flow_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fast_flow.toml")
}

/// The Flutter application module, parsed
pub fn fast_flow() -> DeclarationTree {
    let contents = std::fs::read_to_string(fast_flow_path()).unwrap();
    DeclarationTree::from_toml_str(&contents).unwrap()
}

/// Parent/child layers binding `sdk.target`, with a one-key schema.
pub fn shadowing(parent: i64, child: i64) -> DeclarationTree {
    DeclarationTree::from_toml_str(&format!(
        r#"
        [[layers]]
        name = "parent"
        [layers.properties]
        "sdk.target" = {parent}

        [[layers]]
        name = "child"
        parent = "parent"
        [layers.properties]
        "sdk.target" = {child}

        [[schema]]
        key = "sdk.target"
        type = "integer"
        required = true
        "#
    ))
    .unwrap()
}
