//! Option layer merging
//!
//! - Objects: deep-merge by key
//! - Arrays: replace (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
///
/// Null in the overlay overrides whatever the base held.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

/// Rewrite camelCase object keys to snake_case, recursively.
///
/// Layers may spell a key either way; normalizing before the merge keeps
/// `strictDependencies` in one file from sitting beside
/// `strict_dependencies` in another.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (snake_case(&k), normalize_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let result = deep_merge(
            json!({"strict_dependencies": true}),
            json!({"strict_dependencies": false}),
        );
        assert_eq!(result["strict_dependencies"], false);
    }

    #[test]
    fn test_object_deep_merge() {
        let base = json!({"rules": {"sdk_ordering": true, "jvm_target": true}});
        let overlay = json!({"rules": {"jvm_target": false}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["rules"]["jvm_target"], false);
        assert_eq!(result["rules"]["sdk_ordering"], true);
    }

    #[test]
    fn test_array_replace() {
        let result = deep_merge(json!({"skip": ["a", "b", "c"]}), json!({"skip": ["x"]}));
        assert_eq!(result["skip"], json!(["x"]));
    }

    #[test]
    fn test_null_override() {
        let result = deep_merge(json!({"audit_signing": true}), json!({"audit_signing": null}));
        assert!(result["audit_signing"].is_null());
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({"strict_dependencies": true, "audit_signing": true});
        let host = json!({"audit_signing": false});
        let project = json!({"strict_dependencies": false});
        let cli = json!({"strict_dependencies": true});

        let result = merge_layers(vec![builtin, host, project, cli]);

        assert_eq!(result["strict_dependencies"], true);
        assert_eq!(result["audit_signing"], false);
    }

    #[test]
    fn test_normalize_keys() {
        let value = normalize_keys(json!({
            "requireAllVariantsResolve": false,
            "audit_signing": true,
            "nested": {"consistencyChecks": true}
        }));
        assert_eq!(
            value,
            json!({
                "require_all_variants_resolve": false,
                "audit_signing": true,
                "nested": {"consistency_checks": true}
            })
        );
    }
}
