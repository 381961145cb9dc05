//! Ordering properties
//!
//! Plugin order is significant and must survive resolution exactly.
//! Dependency order is not and must never change the output.

mod fixtures;

use buildcfg::model::{Dependency, PluginDeclaration};
use buildcfg::{resolve, ResolverOptions};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Distinct plugin ids, in a random order.
fn plugin_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,8}(\\.[a-z]{1,8}){0,2}", 1..8)
        .prop_map(|ids| ids.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Distinct (role, library) dependencies.
fn dependencies() -> impl Strategy<Value = Vec<Dependency>> {
    prop::collection::btree_set(
        (
            prop::sample::select(vec!["implementation", "testImplementation", "tooling"]),
            "[a-z]{1,6}",
            "[a-z]{1,6}",
            1u8..10,
        ),
        0..10,
    )
    .prop_map(|entries| {
        let mut seen = BTreeSet::new();
        entries
            .into_iter()
            .filter(|(role, group, artifact, _)| {
                seen.insert((*role, group.clone(), artifact.clone()))
            })
            .map(|(role, group, artifact, major)| {
                Dependency::new(role, &format!("{}:{}:{}.0", group, artifact, major)).unwrap()
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn plugin_order_preserved(ids in plugin_ids()) {
        let mut tree = fixtures::shadowing(30, 33);
        tree.plugins = ids.iter().map(PluginDeclaration::new).collect();

        let effective = resolve(tree, &ResolverOptions::default()).unwrap();
        let resolved: Vec<&str> = effective.plugins().iter().map(|p| p.id.as_str()).collect();
        prop_assert_eq!(resolved, ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn repeated_plugin_is_idempotent(ids in plugin_ids()) {
        let mut tree = fixtures::shadowing(30, 33);
        tree.plugins = ids
            .iter()
            .chain(ids.iter())
            .map(PluginDeclaration::new)
            .collect();

        let effective = resolve(tree, &ResolverOptions::default()).unwrap();
        prop_assert_eq!(effective.plugins().len(), ids.len());
    }

    #[test]
    fn dependency_order_irrelevant(
        deps in dependencies().prop_flat_map(|deps| {
            let shuffled = Just(deps.clone()).prop_shuffle();
            (Just(deps), shuffled)
        })
    ) {
        let (original, shuffled) = deps;

        let mut a = fixtures::shadowing(30, 33);
        a.dependencies = original;
        let mut b = fixtures::shadowing(30, 33);
        b.dependencies = shuffled;

        let a = resolve(a, &ResolverOptions::default()).unwrap();
        let b = resolve(b, &ResolverOptions::default()).unwrap();
        prop_assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn duplicate_warning_independent_of_order(swap in any::<bool>()) {
        let first = Dependency::new("tooling", "com.example:libX:1.0").unwrap();
        let second = Dependency::new("tooling", "com.example:libX:2.0").unwrap();
        let mut tree = fixtures::shadowing(30, 33);
        tree.dependencies = if swap {
            vec![second, first]
        } else {
            vec![first, second]
        };

        let effective = resolve(tree, &ResolverOptions::lenient()).unwrap();
        prop_assert_eq!(effective.warnings().len(), 1);
        prop_assert_eq!(
            effective.dependencies()[0].coordinate.version.as_deref(),
            Some("1.0")
        );
    }
}
