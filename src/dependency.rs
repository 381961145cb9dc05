//! Role-tagged dependency ledger
//!
//! Entries are keyed by (role, library identity). Declaring the same library
//! twice for one role is reported even when the versions differ, which is
//! the usual "pinned twice" mistake.

use buildcfg_model::{Coordinate, Dependency};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ResolveError;

#[derive(Debug, Clone, Default)]
pub struct DependencyLedger {
    entries: BTreeMap<(String, String), Dependency>,
}

impl DependencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dependency; a duplicate leaves the ledger unchanged.
    pub fn add(&mut self, role: &str, coordinate: Coordinate) -> Result<(), ResolveError> {
        let slot = (role.to_string(), coordinate.identity());
        if let Some(existing) = self.entries.get(&slot) {
            return Err(ResolveError::DependencyDuplicate {
                role: role.to_string(),
                existing: existing.coordinate.clone(),
                duplicate: coordinate,
            });
        }

        debug!(role, coordinate = %coordinate, "Dependency recorded");
        self.entries.insert(
            slot,
            Dependency {
                role: role.to_string(),
                coordinate,
            },
        );
        Ok(())
    }

    pub fn add_dependency(&mut self, dependency: Dependency) -> Result<(), ResolveError> {
        self.add(&dependency.role, dependency.coordinate)
    }

    /// Entries sorted by role, then library identity.
    pub fn entries(&self) -> impl Iterator<Item = &Dependency> {
        self.entries.values()
    }

    pub fn by_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a Coordinate> + 'a {
        self.entries
            .values()
            .filter(move |d| d.role == role)
            .map(|d| &d.coordinate)
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.entries.keys().any(|(r, _)| r == role)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Dependency> {
        self.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(s: &str) -> Coordinate {
        Coordinate::parse(s).unwrap()
    }

    #[test]
    fn test_same_library_different_version_is_duplicate() {
        let mut ledger = DependencyLedger::new();
        ledger.add("tooling", coord("org.example:libX:1.0")).unwrap();

        let err = ledger.add("tooling", coord("org.example:libX:2.0")).unwrap_err();
        assert_eq!(
            err,
            ResolveError::DependencyDuplicate {
                role: "tooling".to_string(),
                existing: coord("org.example:libX:1.0"),
                duplicate: coord("org.example:libX:2.0"),
            }
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.by_role("tooling").next().map(|c| c.to_string()),
            Some("org.example:libX:1.0".to_string())
        );
    }

    #[test]
    fn test_ungrouped_coordinates_share_identity() {
        let mut ledger = DependencyLedger::new();
        ledger
            .add_dependency(Dependency::new("tooling", "libX:1.0").unwrap())
            .unwrap();

        let err = ledger
            .add_dependency(Dependency::new("tooling", "libX:2.0").unwrap())
            .unwrap_err();
        assert!(matches!(err, ResolveError::DependencyDuplicate { .. }));
        assert_eq!(ledger.len(), 1);

        ledger
            .add_dependency(Dependency::new("tooling", "org.example:libX:1.0").unwrap())
            .unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_same_library_different_roles_allowed() {
        let mut ledger = DependencyLedger::new();
        ledger.add("tooling", coord("org.example:libX:1.0")).unwrap();
        ledger.add("runtime", coord("org.example:libX:1.0")).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains_role("runtime"));
        assert!(!ledger.contains_role("testRuntime"));
    }

    #[test]
    fn test_entries_sorted_regardless_of_insertion() {
        let mut ledger = DependencyLedger::new();
        ledger.add("runtime", coord("z.z:zz:1")).unwrap();
        let desugar =
            Dependency::new("coreLibraryDesugaring", "com.android.tools:desugar_jdk_libs:2.0.3")
                .unwrap();
        ledger.add_dependency(desugar).unwrap();
        ledger.add("runtime", coord("a.a:aa:1")).unwrap();

        let listed: Vec<String> = ledger
            .entries()
            .map(|d| format!("{} {}", d.role, d.coordinate))
            .collect();
        assert_eq!(
            listed,
            vec![
                "coreLibraryDesugaring com.android.tools:desugar_jdk_libs:2.0.3",
                "runtime a.a:aa:1",
                "runtime z.z:zz:1",
            ]
        );
    }
}
