//! Resolved package metadata.

use crate::ident::{Descriptor, IdentHash, Locator};
use serde::Serialize;
use std::collections::BTreeMap;

/// Dependency map keyed by the identity hash of each dependency.
pub type DependencyMap = BTreeMap<IdentHash, Descriptor>;

/// A package as produced by a resolver.
///
/// Resolvers hand out owned values; anything that edits a package works on
/// its own clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub locator: Locator,
    pub version: Option<String>,
    pub dependencies: DependencyMap,
    pub peer_dependencies: DependencyMap,
}

impl Package {
    #[must_use]
    pub fn new(locator: Locator, version: Option<String>) -> Self {
        Self {
            locator,
            version,
            dependencies: DependencyMap::new(),
            peer_dependencies: DependencyMap::new(),
        }
    }

    /// Insert a dependency, replacing any previous entry for the same ident.
    pub fn add_dependency(&mut self, descriptor: Descriptor) {
        self.dependencies
            .insert(descriptor.ident().hash().clone(), descriptor);
    }

    /// Insert a peer dependency, replacing any previous entry for the same ident.
    pub fn add_peer_dependency(&mut self, descriptor: Descriptor) {
        self.peer_dependencies
            .insert(descriptor.ident().hash().clone(), descriptor);
    }

    /// Look up a peer dependency by package name (`react`, `@types/node`).
    #[must_use]
    pub fn peer_dependency(&self, name: &str) -> Option<&Descriptor> {
        self.peer_dependencies
            .values()
            .find(|d| d.ident().to_string() == name)
    }

    /// Name-keyed view for display and JSON output.
    #[must_use]
    pub fn summary(&self) -> PackageSummary {
        PackageSummary {
            name: self.locator.ident().to_string(),
            reference: self.locator.reference().to_string(),
            version: self.version.clone(),
            dependencies: by_name(&self.dependencies),
            peer_dependencies: by_name(&self.peer_dependencies),
        }
    }
}

fn by_name(map: &DependencyMap) -> BTreeMap<String, String> {
    map.values()
        .map(|d| (d.ident().to_string(), d.range().to_string()))
        .collect()
}

/// Serializable, name-keyed form of a [`Package`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub name: String,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{Blake3Registry, IdentityRegistry};

    #[test]
    fn test_add_peer_dependency_replaces_same_ident() {
        let registry = Blake3Registry;
        let locator = registry.parse_locator("eslint-plugin@npm:1.0.0").unwrap();
        let mut pkg = Package::new(locator, Some("1.0.0".to_string()));

        pkg.add_peer_dependency(registry.parse_descriptor("eslint@^8").unwrap());
        pkg.add_peer_dependency(registry.parse_descriptor("eslint@^9").unwrap());

        assert_eq!(pkg.peer_dependencies.len(), 1);
        assert_eq!(pkg.peer_dependency("eslint").unwrap().range(), "^9");
    }

    #[test]
    fn test_summary_json() {
        let registry = Blake3Registry;
        let locator = registry.parse_locator("@scope/pkg@npm:2.0.0").unwrap();
        let mut pkg = Package::new(locator, Some("2.0.0".to_string()));
        pkg.add_dependency(registry.parse_descriptor("lodash@^4").unwrap());
        pkg.add_peer_dependency(registry.parse_descriptor("react@>=17").unwrap());

        let json = serde_json::to_value(pkg.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "@scope/pkg",
                "reference": "npm:2.0.0",
                "version": "2.0.0",
                "dependencies": { "lodash": "^4" },
                "peerDependencies": { "react": ">=17" }
            })
        );
    }
}
