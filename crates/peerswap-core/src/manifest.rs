//! Workspace manifest (package.json) lookup.
//!
//! Only the fields the peer rewrite needs are read; unknown fields are
//! ignored.

use crate::error::PeerSwapError;
use crate::ident::Ident;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "package.json";

/// The subset of package.json used when binding descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
}

/// Where a manifest declares a package, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredRange {
    Dev(String),
    Regular(String),
    Unspecified,
}

impl DeclaredRange {
    /// The declared range, or the empty string when unspecified.
    #[must_use]
    pub fn as_source(&self) -> &str {
        match self {
            Self::Dev(range) | Self::Regular(range) => range,
            Self::Unspecified => "",
        }
    }

    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }
}

impl Manifest {
    /// Read a manifest from disk.
    ///
    /// # Errors
    /// Returns `ManifestNotFound` if the file does not exist and
    /// `ManifestInvalid` if it is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self, PeerSwapError> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                PeerSwapError::ManifestNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PeerSwapError::io(path, e)
            }
        })?;

        serde_json::from_str(&content).map_err(|source| PeerSwapError::ManifestInvalid {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `package.json` from a directory.
    ///
    /// # Errors
    /// See [`Manifest::load`].
    pub fn load_from_dir(dir: &Path) -> Result<Self, PeerSwapError> {
        Self::load(&dir.join(MANIFEST_NAME))
    }

    /// The range this manifest declares for `ident`.
    ///
    /// devDependencies are checked before dependencies.
    #[must_use]
    pub fn declared_range(&self, ident: &Ident) -> DeclaredRange {
        let key = ident.to_string();
        if let Some(range) = self.dev_dependencies.get(&key) {
            DeclaredRange::Dev(range.clone())
        } else if let Some(range) = self.dependencies.get(&key) {
            DeclaredRange::Regular(range.clone())
        } else {
            DeclaredRange::Unspecified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{Blake3Registry, IdentityRegistry};
    use tempfile::tempdir;

    fn ident(name: &str) -> Ident {
        Blake3Registry.parse_ident(name).unwrap()
    }

    #[test]
    fn test_dev_dependencies_checked_first() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "name": "app",
                "dependencies": { "eslint": "npm:8.0.0", "react": "^18" },
                "devDependencies": { "eslint": "npm:9.0.0" }
            }"#,
        )
        .unwrap();

        assert_eq!(
            manifest.declared_range(&ident("eslint")),
            DeclaredRange::Dev("npm:9.0.0".to_string())
        );
        assert_eq!(
            manifest.declared_range(&ident("react")),
            DeclaredRange::Regular("^18".to_string())
        );
        assert_eq!(
            manifest.declared_range(&ident("vue")),
            DeclaredRange::Unspecified
        );
    }

    #[test]
    fn test_scoped_lookup() {
        let manifest: Manifest =
            serde_json::from_str(r#"{ "devDependencies": { "@types/node": "^20" } }"#).unwrap();
        assert_eq!(
            manifest.declared_range(&ident("@types/node")).as_source(),
            "^20"
        );
    }

    #[test]
    fn test_unspecified_source_is_empty() {
        assert_eq!(DeclaredRange::Unspecified.as_source(), "");
        assert!(DeclaredRange::Unspecified.is_unspecified());
        assert!(!DeclaredRange::Regular("1".to_string()).is_unspecified());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_NAME),
            r#"{ "name": "app", "version": "1.0.0", "scripts": { "test": "x" } }"#,
        )
        .unwrap();

        let manifest = Manifest::load_from_dir(dir.path()).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("app"));
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempdir().unwrap();
        let err = Manifest::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PeerSwapError::ManifestNotFound { .. }));
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_NAME),
            r#"{ "dependencies": { "a": 1 } }"#,
        )
        .unwrap();

        let err = Manifest::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, PeerSwapError::ManifestInvalid { .. }));
    }
}
