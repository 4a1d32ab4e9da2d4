//! Resolver and fetcher over a directory of npm packuments.
//!
//! Layout:
//!
//! ```text
//! <root>/react.json            packument for `react`
//! <root>/@types%2Fnode.json    packument for `@types/node`
//! <root>/tarballs/...          archives referenced by `dist.tarball`
//! ```
//!
//! Packuments use the npm registry format (`dist-tags`, `versions`, per-version
//! `dependencies` / `peerDependencies` / `dist.tarball`). Relative tarball
//! paths are resolved against the root.

use super::version::max_satisfying;
use super::{FetchResult, Fetcher, ResolutionDependencies, Resolver};
use crate::error::PeerSwapError;
use crate::ident::{Descriptor, Ident, IdentityRegistry, Locator};
use crate::package::Package;
use crate::range::parse_range;
use peerswap_util::hash::blake3_file;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Protocol of references produced by this resolver.
pub const NPM_PROTOCOL: &str = "npm:";

/// Dist-tag used when no range is given.
const LATEST_TAG: &str = "latest";

#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
    registry: Arc<dyn IdentityRegistry>,
}

impl LocalRegistry {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, registry: Arc<dyn IdentityRegistry>) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the packument file for `ident`.
    #[must_use]
    pub fn packument_path(&self, ident: &Ident) -> PathBuf {
        let file_name = format!("{}.json", ident.to_string().replace('/', "%2F"));
        self.root.join(file_name)
    }

    async fn load_packument(&self, ident: &Ident) -> Result<Value, PeerSwapError> {
        let path = self.packument_path(ident);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PeerSwapError::PackageNotFound {
                    name: ident.to_string(),
                });
            }
            Err(e) => return Err(PeerSwapError::io(path, e)),
        };

        serde_json::from_str(&content).map_err(|e| PeerSwapError::PackumentInvalid {
            name: ident.to_string(),
            reason: e.to_string(),
        })
    }

    /// The version named by an `npm:<version>` reference.
    fn pinned_version(locator: &Locator) -> Result<&str, PeerSwapError> {
        locator
            .reference()
            .strip_prefix(NPM_PROTOCOL)
            .ok_or_else(|| PeerSwapError::UnsupportedRange {
                range: locator.reference().to_string(),
            })
    }

    fn version_manifest<'a>(
        packument: &'a Value,
        locator: &Locator,
    ) -> Result<&'a Value, PeerSwapError> {
        let version = Self::pinned_version(locator)?;
        packument
            .get("versions")
            .and_then(|versions| versions.get(version))
            .ok_or_else(|| PeerSwapError::VersionNotFound {
                name: locator.ident().to_string(),
                range: version.to_string(),
            })
    }

    fn read_dependency_section(
        &self,
        owner: &Ident,
        manifest: &Value,
        section: &str,
    ) -> Result<Vec<Descriptor>, PeerSwapError> {
        let Some(entries) = manifest.get(section).and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        entries
            .iter()
            .map(|(name, range)| {
                let invalid = |reason: String| PeerSwapError::PackumentInvalid {
                    name: owner.to_string(),
                    reason,
                };
                let range = range
                    .as_str()
                    .ok_or_else(|| invalid(format!("{section}.{name} is not a string")))?;
                let ident = self
                    .registry
                    .parse_ident(name)
                    .map_err(|e| invalid(e.to_string()))?;
                Ok(self.registry.make_descriptor(&ident, range))
            })
            .collect()
    }
}

/// The npm selector of a range this resolver understands: `npm:<range>` or a
/// bare semver range.
fn npm_selector(range: &str) -> Option<&str> {
    if let Some(selector) = range.strip_prefix(NPM_PROTOCOL) {
        return Some(selector);
    }
    let parts = parse_range(range);
    (parts.protocol.is_none() && parts.source.is_none()).then_some(range)
}

/// Resolve a selector against a packument: dist-tag, then semver range.
fn select_version<'a>(packument: &'a Value, selector: &str) -> Option<&'a str> {
    let tag = if selector.is_empty() { LATEST_TAG } else { selector };
    if let Some(tagged) = packument
        .get("dist-tags")
        .and_then(|t| t.get(tag))
        .and_then(Value::as_str)
    {
        return Some(tagged);
    }

    let versions: Vec<&str> = packument
        .get("versions")
        .and_then(Value::as_object)
        .map(|obj| obj.keys().map(String::as_str).collect())
        .unwrap_or_default();

    max_satisfying(&versions, selector)
}

impl Resolver for LocalRegistry {
    fn supports_descriptor(&self, descriptor: &Descriptor) -> bool {
        npm_selector(descriptor.range()).is_some()
    }

    fn supports_locator(&self, locator: &Locator) -> bool {
        locator.reference().starts_with(NPM_PROTOCOL)
    }

    async fn get_candidates(
        &self,
        descriptor: &Descriptor,
        _dependencies: &ResolutionDependencies,
    ) -> Result<Vec<Locator>, PeerSwapError> {
        let Some(selector) = npm_selector(descriptor.range()) else {
            return Err(PeerSwapError::UnsupportedRange {
                range: descriptor.range().to_string(),
            });
        };

        let packument = self.load_packument(descriptor.ident()).await?;
        let version =
            select_version(&packument, selector).ok_or_else(|| PeerSwapError::VersionNotFound {
                name: descriptor.ident().to_string(),
                range: selector.to_string(),
            })?;

        Ok(vec![self
            .registry
            .make_locator(descriptor.ident(), &format!("{NPM_PROTOCOL}{version}"))])
    }

    async fn resolve(&self, locator: &Locator) -> Result<Package, PeerSwapError> {
        let packument = self.load_packument(locator.ident()).await?;
        let manifest = Self::version_manifest(&packument, locator)?;
        let version = Self::pinned_version(locator)?;

        let mut package = Package::new(locator.clone(), Some(version.to_string()));
        for dep in self.read_dependency_section(locator.ident(), manifest, "dependencies")? {
            package.add_dependency(dep);
        }
        for peer in self.read_dependency_section(locator.ident(), manifest, "peerDependencies")? {
            package.add_peer_dependency(peer);
        }

        Ok(package)
    }
}

impl Fetcher for LocalRegistry {
    fn supports_fetch(&self, locator: &Locator) -> bool {
        locator.reference().starts_with(NPM_PROTOCOL)
    }

    async fn fetch(&self, locator: &Locator) -> Result<FetchResult, PeerSwapError> {
        let packument = self.load_packument(locator.ident()).await?;
        let manifest = Self::version_manifest(&packument, locator)?;

        let tarball = manifest
            .get("dist")
            .and_then(|d| d.get("tarball"))
            .and_then(Value::as_str)
            .ok_or_else(|| PeerSwapError::PackumentInvalid {
                name: locator.ident().to_string(),
                reason: format!("{} has no dist.tarball", locator.reference()),
            })?;

        let path = self.root.join(tarball);
        let hashed = path.clone();
        let checksum = tokio::task::spawn_blocking(move || blake3_file(&hashed))
            .await
            .map_err(|e| PeerSwapError::io(&path, std::io::Error::other(e)))?
            .map_err(|e| PeerSwapError::io(&path, e))?;

        Ok(FetchResult {
            locator: locator.clone(),
            path,
            checksum,
        })
    }
}
