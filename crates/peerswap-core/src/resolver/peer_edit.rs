//! Resolver for tagged ranges that rewrite peer dependencies.
//!
//! A descriptor such as `eslint@peer-edit:#eslint@unknown:typescript-eslint@^8`
//! resolves to whatever the upstream resolver returns for the embedded
//! source, with the listed peer edits applied on top. Tagged references keep
//! the edits, so the rewritten package has a distinct identity from the
//! upstream one.

use super::{FetchResult, Fetcher, ResolutionDependencies, Resolver};
use crate::codec::WILDCARD_RANGE;
use crate::engine::PeerRewriteEngine;
use crate::error::PeerSwapError;
use crate::ident::{Descriptor, IdentityRegistry, Locator};
use crate::manifest::{DeclaredRange, Manifest};
use crate::package::Package;
use crate::range::{change_source, extract_source};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Protocol tag used when none is configured.
pub const DEFAULT_PROTOCOL: &str = "peer-edit:";

/// Name of the sibling resolution requested by
/// [`Resolver::get_resolution_dependencies`].
pub const SOURCE_DEPENDENCY: &str = "source";

#[derive(Debug, Clone)]
pub struct PeerEditResolver<U> {
    protocol: String,
    engine: PeerRewriteEngine,
    upstream: U,
}

impl<U> PeerEditResolver<U> {
    #[must_use]
    pub fn new(registry: Arc<dyn IdentityRegistry>, upstream: U) -> Self {
        Self::with_protocol(DEFAULT_PROTOCOL, registry, upstream)
    }

    /// Use another protocol tag. A missing trailing `:` is added.
    #[must_use]
    pub fn with_protocol(
        protocol: impl Into<String>,
        registry: Arc<dyn IdentityRegistry>,
        upstream: U,
    ) -> Self {
        let mut protocol = protocol.into();
        if !protocol.ends_with(':') {
            protocol.push(':');
        }
        Self {
            protocol,
            engine: PeerRewriteEngine::new(registry),
            upstream,
        }
    }

    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    #[must_use]
    pub fn engine(&self) -> &PeerRewriteEngine {
        &self.engine
    }

    #[must_use]
    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    /// Fill the source from the manifest's own declaration of the package.
    ///
    /// A source already present in the descriptor survives when the
    /// manifest has nothing to say, and a declaration that is itself tagged
    /// counts as no declaration.
    #[must_use]
    pub fn bind_to_manifest(&self, descriptor: &Descriptor, manifest: &Manifest) -> Descriptor {
        let declared = match manifest.declared_range(descriptor.ident()) {
            declared if self.is_tagged(declared.as_source()) => DeclaredRange::Unspecified,
            declared => declared,
        };

        if declared.is_unspecified() && !extract_source(descriptor.range()).is_empty() {
            return descriptor.clone();
        }

        let bound = self
            .engine
            .bind_requested_range(descriptor.range(), &declared);
        descriptor.with_range(bound)
    }

    fn is_tagged(&self, range: &str) -> bool {
        range.starts_with(&self.protocol)
    }

    /// Upstream locator for a tagged one.
    fn untag(&self, locator: &Locator) -> Result<Locator, PeerSwapError> {
        if !self.is_tagged(locator.reference()) {
            return Err(PeerSwapError::UnsupportedRange {
                range: locator.reference().to_string(),
            });
        }
        let tagged = self.engine.codec().decode(locator.reference())?;
        if tagged.is_unspecified() {
            return Err(PeerSwapError::UnresolvableSource {
                range: locator.reference().to_string(),
            });
        }
        Ok(locator.with_reference(tagged.source()))
    }
}

impl<U: Resolver> PeerEditResolver<U> {
    /// Run the whole pipeline for one descriptor: bind it against
    /// `manifest`, resolve its sibling through the upstream, pick the best
    /// candidate and resolve it.
    ///
    /// # Errors
    /// Any error from the individual steps, scoped to this descriptor.
    pub async fn resolve_descriptor(
        &self,
        descriptor: &Descriptor,
        manifest: &Manifest,
    ) -> Result<Package, PeerSwapError> {
        if !self.supports_descriptor(descriptor) {
            return Err(PeerSwapError::UnsupportedRange {
                range: descriptor.range().to_string(),
            });
        }

        let bound = self.bind_descriptor(descriptor, manifest)?;

        let mut siblings = ResolutionDependencies::new();
        for (name, sibling) in self.get_resolution_dependencies(&bound)? {
            if let Some(locator) = self.best_upstream_candidate(&sibling).await? {
                siblings.insert(name, locator);
            }
        }

        let candidates = self.get_candidates(&bound, &siblings).await?;
        let Some(best) = candidates.first() else {
            return Err(PeerSwapError::VersionNotFound {
                name: bound.ident().to_string(),
                range: bound.range().to_string(),
            });
        };

        self.resolve(best).await
    }

    /// Resolve many descriptors concurrently. A failure only affects its own
    /// entry.
    pub async fn resolve_all(
        &self,
        descriptors: &[Descriptor],
        manifest: &Manifest,
    ) -> Vec<(Descriptor, Result<Package, PeerSwapError>)> {
        let outcomes = join_all(
            descriptors
                .iter()
                .map(|descriptor| self.resolve_descriptor(descriptor, manifest)),
        )
        .await;

        descriptors.iter().cloned().zip(outcomes).collect()
    }

    async fn best_upstream_candidate(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<Locator>, PeerSwapError> {
        let candidates = self
            .upstream
            .get_candidates(descriptor, &ResolutionDependencies::new())
            .await
            .map_err(|e| upstream_resolution_failed(descriptor, e))?;
        Ok(candidates.into_iter().next())
    }
}

impl<U: Resolver> Resolver for PeerEditResolver<U> {
    fn supports_descriptor(&self, descriptor: &Descriptor) -> bool {
        self.is_tagged(descriptor.range())
    }

    fn supports_locator(&self, locator: &Locator) -> bool {
        self.is_tagged(locator.reference())
    }

    fn bind_descriptor(
        &self,
        descriptor: &Descriptor,
        manifest: &Manifest,
    ) -> Result<Descriptor, PeerSwapError> {
        Ok(self.bind_to_manifest(descriptor, manifest))
    }

    /// The upstream resolution of the same package, used when the bound
    /// range has no source of its own.
    fn get_resolution_dependencies(
        &self,
        descriptor: &Descriptor,
    ) -> Result<BTreeMap<String, Descriptor>, PeerSwapError> {
        let source = extract_source(descriptor.range());
        let range = if source.is_empty() {
            WILDCARD_RANGE.to_string()
        } else {
            source
        };

        let mut dependencies = BTreeMap::new();
        dependencies.insert(
            SOURCE_DEPENDENCY.to_string(),
            descriptor.with_range(range),
        );
        Ok(dependencies)
    }

    async fn get_candidates(
        &self,
        descriptor: &Descriptor,
        dependencies: &ResolutionDependencies,
    ) -> Result<Vec<Locator>, PeerSwapError> {
        let sibling = dependencies.get(SOURCE_DEPENDENCY).map(Locator::reference);
        let range = self
            .engine
            .resolve_candidate_range(descriptor.range(), sibling)?;

        let upstream_descriptor = descriptor.with_range(range);
        if !self.upstream.supports_descriptor(&upstream_descriptor) {
            return Err(PeerSwapError::UnsupportedRange {
                range: upstream_descriptor.range().to_string(),
            });
        }

        let candidates = self
            .upstream
            .get_candidates(&upstream_descriptor, dependencies)
            .await
            .map_err(|e| upstream_resolution_failed(&upstream_descriptor, e))?;

        Ok(candidates
            .into_iter()
            .map(|locator| {
                let reference = change_source(descriptor.range(), locator.reference());
                locator.with_reference(reference)
            })
            .collect())
    }

    async fn resolve(&self, locator: &Locator) -> Result<Package, PeerSwapError> {
        let upstream_locator = self.untag(locator)?;
        if !self.upstream.supports_locator(&upstream_locator) {
            return Err(unsupported(&upstream_locator));
        }
        let tagged = self.engine.codec().decode(locator.reference())?;

        let package = self
            .upstream
            .resolve(&upstream_locator)
            .await
            .map_err(|e| PeerSwapError::UpstreamResolutionFailed {
                descriptor: upstream_locator.to_string(),
                source: Box::new(e),
            })?;

        Ok(self
            .engine
            .rewrite_peer_dependencies(&package, tagged.edits(), locator))
    }
}

impl<U: Fetcher> Fetcher for PeerEditResolver<U> {
    fn supports_fetch(&self, locator: &Locator) -> bool {
        self.is_tagged(locator.reference())
    }

    async fn fetch(&self, locator: &Locator) -> Result<FetchResult, PeerSwapError> {
        let upstream_locator = self.untag(locator)?;
        if !self.upstream.supports_fetch(&upstream_locator) {
            return Err(unsupported(&upstream_locator));
        }

        let mut result = self
            .upstream
            .fetch(&upstream_locator)
            .await
            .map_err(|e| PeerSwapError::UpstreamFetchFailed {
                locator: upstream_locator.to_string(),
                source: Box::new(e),
            })?;

        result.locator = locator.clone();
        Ok(result)
    }
}

fn unsupported(locator: &Locator) -> PeerSwapError {
    PeerSwapError::UnsupportedRange {
        range: locator.reference().to_string(),
    }
}

fn upstream_resolution_failed(descriptor: &Descriptor, source: PeerSwapError) -> PeerSwapError {
    PeerSwapError::UpstreamResolutionFailed {
        descriptor: descriptor.to_string(),
        source: Box::new(source),
    }
}
