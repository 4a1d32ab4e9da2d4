//! Resolver plugin interface.
//!
//! A host drives resolution in four steps per descriptor:
//! 1. [`Resolver::bind_descriptor`] against the consuming manifest
//! 2. [`Resolver::get_resolution_dependencies`], which the host resolves first
//! 3. [`Resolver::get_candidates`] with those sibling resolutions
//! 4. [`Resolver::resolve`] on the chosen locator
//!
//! Fetching goes through [`Fetcher`].

pub mod local;
pub mod peer_edit;
pub mod version;

use crate::error::PeerSwapError;
use crate::ident::{Descriptor, Locator};
use crate::manifest::Manifest;
use crate::package::Package;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use local::LocalRegistry;
pub use peer_edit::{PeerEditResolver, DEFAULT_PROTOCOL, SOURCE_DEPENDENCY};

/// Sibling resolutions handed back to [`Resolver::get_candidates`], keyed by
/// the names returned from [`Resolver::get_resolution_dependencies`].
pub type ResolutionDependencies = BTreeMap<String, Locator>;

#[allow(async_fn_in_trait)]
pub trait Resolver {
    fn supports_descriptor(&self, descriptor: &Descriptor) -> bool;

    fn supports_locator(&self, locator: &Locator) -> bool;

    /// Make a descriptor concrete relative to the manifest declaring it.
    fn bind_descriptor(
        &self,
        descriptor: &Descriptor,
        _manifest: &Manifest,
    ) -> Result<Descriptor, PeerSwapError> {
        Ok(descriptor.clone())
    }

    /// Descriptors the host must resolve before calling `get_candidates`.
    fn get_resolution_dependencies(
        &self,
        _descriptor: &Descriptor,
    ) -> Result<BTreeMap<String, Descriptor>, PeerSwapError> {
        Ok(BTreeMap::new())
    }

    /// Locators satisfying `descriptor`, best first.
    async fn get_candidates(
        &self,
        descriptor: &Descriptor,
        dependencies: &ResolutionDependencies,
    ) -> Result<Vec<Locator>, PeerSwapError>;

    async fn resolve(&self, locator: &Locator) -> Result<Package, PeerSwapError>;
}

/// Result of fetching a package's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub locator: Locator,
    /// Location of the package archive on disk.
    pub path: PathBuf,
    /// BLAKE3 digest of the archive.
    pub checksum: String,
}

#[allow(async_fn_in_trait)]
pub trait Fetcher {
    fn supports_fetch(&self, locator: &Locator) -> bool;

    async fn fetch(&self, locator: &Locator) -> Result<FetchResult, PeerSwapError>;
}
