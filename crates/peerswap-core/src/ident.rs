//! Package identities, descriptors and locators.
//!
//! Identities are built through an injected [`IdentityRegistry`] so the
//! hashing scheme is an explicit dependency rather than process-wide state.
//!
//! String forms:
//! - `react`, `@types/node` (ident)
//! - `react@^18.0.0`, `@types/node@npm:20.1.0` (descriptor / locator)
//! - `react` with no `@range` suffix parses as a descriptor with an empty range

use crate::error::PeerSwapError;
use peerswap_util::hash::blake3_fields;
use serde::{Serialize, Serializer};
use std::fmt;

/// Deterministic fingerprint of a package's scope and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentHash(String);

impl IdentHash {
    /// Wrap an already computed digest.
    #[must_use]
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A package identity, irrespective of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    scope: Option<String>,
    name: String,
    hash: IdentHash,
}

impl Ident {
    /// Assemble an identity from parts. Registries call this after hashing.
    #[must_use]
    pub fn from_parts(scope: Option<String>, name: String, hash: IdentHash) -> Self {
        Self { scope, name, hash }
    }

    /// Scope without the `@` prefix, if scoped.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Name without the scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn hash(&self) -> &IdentHash {
        &self.hash
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{scope}/{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl Serialize for Ident {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A package identity plus a requested range (pre-resolution).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    ident: Ident,
    range: String,
}

impl Descriptor {
    #[must_use]
    pub fn new(ident: Ident, range: impl Into<String>) -> Self {
        Self {
            ident,
            range: range.into(),
        }
    }

    #[must_use]
    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    #[must_use]
    pub fn range(&self) -> &str {
        &self.range
    }

    /// Copy of this descriptor with another range, identity preserved.
    #[must_use]
    pub fn with_range(&self, range: impl Into<String>) -> Self {
        Self::new(self.ident.clone(), range)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

impl Serialize for Descriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A package identity plus a resolved, concrete reference (post-resolution).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    ident: Ident,
    reference: String,
}

impl Locator {
    #[must_use]
    pub fn new(ident: Ident, reference: impl Into<String>) -> Self {
        Self {
            ident,
            reference: reference.into(),
        }
    }

    #[must_use]
    pub fn ident(&self) -> &Ident {
        &self.ident
    }

    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Copy of this locator with another reference, identity preserved.
    #[must_use]
    pub fn with_reference(&self, reference: impl Into<String>) -> Self {
        Self::new(self.ident.clone(), reference)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.reference)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Naming and hashing service for package identities.
///
/// Only [`IdentityRegistry::hash_of`] is required; everything else is
/// derived from it.
pub trait IdentityRegistry: fmt::Debug + Send + Sync {
    /// Stable hash key for a scope + name pair.
    fn hash_of(&self, scope: Option<&str>, name: &str) -> IdentHash;

    fn make_ident(&self, scope: Option<&str>, name: &str) -> Ident {
        Ident::from_parts(
            scope.map(str::to_string),
            name.to_string(),
            self.hash_of(scope, name),
        )
    }

    fn make_descriptor(&self, ident: &Ident, range: &str) -> Descriptor {
        Descriptor::new(ident.clone(), range)
    }

    fn make_locator(&self, ident: &Ident, reference: &str) -> Locator {
        Locator::new(ident.clone(), reference)
    }

    /// Parse `name` or `@scope/name`.
    fn parse_ident(&self, input: &str) -> Result<Ident, PeerSwapError> {
        let (scope, name, range) = split_descriptor(input)?;
        if range.is_some() {
            return Err(PeerSwapError::invalid_descriptor(
                input,
                "unexpected range in package name",
            ));
        }
        Ok(self.make_ident(scope, name))
    }

    /// Parse `name[@range]` or `@scope/name[@range]`.
    ///
    /// A missing range yields an empty range.
    fn parse_descriptor(&self, input: &str) -> Result<Descriptor, PeerSwapError> {
        let (scope, name, range) = split_descriptor(input)?;
        let ident = self.make_ident(scope, name);
        Ok(Descriptor::new(ident, range.unwrap_or_default()))
    }

    /// Parse `name@reference` or `@scope/name@reference`.
    fn parse_locator(&self, input: &str) -> Result<Locator, PeerSwapError> {
        let (scope, name, reference) = split_descriptor(input)?;
        let Some(reference) = reference.filter(|r| !r.is_empty()) else {
            return Err(PeerSwapError::invalid_descriptor(
                input,
                "locator requires a reference",
            ));
        };
        Ok(Locator::new(self.make_ident(scope, name), reference))
    }
}

/// Default registry: BLAKE3 over the scope and name fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Registry;

impl IdentityRegistry for Blake3Registry {
    fn hash_of(&self, scope: Option<&str>, name: &str) -> IdentHash {
        IdentHash::new(blake3_fields(&[scope.unwrap_or(""), name]))
    }
}

/// Split a descriptor string into scope, name and optional range.
fn split_descriptor(input: &str) -> Result<(Option<&str>, &str, Option<&str>), PeerSwapError> {
    if input.is_empty() {
        return Err(PeerSwapError::invalid_descriptor(input, "empty package name"));
    }

    let (scope, rest) = if let Some(scoped) = input.strip_prefix('@') {
        let Some(slash_pos) = scoped.find('/') else {
            return Err(PeerSwapError::invalid_descriptor(
                input,
                "scoped package is missing '/'",
            ));
        };
        let scope = &scoped[..slash_pos];
        if scope.is_empty() {
            return Err(PeerSwapError::invalid_descriptor(input, "empty scope"));
        }
        validate_name(input, scope)?;
        (Some(scope), &scoped[slash_pos + 1..])
    } else {
        (None, input)
    };

    // The first '@' after the name starts the range
    let (name, range) = match rest.find('@') {
        Some(at_pos) => (&rest[..at_pos], Some(&rest[at_pos + 1..])),
        None => (rest, None),
    };

    validate_name(input, name)?;
    Ok((scope, name, range))
}

fn validate_name(input: &str, name: &str) -> Result<(), PeerSwapError> {
    if name.is_empty() {
        return Err(PeerSwapError::invalid_descriptor(input, "empty package name"));
    }

    for c in name.chars() {
        if !c.is_alphanumeric() && c != '-' && c != '_' && c != '.' {
            return Err(PeerSwapError::invalid_descriptor(
                input,
                format!("invalid character '{c}' in package name '{name}'"),
            ));
        }
    }

    Ok(())
}
