//! Error types for peerswap.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, one per [`PeerSwapError`] variant.
pub mod codes {
    pub const PEER_EDIT_MALFORMED: &str = "PEER_EDIT_MALFORMED";
    pub const PEER_DESCRIPTOR_INVALID: &str = "PEER_DESCRIPTOR_INVALID";
    pub const PEER_SOURCE_UNRESOLVABLE: &str = "PEER_SOURCE_UNRESOLVABLE";
    pub const PEER_RANGE_UNSUPPORTED: &str = "PEER_RANGE_UNSUPPORTED";
    pub const PEER_UPSTREAM_RESOLUTION_FAILED: &str = "PEER_UPSTREAM_RESOLUTION_FAILED";
    pub const PEER_UPSTREAM_FETCH_FAILED: &str = "PEER_UPSTREAM_FETCH_FAILED";

    // Local registry / manifest codes
    pub const PKG_NOT_FOUND: &str = "PKG_NOT_FOUND";
    pub const PKG_VERSION_NOT_FOUND: &str = "PKG_VERSION_NOT_FOUND";
    pub const PKG_PACKUMENT_INVALID: &str = "PKG_PACKUMENT_INVALID";
    pub const PKG_PACKAGE_JSON_NOT_FOUND: &str = "PKG_PACKAGE_JSON_NOT_FOUND";
    pub const PKG_PACKAGE_JSON_INVALID: &str = "PKG_PACKAGE_JSON_INVALID";
    pub const PKG_IO_ERROR: &str = "PKG_IO_ERROR";
}

/// Error raised while decoding, binding or resolving a tagged range.
///
/// Every error is scoped to the single descriptor being resolved; callers
/// resolving many descriptors keep going after one fails.
#[derive(Error, Debug)]
pub enum PeerSwapError {
    #[error("Malformed peer edit '{segment}': {reason}")]
    MalformedEdit { segment: String, reason: String },

    #[error("Invalid descriptor '{input}': {reason}")]
    InvalidDescriptor { input: String, reason: String },

    #[error("No source range in '{range}' and no sibling resolution was provided")]
    UnresolvableSource { range: String },

    #[error("Range '{range}' is not supported by this resolver")]
    UnsupportedRange { range: String },

    #[error("Upstream resolution failed for {descriptor}: {source}")]
    UpstreamResolutionFailed {
        descriptor: String,
        #[source]
        source: Box<PeerSwapError>,
    },

    #[error("Upstream fetch failed for {locator}: {source}")]
    UpstreamFetchFailed {
        locator: String,
        #[source]
        source: Box<PeerSwapError>,
    },

    #[error("Package not found: {name}")]
    PackageNotFound { name: String },

    #[error("No version of {name} satisfies range: {range}")]
    VersionNotFound { name: String, range: String },

    #[error("Invalid packument for {name}: {reason}")]
    PackumentInvalid { name: String, reason: String },

    #[error("package.json not found: {}", .path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to parse package.json at {}: {source}", .path.display())]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PeerSwapError {
    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedEdit { .. } => codes::PEER_EDIT_MALFORMED,
            Self::InvalidDescriptor { .. } => codes::PEER_DESCRIPTOR_INVALID,
            Self::UnresolvableSource { .. } => codes::PEER_SOURCE_UNRESOLVABLE,
            Self::UnsupportedRange { .. } => codes::PEER_RANGE_UNSUPPORTED,
            Self::UpstreamResolutionFailed { .. } => codes::PEER_UPSTREAM_RESOLUTION_FAILED,
            Self::UpstreamFetchFailed { .. } => codes::PEER_UPSTREAM_FETCH_FAILED,
            Self::PackageNotFound { .. } => codes::PKG_NOT_FOUND,
            Self::VersionNotFound { .. } => codes::PKG_VERSION_NOT_FOUND,
            Self::PackumentInvalid { .. } => codes::PKG_PACKUMENT_INVALID,
            Self::ManifestNotFound { .. } => codes::PKG_PACKAGE_JSON_NOT_FOUND,
            Self::ManifestInvalid { .. } => codes::PKG_PACKAGE_JSON_INVALID,
            Self::Io { .. } => codes::PKG_IO_ERROR,
        }
    }

    pub(crate) fn malformed_edit(segment: &str, reason: impl Into<String>) -> Self {
        Self::MalformedEdit {
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_descriptor(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_matches_variant() {
        let err = PeerSwapError::malformed_edit("bad", "missing ident");
        assert_eq!(err.code(), codes::PEER_EDIT_MALFORMED);
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_upstream_error_keeps_cause() {
        let err = PeerSwapError::UpstreamResolutionFailed {
            descriptor: "eslint@npm:9.0.0".to_string(),
            source: Box::new(PeerSwapError::PackageNotFound {
                name: "eslint".to_string(),
            }),
        };
        assert_eq!(err.code(), codes::PEER_UPSTREAM_RESOLUTION_FAILED);
        let msg = err.to_string();
        assert!(msg.contains("eslint@npm:9.0.0"));
        assert!(msg.contains("Package not found: eslint"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_codes_uppercase() {
        let all_codes = [
            codes::PEER_EDIT_MALFORMED,
            codes::PEER_DESCRIPTOR_INVALID,
            codes::PEER_SOURCE_UNRESOLVABLE,
            codes::PEER_RANGE_UNSUPPORTED,
            codes::PEER_UPSTREAM_RESOLUTION_FAILED,
            codes::PEER_UPSTREAM_FETCH_FAILED,
            codes::PKG_NOT_FOUND,
            codes::PKG_VERSION_NOT_FOUND,
            codes::PKG_PACKUMENT_INVALID,
            codes::PKG_PACKAGE_JSON_NOT_FOUND,
            codes::PKG_PACKAGE_JSON_INVALID,
            codes::PKG_IO_ERROR,
        ];

        for code in all_codes {
            assert!(
                code.chars().all(|c| c.is_uppercase() || c == '_'),
                "Error code '{code}' should be SCREAMING_SNAKE_CASE"
            );
        }
    }
}
