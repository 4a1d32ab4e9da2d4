//! Peer dependency rewriting.
//!
//! The engine is a pure, single-pass transform over owned values: it never
//! touches the package a resolver handed out, and it keeps no state between
//! calls.

use crate::codec::{PeerEdit, RangeCodec};
use crate::error::PeerSwapError;
use crate::ident::{IdentityRegistry, Locator};
use crate::manifest::DeclaredRange;
use crate::package::Package;
use crate::range::{change_source, extract_source, is_unspecified_source};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PeerRewriteEngine {
    codec: RangeCodec,
}

impl PeerRewriteEngine {
    #[must_use]
    pub fn new(registry: Arc<dyn IdentityRegistry>) -> Self {
        Self {
            codec: RangeCodec::new(registry),
        }
    }

    #[must_use]
    pub fn codec(&self) -> &RangeCodec {
        &self.codec
    }

    /// Fill the source of a freshly declared tagged range with the range the
    /// consuming manifest declares for the same package.
    #[must_use]
    pub fn bind_requested_range(&self, requested_range: &str, declared: &DeclaredRange) -> String {
        change_source(requested_range, declared.as_source())
    }

    /// The range to hand to the real resolver.
    ///
    /// Uses the embedded source unless it is unspecified, in which case the
    /// sibling resolution's range is used instead.
    ///
    /// # Errors
    /// Returns `UnresolvableSource` if the source is unspecified and no
    /// sibling was supplied.
    pub fn resolve_candidate_range(
        &self,
        tagged_range: &str,
        sibling: Option<&str>,
    ) -> Result<String, PeerSwapError> {
        if !is_unspecified_source(tagged_range) {
            return Ok(extract_source(tagged_range));
        }

        sibling
            .map(str::to_string)
            .ok_or_else(|| PeerSwapError::UnresolvableSource {
                range: tagged_range.to_string(),
            })
    }

    /// Clone `package` under `result_identity` and apply `edits` to its peer
    /// dependencies, in order.
    ///
    /// When two edits target the same ident, the later one wins.
    #[must_use]
    pub fn rewrite_peer_dependencies(
        &self,
        package: &Package,
        edits: &[PeerEdit],
        result_identity: &Locator,
    ) -> Package {
        let mut rewritten = package.clone();
        rewritten.locator = result_identity.clone();

        for edit in edits {
            rewritten
                .peer_dependencies
                .remove(edit.source.ident().hash());
            if let Some(target) = &edit.target {
                rewritten.add_peer_dependency(target.clone());
            }
        }

        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Blake3Registry;

    fn engine() -> PeerRewriteEngine {
        PeerRewriteEngine::new(Arc::new(Blake3Registry))
    }

    fn package(peers: &[&str]) -> Package {
        let registry = Blake3Registry;
        let mut pkg = Package::new(
            registry.parse_locator("plugin@npm:1.0.0").unwrap(),
            Some("1.0.0".to_string()),
        );
        for peer in peers {
            pkg.add_peer_dependency(registry.parse_descriptor(peer).unwrap());
        }
        pkg
    }

    fn edits(engine: &PeerRewriteEngine, selector: &str) -> Vec<PeerEdit> {
        engine.codec().decode_edits(selector).unwrap()
    }

    fn result_locator() -> Locator {
        Blake3Registry
            .parse_locator("plugin@peer-edit:npm%3A1.0.0#eslint@*")
            .unwrap()
    }

    #[test]
    fn test_bind_requested_range() {
        let engine = engine();
        let bound = engine.bind_requested_range(
            "proto:#eslint@unknown:typescript-eslint@^8",
            &DeclaredRange::Dev("npm:9.0.0".to_string()),
        );
        assert_eq!(bound, "proto:npm%3A9.0.0#eslint@unknown:typescript-eslint@^8");
    }

    #[test]
    fn test_bind_unspecified_keeps_empty_source() {
        let bound = engine().bind_requested_range("proto:#eslint@*", &DeclaredRange::Unspecified);
        assert_eq!(bound, "proto:#eslint@*");
        assert!(is_unspecified_source(&bound));
    }

    #[test]
    fn test_candidate_range_uses_embedded_source() {
        let range = engine()
            .resolve_candidate_range("proto:npm%3A9.0.0#eslint@*", Some("npm:1.0.0"))
            .unwrap();
        assert_eq!(range, "npm:9.0.0");
    }

    #[test]
    fn test_candidate_range_from_sibling() {
        let range = engine()
            .resolve_candidate_range("proto:#eslint@^9", Some("npm:15.2.0"))
            .unwrap();
        assert_eq!(range, "npm:15.2.0");
    }

    #[test]
    fn test_candidate_range_unresolvable() {
        let err = engine()
            .resolve_candidate_range("proto:#eslint@^9", None)
            .unwrap_err();
        assert!(matches!(err, PeerSwapError::UnresolvableSource { .. }));
    }

    #[test]
    fn test_rewrite_replaces_peer() {
        let engine = engine();
        let original = package(&["eslint@^8.0.0", "react@^18"]);
        let rewritten = engine.rewrite_peer_dependencies(
            &original,
            &edits(&engine, "eslint@*:typescript-eslint@^8"),
            &result_locator(),
        );

        assert!(rewritten.peer_dependency("eslint").is_none());
        assert_eq!(
            rewritten.peer_dependency("typescript-eslint").unwrap().range(),
            "^8"
        );
        assert_eq!(rewritten.peer_dependency("react").unwrap().range(), "^18");
        assert_eq!(rewritten.locator, result_locator());
        assert_eq!(rewritten.version, original.version);
    }

    #[test]
    fn test_rewrite_does_not_touch_input() {
        let engine = engine();
        let original = package(&["eslint@^8.0.0"]);
        let snapshot = original.clone();
        let _ = engine.rewrite_peer_dependencies(
            &original,
            &edits(&engine, "eslint@*:-"),
            &result_locator(),
        );
        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_removal_is_idempotent() {
        let engine = engine();
        let removal = edits(&engine, "eslint@*:-");

        let once = engine.rewrite_peer_dependencies(
            &package(&["eslint@^8.0.0", "react@^18"]),
            &removal,
            &result_locator(),
        );
        assert!(once.peer_dependency("eslint").is_none());

        let twice = engine.rewrite_peer_dependencies(&once, &removal, &result_locator());
        assert!(twice.peer_dependency("eslint").is_none());
        assert_eq!(twice, once);
    }

    #[test]
    fn test_removing_absent_peer_is_noop() {
        let engine = engine();
        let original = package(&["react@^18"]);
        let rewritten = engine.rewrite_peer_dependencies(
            &original,
            &edits(&engine, "vue@*"),
            &original.locator,
        );
        assert_eq!(rewritten, original);
    }

    #[test]
    fn test_last_write_wins() {
        let engine = engine();
        let rewritten = engine.rewrite_peer_dependencies(
            &package(&["a@1", "b@1"]),
            &edits(&engine, "a@*:c@^1;b@*:c@^2"),
            &result_locator(),
        );

        assert_eq!(rewritten.peer_dependencies.len(), 1);
        assert_eq!(rewritten.peer_dependency("c").unwrap().range(), "^2");
    }

    #[test]
    fn test_later_removal_undoes_earlier_insert() {
        let engine = engine();
        let rewritten = engine.rewrite_peer_dependencies(
            &package(&["a@1"]),
            &edits(&engine, "a@*:b@^1;b@*:-"),
            &result_locator(),
        );
        assert!(rewritten.peer_dependencies.is_empty());
    }
}
