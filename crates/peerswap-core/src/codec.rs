//! Peer edit encoding and tagged range decoding.
//!
//! A tagged range carries the real range as its source and a `;`-separated
//! list of peer edits as its selector:
//!
//! ```text
//! peer-edit:npm%3A9.0.0#eslint@*:typescript-eslint@^8;react@*:-
//! ```
//!
//! Each edit is `<source descriptor>(:<target descriptor>)?`. A missing,
//! empty or `-` target means the peer dependency is removed outright. Raw
//! strings only exist at this boundary; everything past it works on
//! [`TaggedRange`] and [`PeerEdit`].

use crate::error::PeerSwapError;
use crate::ident::{Descriptor, IdentityRegistry};
use crate::range::{self, escape, unescape, RangeParts, EDIT_RESERVED};
use std::sync::Arc;

/// Target written for a removal-only edit.
pub const NO_TARGET: &str = "-";

/// Range placeholder meaning "whatever range the package declares".
pub const UNKNOWN_RANGE: &str = "unknown";

/// What [`UNKNOWN_RANGE`] decodes to.
pub const WILDCARD_RANGE: &str = "*";

const EDIT_SEPARATOR: char = ';';
const TARGET_SEPARATOR: char = ':';

/// Remove the peer dependency on `source`, optionally replacing it with
/// `target` (which carries its own requested range).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEdit {
    pub source: Descriptor,
    pub target: Option<Descriptor>,
}

impl PeerEdit {
    #[must_use]
    pub fn replace(source: Descriptor, target: Descriptor) -> Self {
        Self {
            source,
            target: Some(target),
        }
    }

    #[must_use]
    pub fn remove(source: Descriptor) -> Self {
        Self {
            source,
            target: None,
        }
    }
}

/// A decoded tagged range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRange {
    protocol: String,
    source: String,
    edits: Vec<PeerEdit>,
}

impl TaggedRange {
    #[must_use]
    pub fn new(protocol: impl Into<String>, source: impl Into<String>, edits: Vec<PeerEdit>) -> Self {
        Self {
            protocol: protocol.into(),
            source: source.into(),
            edits,
        }
    }

    /// Protocol including its trailing `:`.
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// The real range to resolve with; empty when unspecified.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn edits(&self) -> &[PeerEdit] {
        &self.edits
    }

    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        range::parse_range(&self.source).selector.is_empty()
    }

    /// Copy with another source range.
    #[must_use]
    pub fn with_source(&self, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..self.clone()
        }
    }
}

/// Converts between range strings and [`TaggedRange`] / [`PeerEdit`] values.
#[derive(Debug, Clone)]
pub struct RangeCodec {
    registry: Arc<dyn IdentityRegistry>,
}

impl RangeCodec {
    #[must_use]
    pub fn new(registry: Arc<dyn IdentityRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<dyn IdentityRegistry> {
        &self.registry
    }

    /// Decode a full tagged range.
    ///
    /// # Errors
    /// Returns `MalformedEdit` if any edit segment fails to parse.
    pub fn decode(&self, tagged: &str) -> Result<TaggedRange, PeerSwapError> {
        let parts = range::parse_range(tagged);
        Ok(TaggedRange {
            protocol: parts.protocol.unwrap_or_default(),
            source: parts.source.unwrap_or_default(),
            edits: self.decode_edits(&parts.selector)?,
        })
    }

    /// Encode a tagged range back into its wire form.
    #[must_use]
    pub fn encode(&self, tagged: &TaggedRange) -> String {
        range::make_range(&RangeParts {
            protocol: (!tagged.protocol.is_empty()).then(|| tagged.protocol.clone()),
            source: Some(tagged.source.clone()),
            selector: self.encode_edits(&tagged.edits),
        })
    }

    /// Join edits as `<source>:<target>` segments separated by `;`.
    #[must_use]
    pub fn encode_edits(&self, edits: &[PeerEdit]) -> String {
        let segments: Vec<String> = edits
            .iter()
            .map(|edit| {
                let target = edit
                    .target
                    .as_ref()
                    .map_or_else(|| NO_TARGET.to_string(), encode_descriptor);
                format!(
                    "{}{TARGET_SEPARATOR}{target}",
                    encode_descriptor(&edit.source)
                )
            })
            .collect();
        segments.join(&EDIT_SEPARATOR.to_string())
    }

    /// Split a selector back into edits. An empty selector has no edits.
    ///
    /// # Errors
    /// Returns `MalformedEdit` for a segment whose left half is not a valid
    /// descriptor, or whose right half is neither a sentinel nor a valid
    /// descriptor.
    pub fn decode_edits(&self, selector: &str) -> Result<Vec<PeerEdit>, PeerSwapError> {
        if selector.is_empty() {
            return Ok(Vec::new());
        }

        selector
            .split(EDIT_SEPARATOR)
            .map(|segment| self.decode_segment(segment))
            .collect()
    }

    fn decode_segment(&self, segment: &str) -> Result<PeerEdit, PeerSwapError> {
        let (left, right) = match segment.split_once(TARGET_SEPARATOR) {
            Some((left, right)) => (left, Some(right)),
            None => (segment, None),
        };

        let source = self
            .decode_descriptor(left)
            .map_err(|e| PeerSwapError::malformed_edit(segment, e.to_string()))?;

        let target = match right {
            None | Some("" | NO_TARGET) => None,
            Some(right) => Some(
                self.decode_descriptor(right)
                    .map_err(|e| PeerSwapError::malformed_edit(segment, e.to_string()))?,
            ),
        };

        Ok(PeerEdit { source, target })
    }

    fn decode_descriptor(&self, input: &str) -> Result<Descriptor, PeerSwapError> {
        let descriptor = self.registry.parse_descriptor(input)?;
        let range = unescape(descriptor.range());
        if range == UNKNOWN_RANGE {
            return Ok(descriptor.with_range(WILDCARD_RANGE));
        }
        Ok(descriptor.with_range(range))
    }
}

fn encode_descriptor(descriptor: &Descriptor) -> String {
    if descriptor.range().is_empty() {
        descriptor.ident().to_string()
    } else {
        format!(
            "{}@{}",
            descriptor.ident(),
            escape(descriptor.range(), EDIT_RESERVED)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Blake3Registry;

    fn codec() -> RangeCodec {
        RangeCodec::new(Arc::new(Blake3Registry))
    }

    fn desc(input: &str) -> Descriptor {
        Blake3Registry.parse_descriptor(input).unwrap()
    }

    #[test]
    fn test_decode_single_replacement() {
        let edits = codec()
            .decode_edits("eslint@unknown:typescript-eslint@^8")
            .unwrap();
        assert_eq!(
            edits,
            vec![PeerEdit::replace(desc("eslint@*"), desc("typescript-eslint@^8"))]
        );
    }

    #[test]
    fn test_decode_null_target_spellings() {
        let codec = codec();
        for selector in ["react@^18", "react@^18:", "react@^18:-"] {
            let edits = codec.decode_edits(selector).unwrap();
            assert_eq!(edits, vec![PeerEdit::remove(desc("react@^18"))], "{selector}");
        }
    }

    #[test]
    fn test_decode_unknown_target_range() {
        let edits = codec().decode_edits("a@1:@scope/b@unknown").unwrap();
        assert_eq!(edits[0].target.as_ref().unwrap().range(), "*");
    }

    #[test]
    fn test_decode_keeps_non_utf8_escape_in_range() {
        let edits = codec().decode_edits("a@%FF:b@%5E1%C3").unwrap();
        assert_eq!(edits[0].source.range(), "%FF");
        assert_eq!(edits[0].target.as_ref().unwrap().range(), "^1%C3");
    }

    #[test]
    fn test_decode_implicit_empty_range() {
        let edits = codec().decode_edits("eslint:typescript-eslint").unwrap();
        assert_eq!(edits[0].source.range(), "");
        assert_eq!(edits[0].target.as_ref().unwrap().range(), "");
    }

    #[test]
    fn test_decode_multiple_in_order() {
        let edits = codec()
            .decode_edits("a@1:b@2;c@3;@s/d@4:@s/e@5")
            .unwrap();
        assert_eq!(edits.len(), 3);
        assert_eq!(edits[0].source.ident().name(), "a");
        assert!(edits[1].target.is_none());
        assert_eq!(edits[2].target.as_ref().unwrap().to_string(), "@s/e@5");
    }

    #[test]
    fn test_decode_empty_selector() {
        assert!(codec().decode_edits("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_malformed() {
        let err = codec().decode_edits("bad segment with no ident").unwrap_err();
        assert!(matches!(err, PeerSwapError::MalformedEdit { .. }));

        let codec = codec();
        assert!(codec.decode_edits(":b@1").is_err());
        assert!(codec.decode_edits("a@1;;b@2").is_err());
        assert!(codec.decode_edits("a@1:@bad").is_err());
    }

    #[test]
    fn test_encode_uses_dash_for_removal() {
        let encoded = codec().encode_edits(&[
            PeerEdit::remove(desc("react@^18")),
            PeerEdit::replace(desc("eslint@*"), desc("typescript-eslint@^8")),
        ]);
        assert_eq!(encoded, "react@^18:-;eslint@*:typescript-eslint@^8");
    }

    #[test]
    fn test_edit_round_trip() {
        let codec = codec();
        let edits = vec![
            PeerEdit::replace(desc("eslint@*"), desc("typescript-eslint@npm:^8")),
            PeerEdit::remove(desc("@types/react@>=16 <19")),
            PeerEdit::replace(desc("a"), desc("@scope/b@1 || 2")),
            PeerEdit::remove(desc("c@git#main;x")),
        ];
        let decoded = codec.decode_edits(&codec.encode_edits(&edits)).unwrap();
        assert_eq!(decoded, edits);
    }

    #[test]
    fn test_decode_full_tagged_range() {
        let tagged = codec()
            .decode("proto:npm%3A9.0.0#eslint@unknown:typescript-eslint@^8")
            .unwrap();
        assert_eq!(tagged.protocol(), "proto:");
        assert_eq!(tagged.source(), "npm:9.0.0");
        assert!(!tagged.is_unspecified());
        assert_eq!(tagged.edits().len(), 1);
    }

    #[test]
    fn test_tagged_encode_decode() {
        let codec = codec();
        let tagged = TaggedRange::new(
            "peer-edit:",
            "npm:^9",
            vec![PeerEdit::remove(desc("react@*"))],
        );
        let wire = codec.encode(&tagged);
        assert_eq!(wire, "peer-edit:npm%3A^9#react@*:-");
        assert_eq!(codec.decode(&wire).unwrap(), tagged);
    }

    #[test]
    fn test_with_source_leaves_original() {
        let tagged = codec().decode("proto:#eslint@^9").unwrap();
        assert!(tagged.is_unspecified());
        let bound = tagged.with_source("npm:15.2.0");
        assert_eq!(bound.source(), "npm:15.2.0");
        assert!(tagged.is_unspecified());
        assert_eq!(bound.edits(), tagged.edits());
    }
}
