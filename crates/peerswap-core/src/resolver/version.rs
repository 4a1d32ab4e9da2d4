//! npm-style version range matching on top of `semver`.
//!
//! `semver` understands Cargo requirements; npm ranges additionally allow:
//! - OR ranges: `^1.0.0 || ^2.0.0`
//! - hyphen ranges: `1.0.0 - 2.0.0`
//! - x-ranges: `1.x`, `1.2.x`, `*`
//! - space-separated comparators: `>= 2.1.2 < 3.0.0`

use crate::error::PeerSwapError;
use semver::{Version, VersionReq};

/// Pick the highest version in `versions` that satisfies `range`.
///
/// An exact version string is matched literally first, so versions that
/// only differ in build metadata still resolve to what was asked for.
#[must_use]
pub fn max_satisfying<'a>(versions: &[&'a str], range: &str) -> Option<&'a str> {
    let range = range.trim();
    if let Some(exact) = versions.iter().find(|v| **v == range) {
        return Some(exact);
    }

    let reqs = parse_npm_range(range).ok()?;

    let mut best: Option<(Version, &'a str)> = None;
    for raw in versions {
        let Ok(version) = Version::parse(raw) else {
            continue;
        };
        if !reqs.iter().any(|req| req.matches(&version)) {
            continue;
        }
        if best.as_ref().map_or(true, |(current, _)| version > *current) {
            best = Some((version, raw));
        }
    }

    best.map(|(_, raw)| raw)
}

/// Parse an npm range into its `||` alternatives.
///
/// Alternatives that fail to parse are skipped as long as one survives.
///
/// # Errors
/// Returns `UnsupportedRange` if no alternative parses.
pub fn parse_npm_range(range: &str) -> Result<Vec<VersionReq>, PeerSwapError> {
    let reqs: Vec<VersionReq> = range
        .split("||")
        .map(str::trim)
        .filter_map(|alt| VersionReq::parse(&to_cargo_syntax(alt)).ok())
        .collect();

    if reqs.is_empty() {
        return Err(PeerSwapError::UnsupportedRange {
            range: range.to_string(),
        });
    }
    Ok(reqs)
}

/// Rewrite one npm alternative into `semver`'s comma-separated syntax.
fn to_cargo_syntax(alt: &str) -> String {
    if alt.is_empty() || matches!(alt, "*" | "x" | "X") {
        return "*".to_string();
    }

    if let Some((low, high)) = alt.split_once(" - ") {
        return format!(">={}, <={}", low.trim(), high.trim());
    }

    // Operators may be separated from their version: ">= 1.2.3 < 2"
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in alt.split_whitespace() {
        if token.chars().any(|c| c.is_ascii_digit() || c == '*') {
            comparators.push(expand_x_range(&format!("{pending_op}{token}")));
            pending_op.clear();
        } else {
            pending_op.push_str(token);
        }
    }

    // A dangling operator or no version at all: let semver reject it as-is
    if comparators.is_empty() || !pending_op.is_empty() {
        return alt.to_string();
    }
    comparators.join(", ")
}

/// `1.x` → `>=1.0.0, <2.0.0`, `1.2.x` → `>=1.2.0, <1.3.0`.
///
/// A component with no successor leaves the comparator as written.
fn expand_x_range(comparator: &str) -> String {
    let parts: Vec<&str> = comparator.split('.').collect();
    let is_wild = |p: &str| matches!(p, "x" | "X" | "*");
    let major_range = |major: &str| -> Option<String> {
        let m = major.parse::<u64>().ok()?;
        Some(format!(">={m}.0.0, <{}.0.0", m.checked_add(1)?))
    };

    let expanded = match parts.as_slice() {
        [major, minor] if is_wild(minor) => major_range(*major),
        [major, minor, patch] if is_wild(minor) && is_wild(patch) => major_range(*major),
        [major, minor, patch] if is_wild(patch) => {
            match (major.parse::<u64>(), minor.parse::<u64>()) {
                (Ok(m), Ok(n)) => n
                    .checked_add(1)
                    .map(|next| format!(">={m}.{n}.0, <{m}.{next}.0")),
                _ => None,
            }
        }
        _ => None,
    };
    expanded.unwrap_or_else(|| comparator.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSIONS: &[&str] = &[
        "1.0.0",
        "1.0.5",
        "1.5.0",
        "2.0.0-beta.1",
        "2.0.0",
        "2.1.2",
        "2.5.0",
        "3.0.0",
    ];

    #[test]
    fn test_exact() {
        assert_eq!(max_satisfying(VERSIONS, "2.0.0"), Some("2.0.0"));
        assert_eq!(max_satisfying(VERSIONS, "2.0.0-beta.1"), Some("2.0.0-beta.1"));
    }

    #[test]
    fn test_caret_and_tilde() {
        assert_eq!(max_satisfying(VERSIONS, "^1.0.0"), Some("1.5.0"));
        assert_eq!(max_satisfying(VERSIONS, "~1.0.0"), Some("1.0.5"));
        assert_eq!(max_satisfying(VERSIONS, "^2"), Some("2.5.0"));
    }

    #[test]
    fn test_wildcards() {
        assert_eq!(max_satisfying(VERSIONS, "*"), Some("3.0.0"));
        assert_eq!(max_satisfying(VERSIONS, ""), Some("3.0.0"));
        assert_eq!(max_satisfying(VERSIONS, "1.x"), Some("1.5.0"));
        assert_eq!(max_satisfying(VERSIONS, "1.0.x"), Some("1.0.5"));
    }

    #[test]
    fn test_wildcard_at_numeric_limit() {
        assert_eq!(max_satisfying(VERSIONS, "18446744073709551615.x"), None);
        assert_eq!(max_satisfying(VERSIONS, "1.18446744073709551615.x"), None);
        assert_eq!(
            expand_x_range("18446744073709551615.x"),
            "18446744073709551615.x"
        );
        assert_eq!(
            expand_x_range("1.18446744073709551615.x"),
            "1.18446744073709551615.x"
        );
    }

    #[test]
    fn test_prerelease_excluded_from_caret() {
        assert_eq!(max_satisfying(&["1.0.0", "2.0.0-beta.1"], "^1 || ^2"), Some("1.0.0"));
    }

    #[test]
    fn test_or_range_picks_highest() {
        assert_eq!(max_satisfying(VERSIONS, "^1.0.0 || ^2.0.0"), Some("2.5.0"));
        assert_eq!(max_satisfying(VERSIONS, "^1.0.0||^3.0.0"), Some("3.0.0"));
    }

    #[test]
    fn test_hyphen_range() {
        assert_eq!(max_satisfying(VERSIONS, "1.0.0 - 2.0.0"), Some("2.0.0"));
    }

    #[test]
    fn test_space_separated_comparators() {
        assert_eq!(max_satisfying(VERSIONS, ">= 2.1.2 < 3.0.0"), Some("2.5.0"));
        assert_eq!(max_satisfying(VERSIONS, ">=2.1.2 <2.5.0"), Some("2.1.2"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(max_satisfying(VERSIONS, "^4.0.0"), None);
        assert_eq!(max_satisfying(VERSIONS, "not-a-range!!!"), None);
    }

    #[test]
    fn test_parse_npm_range_errors() {
        assert!(parse_npm_range("^1 || garbage").is_ok());
        let err = parse_npm_range("garbage").unwrap_err();
        assert!(matches!(err, PeerSwapError::UnsupportedRange { .. }));
    }
}
