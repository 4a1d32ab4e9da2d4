//! Range string splitting.
//!
//! A range has the shape `(<protocol>:)?(<source>#)?<selector>`:
//!
//! - `npm:^1.0.0` → protocol `npm:`, no source, selector `^1.0.0`
//! - `peer-edit:npm%3A9.0.0#eslint@*` → protocol `peer-edit:`, source
//!   `npm:9.0.0`, selector `eslint@*`
//! - `peer-edit:#eslint@*` → protocol `peer-edit:`, empty source
//!
//! Sources are nested ranges. They are written with `%`, `#` and `:`
//! percent-escaped so they never leak into the outer grammar, and are
//! unescaped on the way back in. Unescaped sources are accepted when
//! parsing.

use std::fmt::Write as _;

/// A range split into its three parts.
///
/// When `protocol` and `source` are both absent, the selector must not begin
/// with a protocol-like `word:` prefix, otherwise it would be read back as a
/// protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeParts {
    /// Protocol including the trailing `:`.
    pub protocol: Option<String>,
    /// Nested range, unescaped. `Some("")` means an explicitly empty source.
    pub source: Option<String>,
    /// Resolver-visible remainder.
    pub selector: String,
}

/// Split a range into protocol, source and selector.
#[must_use]
pub fn parse_range(range: &str) -> RangeParts {
    let (protocol, rest) = match range.find([':', '#']) {
        Some(pos) if range.as_bytes()[pos] == b':' => {
            (Some(range[..=pos].to_string()), &range[pos + 1..])
        }
        _ => (None, range),
    };

    match rest.split_once('#') {
        Some((source, selector)) => RangeParts {
            protocol,
            source: Some(unescape(source)),
            selector: selector.to_string(),
        },
        None => RangeParts {
            protocol,
            source: None,
            selector: rest.to_string(),
        },
    }
}

/// Inverse of [`parse_range`].
#[must_use]
pub fn make_range(parts: &RangeParts) -> String {
    let mut range = String::new();
    if let Some(protocol) = &parts.protocol {
        range.push_str(protocol);
    }
    if let Some(source) = &parts.source {
        range.push_str(&escape(source, SOURCE_RESERVED));
        range.push('#');
    }
    range.push_str(&parts.selector);
    range
}

/// The nested source range, or an empty string when there is none.
#[must_use]
pub fn extract_source(range: &str) -> String {
    parse_range(range).source.unwrap_or_default()
}

/// Replace the nested source range, keeping protocol and selector.
#[must_use]
pub fn change_source(range: &str, new_source: &str) -> String {
    let parts = parse_range(range);
    make_range(&RangeParts {
        source: Some(new_source.to_string()),
        ..parts
    })
}

/// True when no real range was ever given and it must be inferred elsewhere.
#[must_use]
pub fn is_unspecified_source(range: &str) -> bool {
    parse_range(&extract_source(range)).selector.is_empty()
}

const SOURCE_RESERVED: &[char] = &['%', '#', ':'];

/// Characters that cannot appear raw inside a peer edit range.
pub(crate) const EDIT_RESERVED: &[char] = &['%', '#', ';', ':'];

/// Percent-escape every reserved character.
pub(crate) fn escape(value: &str, reserved: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if reserved.contains(&c) {
            // Reserved characters are all ASCII
            let _ = write!(out, "%{:02X}", c as u32);
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode `%XX` sequences; anything that is not a valid escape is kept as-is.
///
/// Escaped bytes that do not form UTF-8 are kept as their original `%XX` text.
pub(crate) fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(value.len());
    let mut literal = 0;
    let mut i = 0;
    while i < bytes.len() {
        let run_start = i;
        let mut decoded = Vec::new();
        while let Some(byte) = escaped_byte(bytes, i) {
            decoded.push(byte);
            i += 3;
        }
        if decoded.is_empty() {
            i += 1;
            continue;
        }
        out.push_str(&value[literal..run_start]);
        push_escape_run(&mut out, &value[run_start..i], &decoded);
        literal = i;
    }
    out.push_str(&value[literal..]);
    out
}

/// The byte encoded by a `%XX` escape starting at `i`.
fn escaped_byte(bytes: &[u8], i: usize) -> Option<u8> {
    if bytes.get(i) != Some(&b'%') {
        return None;
    }
    let hi = hex_value(*bytes.get(i + 1)?)?;
    let lo = hex_value(*bytes.get(i + 2)?)?;
    Some(hi * 16 + lo)
}

/// Append the decoded run, falling back to `text` (three bytes per escape)
/// wherever the bytes are not UTF-8.
fn push_escape_run(out: &mut String, text: &str, mut decoded: &[u8]) {
    let mut offset = 0;
    while !decoded.is_empty() {
        match std::str::from_utf8(decoded) {
            Ok(valid) => {
                out.push_str(valid);
                return;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                let invalid = e.error_len().unwrap_or(decoded.len() - valid);
                if let Ok(prefix) = std::str::from_utf8(&decoded[..valid]) {
                    out.push_str(prefix);
                }
                let kept = offset + valid;
                out.push_str(&text[kept * 3..(kept + invalid) * 3]);
                offset = kept + invalid;
                decoded = &decoded[valid + invalid..];
            }
        }
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
