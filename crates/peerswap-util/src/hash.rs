use std::fs::File;
use std::io;
use std::path::Path;

/// Separator mixed between hashed fields so `("ab", "c")` and `("a", "bc")`
/// never collide.
const FIELD_SEPARATOR: u8 = 0x1f;

/// Hex BLAKE3 digest of a file's contents, read incrementally.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn blake3_file(path: &Path) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(File::open(path)?)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash an ordered list of string fields, returning the hex-encoded digest.
///
/// Used for identity fingerprints: the same fields in the same order always
/// produce the same digest, across processes and platforms.
#[must_use]
pub fn blake3_fields(fields: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(&[FIELD_SEPARATOR]);
        }
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_blake3_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        let hash = blake3_file(file.path()).unwrap();

        // Known BLAKE3 hash of "hello world"
        assert_eq!(
            hash,
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_blake3_file_not_found() {
        let result = blake3_file(Path::new("/nonexistent/file.tgz"));
        assert!(result.is_err());
    }

    #[test]
    fn test_blake3_fields_single_matches_plain_hash() {
        assert_eq!(
            blake3_fields(&["hello world"]),
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_blake3_fields_deterministic() {
        assert_eq!(
            blake3_fields(&["types", "node"]),
            blake3_fields(&["types", "node"])
        );
    }

    #[test]
    fn test_blake3_fields_boundaries_matter() {
        assert_ne!(blake3_fields(&["ab", "c"]), blake3_fields(&["a", "bc"]));
        assert_ne!(blake3_fields(&["", "react"]), blake3_fields(&["react"]));
    }
}
