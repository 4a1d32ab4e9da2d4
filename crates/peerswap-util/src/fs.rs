use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` so readers only ever see the old or the new
/// contents.
///
/// The data goes to a hidden sibling file first, is synced, and is then
/// renamed over `path`. The sibling is removed if any step fails.
///
/// # Errors
/// Returns the first IO error from creating, writing, syncing or renaming.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let staging = staging_path(path);

    let written = File::create(&staging).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    match written.and_then(|()| fs::rename(&staging, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&staging);
            Err(e)
        }
    }
}

/// `<dir>/.<name>.<pid>.partial`, next to the destination so the rename
/// never crosses filesystems.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy());
    path.with_file_name(format!(".{name}.{}.partial", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("package.json");

        atomic_write(&path, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");

        atomic_write(&path, br#"{"name":"a"}"#).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"name":"a"}"#);
    }

    #[test]
    fn test_atomic_write_no_temp_left_on_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");

        atomic_write(&path, b"content").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].as_ref().unwrap().file_name().to_str().unwrap(),
            "out.json"
        );
    }

    #[test]
    fn test_atomic_write_missing_parent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(atomic_write(&path, b"x").is_err());
    }
}
