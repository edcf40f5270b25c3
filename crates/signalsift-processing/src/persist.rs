//! File helpers shared by the index and expansion caches.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::ProcessingError;

/// Outcome of reading a cache from disk.
#[derive(Debug)]
pub(crate) enum CacheLoad<T> {
    Hit(T),
    Miss,
    /// The cache exists but failed a structural check.
    Corrupt(String),
}

fn io_err(path: &Path, source: io::Error) -> ProcessingError {
    ProcessingError::CacheIo {
        path: path.display().to_string(),
        source,
    }
}

/// Write `bytes` to `path` through a sibling temp file and a rename, so a
/// crash never leaves a half-written cache behind.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ProcessingError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    fs::write(tmp, bytes).map_err(|e| io_err(tmp, e))?;
    fs::rename(tmp, path).map_err(|e| io_err(path, e))
}

/// Read a file, mapping "not found" to `Ok(None)`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ProcessingError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Delete a file; a missing file is not an error.
pub(crate) fn remove_if_exists(path: &Path) -> Result<(), ProcessingError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("nested").join("cache.json.tmp").exists());
    }

    #[test]
    fn read_optional_maps_missing_to_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_optional(&dir.path().join("absent")).unwrap().is_none());
    }

    #[test]
    fn remove_if_exists_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone");
        remove_if_exists(&path).unwrap();
        fs::write(&path, b"x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
