//! File-backed durable storage.
//!
//! Each save writes a temporary file next to the target, syncs it and
//! renames it over the target, so a crash mid-write leaves the previous
//! document intact.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use super::{Storage, StorageError};

/// Storage backed by a single file.
///
/// Clone is cheap (only the path is cloned). Concurrent saves from separate
/// stores on the same path are not coordinated.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage for the file at `path`. The file does not need to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut tmp = NamedTempFile::new_in(self.directory())?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.load(), Ok(None));
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("data.json"));

        storage.save(b"first version, longer").unwrap();
        storage.save(b"second").unwrap();

        assert_eq!(storage.load(), Ok(Some(b"second".to_vec())));
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nope").join("data.json"));
        assert!(matches!(storage.save(b"{}"), Err(StorageError::Io(_))));
    }

    #[test]
    fn bare_file_name_uses_current_directory() {
        let storage = FileStorage::new("checklist_data.json");
        assert_eq!(storage.directory(), Path::new("."));
    }
}
