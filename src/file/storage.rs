//! Physical file storage for CareData uploads.
//!
//! Files get a UUID-based name and are sharded into directories by the
//! first 2 characters of that UUID.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{CareError, Result};

/// Longest extension kept from an uploaded filename.
const MAX_EXTENSION_LENGTH: usize = 10;

/// File storage service for managing physical files.
///
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.pdf
/// └── cd/
///     └── cd90ab12-3456-7890-abcd-ef1234567890.png
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save content under a new UUID-based name.
    ///
    /// Returns the stored name (`UUID.ext`).
    pub fn save(&self, content: &[u8], original_name: &str) -> Result<String> {
        let stored_name = Self::generate_stored_name(original_name);
        let file_path = self.get_file_path(&stored_name)?;

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;

        Ok(stored_name)
    }

    /// Load content from storage.
    pub fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let file_path = self.get_file_path(stored_name)?;

        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CareError::NotFound(format!("file {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file from storage.
    ///
    /// Returns `false` if the file did not exist.
    pub fn delete(&self, stored_name: &str) -> Result<bool> {
        let file_path = self.get_file_path(stored_name)?;

        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists in storage. Invalid names never exist.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.get_file_path(stored_name)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Get the full path for a stored name: `{base_path}/{shard}/{stored_name}`.
    ///
    /// Fails with `CareError::Validation` unless the name is a bare `UUID.ext`.
    pub fn get_file_path(&self, stored_name: &str) -> Result<PathBuf> {
        if !Self::is_valid_stored_name(stored_name) {
            return Err(CareError::Validation(format!(
                "invalid stored file name: {stored_name}"
            )));
        }
        Ok(self.base_path.join(&stored_name[..2]).join(stored_name))
    }

    /// Check that a name looks like `UUID.ext` with an alphanumeric extension.
    pub fn is_valid_stored_name(stored_name: &str) -> bool {
        let Some((stem, ext)) = stored_name.split_once('.') else {
            return false;
        };
        Uuid::parse_str(stem).is_ok()
            && stem.len() == 36
            && !ext.is_empty()
            && ext.len() <= MAX_EXTENSION_LENGTH
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
    }

    /// Extract a safe, lowercase extension from a filename.
    ///
    /// Returns "bin" if there is no usable extension.
    fn extract_extension(filename: &str) -> String {
        Path::new(filename)
            .extension()
            .and_then(|s| s.to_str())
            .filter(|ext| {
                !ext.is_empty()
                    && ext.len() <= MAX_EXTENSION_LENGTH
                    && ext.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Generate a new UUID-based stored name keeping the original extension.
    pub fn generate_stored_name(original_name: &str) -> String {
        let uuid = Uuid::new_v4();
        let ext = Self::extract_extension(original_name);
        format!("{uuid}.{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("files")).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("new_storage");

        assert!(!storage_path.exists());
        let storage = FileStorage::new(&storage_path).unwrap();
        assert!(storage_path.exists());
        assert_eq!(storage.base_path(), storage_path);
    }

    #[test]
    fn test_save_and_load() {
        let (storage, _temp) = create_test_storage();

        let stored_name = storage.save(b"Hello, CareData!", "report.PDF").unwrap();

        assert!(stored_name.ends_with(".pdf"));
        assert_eq!(stored_name.len(), 36 + 4);
        assert_eq!(storage.load(&stored_name).unwrap(), b"Hello, CareData!");
        assert!(storage.exists(&stored_name));
    }

    #[test]
    fn test_save_sharded() {
        let (storage, _temp) = create_test_storage();

        let stored_name = storage.save(b"x", "scan.png").unwrap();
        let path = storage.get_file_path(&stored_name).unwrap();

        let shard = path.parent().unwrap().file_name().unwrap().to_str().unwrap();
        assert_eq!(shard, &stored_name[..2]);
        assert!(path.is_file());
    }

    #[test]
    fn test_load_missing() {
        let (storage, _temp) = create_test_storage();

        let name = format!("{}.txt", Uuid::new_v4());
        assert!(matches!(storage.load(&name), Err(CareError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let (storage, _temp) = create_test_storage();

        let stored_name = storage.save(b"bye", "note.txt").unwrap();
        assert!(storage.delete(&stored_name).unwrap());
        assert!(!storage.exists(&stored_name));
        assert!(!storage.delete(&stored_name).unwrap());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let (storage, _temp) = create_test_storage();

        for name in [
            "../etc/passwd",
            "../../secret.txt",
            "ab/../../x.bin",
            "not-a-uuid.txt",
            "",
            ".",
        ] {
            assert!(
                matches!(storage.get_file_path(name), Err(CareError::Validation(_))),
                "{name}"
            );
            assert!(!storage.exists(name));
        }

        let sneaky = format!("{}.txt/../../x", Uuid::new_v4());
        assert!(storage.load(&sneaky).is_err());
    }

    #[test]
    fn test_extract_extension() {
        assert_eq!(FileStorage::extract_extension("photo.JPG"), "jpg");
        assert_eq!(FileStorage::extract_extension("archive.tar.gz"), "gz");
        assert_eq!(FileStorage::extract_extension("README"), "bin");
        assert_eq!(FileStorage::extract_extension("weird.ex t"), "bin");
        assert_eq!(FileStorage::extract_extension(".hidden"), "bin");
    }

    #[test]
    fn test_generate_stored_name_is_valid() {
        let name = FileStorage::generate_stored_name("lab-results.pdf");
        assert!(FileStorage::is_valid_stored_name(&name));
        assert_ne!(name, FileStorage::generate_stored_name("lab-results.pdf"));
    }
}
