//! Pricing configuration persistence
//!
//! The config record maps semantic roles (length/width/height/weight/price)
//! to concrete cell addresses in a stored template workbook. Persistence is
//! delegated to two collaborator traits: a row-store for the record and an
//! object store for the workbook bytes. This module only shapes requests and
//! caches the last-loaded record in memory.

use std::fs;
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::content_hash;

/// The persisted pricing configuration record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Object-store path of the uploaded template workbook
    pub storage_path: String,
    /// Original file name of the uploaded template
    pub file_name: String,
    /// Worksheet holding the input and output cells
    pub sheet_name: String,
    /// Cell receiving the part length
    pub length_cell: String,
    /// Cell receiving the part width
    pub width_cell: String,
    /// Cell receiving the part height
    pub height_cell: String,
    /// Cell receiving the part weight
    pub weight_cell: String,
    /// Cell holding the computed price (formula or static value)
    pub price_cell: String,
    /// Hex SHA-256 of the stored workbook bytes
    pub workbook_hash: String,
}

/// The user-editable part of a configuration, without storage bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDraft {
    pub sheet_name: String,
    pub length_cell: String,
    pub width_cell: String,
    pub height_cell: String,
    pub weight_cell: String,
    pub price_cell: String,
}

/// An uploaded template file
#[derive(Debug, Clone)]
pub struct TemplateFile {
    /// Original file name
    pub file_name: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

/// Row-store collaborator holding the single config record per owner
pub trait ConfigRepository {
    /// Load the stored record, if any
    fn load(&self) -> Result<Option<PricingConfig>, ConfigError>;
    /// Store the record, replacing any prior one
    fn store(&mut self, config: &PricingConfig) -> Result<(), ConfigError>;
    /// Delete the record; deleting an absent record is not an error
    fn delete(&mut self) -> Result<(), ConfigError>;
}

/// Object-store collaborator holding workbook blobs by path
pub trait BlobStore {
    /// Store bytes at the given path, replacing any prior blob
    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Fetch the bytes at the given path
    fn get(&self, path: &str) -> Result<Vec<u8>, ConfigError>;
    /// Delete the blob at the given path; absent blobs are not an error
    fn delete(&mut self, path: &str) -> Result<(), ConfigError>;
}

/// Config store over injected persistence collaborators
///
/// Caches the last-loaded record so repeated calculations skip the row-store
/// round-trip.
pub struct ConfigStore<R: ConfigRepository, B: BlobStore> {
    repository: R,
    blobs: B,
    cached: Option<PricingConfig>,
    loaded: bool,
}

impl<R: ConfigRepository, B: BlobStore> ConfigStore<R, B> {
    /// Create a store over the given collaborators
    pub fn new(repository: R, blobs: B) -> Self {
        Self {
            repository,
            blobs,
            cached: None,
            loaded: false,
        }
    }

    /// The active config, loading it from the repository on first access
    pub fn get(&mut self) -> Result<Option<&PricingConfig>, ConfigError> {
        if !self.loaded {
            self.cached = self.repository.load()?;
            self.loaded = true;
        }
        Ok(self.cached.as_ref())
    }

    /// Whether an active config exists
    pub fn is_configured(&mut self) -> Result<bool, ConfigError> {
        Ok(self.get()?.is_some())
    }

    /// Save a configuration
    ///
    /// With a file: uploads the workbook blob, records its content hash, and
    /// replaces the prior record and blob. Without a file: keeps the stored
    /// workbook reference and only updates the cell mapping; fails when no
    /// template was ever uploaded.
    pub fn set(
        &mut self,
        draft: ConfigDraft,
        file: Option<TemplateFile>,
    ) -> Result<PricingConfig, ConfigError> {
        let previous = self.get()?.cloned();

        let config = match file {
            Some(file) => {
                let hash = content_hash(&file.data);
                let storage_path = format!("templates/{}", hash);
                self.blobs.put(&storage_path, &file.data)?;

                // Old blob goes away once the new one is in place
                if let Some(prev) = &previous {
                    if prev.storage_path != storage_path {
                        self.blobs.delete(&prev.storage_path)?;
                    }
                }

                debug!("stored template {} at {}", file.file_name, storage_path);
                PricingConfig {
                    storage_path,
                    file_name: file.file_name,
                    sheet_name: draft.sheet_name,
                    length_cell: draft.length_cell,
                    width_cell: draft.width_cell,
                    height_cell: draft.height_cell,
                    weight_cell: draft.weight_cell,
                    price_cell: draft.price_cell,
                    workbook_hash: hash,
                }
            }
            None => {
                let previous = previous.ok_or(ConfigError::MissingTemplate)?;
                PricingConfig {
                    sheet_name: draft.sheet_name,
                    length_cell: draft.length_cell,
                    width_cell: draft.width_cell,
                    height_cell: draft.height_cell,
                    weight_cell: draft.weight_cell,
                    price_cell: draft.price_cell,
                    ..previous
                }
            }
        };

        self.repository.store(&config)?;
        self.cached = Some(config.clone());
        self.loaded = true;
        Ok(config)
    }

    /// Remove the record and its stored workbook
    pub fn clear(&mut self) -> Result<(), ConfigError> {
        if let Some(config) = self.get()?.cloned() {
            self.blobs.delete(&config.storage_path)?;
        }
        self.repository.delete()?;
        self.cached = None;
        self.loaded = true;
        Ok(())
    }

    /// Fetch the stored workbook bytes for a config
    pub fn workbook_bytes(&self, config: &PricingConfig) -> Result<Vec<u8>, ConfigError> {
        self.blobs.get(&config.storage_path)
    }

    /// Drop the in-memory record cache; the next `get` reloads from storage
    pub fn invalidate(&mut self) {
        self.cached = None;
        self.loaded = false;
    }
}

// === In-memory collaborators (tests, single-process use) ===

/// In-memory config repository
#[derive(Debug, Default)]
pub struct MemoryRepository {
    record: Option<PricingConfig>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigRepository for MemoryRepository {
    fn load(&self) -> Result<Option<PricingConfig>, ConfigError> {
        Ok(self.record.clone())
    }

    fn store(&mut self, config: &PricingConfig) -> Result<(), ConfigError> {
        self.record = Some(config.clone());
        Ok(())
    }

    fn delete(&mut self) -> Result<(), ConfigError> {
        self.record = None;
        Ok(())
    }
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: AHashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.blobs.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, ConfigError> {
        self.blobs
            .get(path)
            .cloned()
            .ok_or_else(|| ConfigError::Storage(format!("no blob at {}", path)))
    }

    fn delete(&mut self, path: &str) -> Result<(), ConfigError> {
        self.blobs.remove(path);
        Ok(())
    }
}

// === File-backed collaborators (CLI) ===

/// Config repository backed by a JSON file
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<PricingConfig>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(Some(config))
    }

    fn store(&mut self, config: &PricingConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    fn delete(&mut self) -> Result<(), ConfigError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Blob store backed by a directory on disk
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        // Storage paths are forward-slash separated
        let mut full = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty() && *p != "..") {
            full.push(part);
        }
        full
    }
}

impl BlobStore for FsBlobStore {
    fn put(&mut self, path: &str, data: &[u8]) -> Result<(), ConfigError> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full, data)?;
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, ConfigError> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| {
            ConfigError::Storage(format!("cannot read blob at {}: {}", full.display(), e))
        })
    }

    fn delete(&mut self, path: &str) -> Result<(), ConfigError> {
        let full = self.resolve(path);
        if full.exists() {
            fs::remove_file(full)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft() -> ConfigDraft {
        ConfigDraft {
            sheet_name: "Prijzen".to_string(),
            length_cell: "B1".to_string(),
            width_cell: "B2".to_string(),
            height_cell: "B3".to_string(),
            weight_cell: "B4".to_string(),
            price_cell: "D67".to_string(),
        }
    }

    fn file(data: &[u8]) -> TemplateFile {
        TemplateFile {
            file_name: "template.xlsx".to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_set_uploads_blob_and_records_hash() {
        let mut store = ConfigStore::new(MemoryRepository::new(), MemoryBlobStore::new());
        assert!(!store.is_configured().unwrap());

        let config = store.set(draft(), Some(file(b"workbook bytes"))).unwrap();
        assert_eq!(config.workbook_hash, content_hash(b"workbook bytes"));
        assert_eq!(store.workbook_bytes(&config).unwrap(), b"workbook bytes");
        assert!(store.is_configured().unwrap());
    }

    #[test]
    fn test_replacing_file_deletes_old_blob() {
        let mut store = ConfigStore::new(MemoryRepository::new(), MemoryBlobStore::new());
        store.set(draft(), Some(file(b"first"))).unwrap();
        store.set(draft(), Some(file(b"second"))).unwrap();

        assert_eq!(store.blobs.len(), 1);
        let config = store.get().unwrap().unwrap();
        assert_eq!(config.workbook_hash, content_hash(b"second"));
    }

    #[test]
    fn test_update_without_file_keeps_stored_workbook() {
        let mut store = ConfigStore::new(MemoryRepository::new(), MemoryBlobStore::new());
        let first = store.set(draft(), Some(file(b"workbook"))).unwrap();

        let mut new_draft = draft();
        new_draft.price_cell = "L17".to_string();
        let updated = store.set(new_draft, None).unwrap();

        assert_eq!(updated.price_cell, "L17");
        assert_eq!(updated.storage_path, first.storage_path);
        assert_eq!(updated.workbook_hash, first.workbook_hash);
    }

    #[test]
    fn test_update_without_file_requires_prior_upload() {
        let mut store = ConfigStore::new(MemoryRepository::new(), MemoryBlobStore::new());
        assert!(matches!(
            store.set(draft(), None),
            Err(ConfigError::MissingTemplate)
        ));
    }

    #[test]
    fn test_clear_removes_record_and_blob() {
        let mut store = ConfigStore::new(MemoryRepository::new(), MemoryBlobStore::new());
        store.set(draft(), Some(file(b"workbook"))).unwrap();
        store.clear().unwrap();

        assert!(!store.is_configured().unwrap());
        assert!(store.blobs.is_empty());
    }

    #[test]
    fn test_json_file_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = JsonFileRepository::new(dir.path().join("config.json"));
        assert_eq!(repo.load().unwrap(), None);

        let config = PricingConfig {
            storage_path: "templates/abc".to_string(),
            file_name: "t.xlsx".to_string(),
            sheet_name: "Prijzen".to_string(),
            length_cell: "B1".to_string(),
            width_cell: "B2".to_string(),
            height_cell: "B3".to_string(),
            weight_cell: "B4".to_string(),
            price_cell: "D67".to_string(),
            workbook_hash: "abc".to_string(),
        };
        repo.store(&config).unwrap();
        assert_eq!(repo.load().unwrap(), Some(config));

        repo.delete().unwrap();
        assert_eq!(repo.load().unwrap(), None);
    }

    #[test]
    fn test_fs_blob_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut blobs = FsBlobStore::new(dir.path());

        blobs.put("templates/abc", b"data").unwrap();
        assert_eq!(blobs.get("templates/abc").unwrap(), b"data");

        blobs.delete("templates/abc").unwrap();
        assert!(blobs.get("templates/abc").is_err());
        blobs.delete("templates/abc").unwrap(); // idempotent
    }
}
