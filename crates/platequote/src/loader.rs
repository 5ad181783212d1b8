//! Template loading and caching
//!
//! Loads a pricing template workbook from a URL or raw bytes and keeps the
//! parsed result in a cache keyed by URL or content hash. There is no
//! automatic eviction: one template is active per session, and
//! [`TemplateLoader::clear_cache`] is the only way to drop entries.

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use log::{debug, warn};
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};

use crate::error::LoadError;
use platequote_core::Workbook;
use platequote_xlsx::XlsxReader;

/// Download timeout for the template URL
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a template workbook comes from
#[derive(Debug, Clone)]
pub enum WorkbookSource {
    /// Fetch from a URL (no authentication)
    Url(String),
    /// Raw bytes of an uploaded file
    Bytes {
        /// Original file name, for diagnostics
        name: String,
        /// Raw file contents
        data: Vec<u8>,
    },
}

/// Hex-encoded SHA-256 of raw workbook bytes
///
/// Identifies a template version: the cache key for uploaded files and the
/// `workbook_hash` stored alongside the pricing config.
pub fn content_hash(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Loads and caches parsed template workbooks
///
/// The cache hands out `Arc<Workbook>` so concurrent calculations can share
/// one parsed template; the workbook itself is never mutated after parsing.
pub struct TemplateLoader {
    cache: AHashMap<String, Arc<Workbook>>,
    client: OnceCell<reqwest::blocking::Client>,
}

impl TemplateLoader {
    /// Create a loader with an empty cache
    pub fn new() -> Self {
        Self {
            cache: AHashMap::new(),
            client: OnceCell::new(),
        }
    }

    /// Load a workbook, returning the cached parse when available
    pub fn load(&mut self, source: &WorkbookSource) -> Result<Arc<Workbook>, LoadError> {
        match source {
            WorkbookSource::Url(url) => {
                if let Some(workbook) = self.cache.get(url) {
                    debug!("template cache hit for {}", url);
                    return Ok(Arc::clone(workbook));
                }
                let data = self.fetch_url(url)?;
                let workbook = Arc::new(Self::parse(&data)?);
                self.cache.insert(url.clone(), Arc::clone(&workbook));
                Ok(workbook)
            }
            WorkbookSource::Bytes { name, data } => {
                let hash = content_hash(data);
                if let Some(workbook) = self.cache.get(&hash) {
                    debug!("template cache hit for uploaded file {}", name);
                    return Ok(Arc::clone(workbook));
                }
                let workbook = Arc::new(Self::parse(data)?);
                self.cache.insert(hash, Arc::clone(&workbook));
                Ok(workbook)
            }
        }
    }

    /// Look up a cached workbook by its cache key (URL or content hash)
    pub fn cached(&self, key: &str) -> Option<Arc<Workbook>> {
        self.cache.get(key).map(Arc::clone)
    }

    /// Drop every cached workbook
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached workbooks
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    fn parse(data: &[u8]) -> Result<Workbook, LoadError> {
        let mut workbook = XlsxReader::read_bytes(data)?;
        workbook.set_content_hash(content_hash(data));
        Ok(workbook)
    }

    /// Download the template, retrying once on failure
    ///
    /// The template fetch is a hard dependency for every calculation, so a
    /// single transient failure should not surface to the user.
    fn fetch_url(&self, url: &str) -> Result<Vec<u8>, LoadError> {
        let client = self.client.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(DOWNLOAD_TIMEOUT)
                .build()
        })?;

        match Self::try_fetch(client, url) {
            Ok(data) => Ok(data),
            Err(first) => {
                warn!("template download from {} failed ({}), retrying", url, first);
                Self::try_fetch(client, url)
            }
        }
    }

    fn try_fetch(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, LoadError> {
        let response = client.get(url).send()?;
        if !response.status().is_success() {
            return Err(LoadError::Fetch(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        Ok(response.bytes()?.to_vec())
    }
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash(b"template bytes");
        let b = content_hash(b"template bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash(b"other bytes"));
    }

    #[test]
    fn test_unparseable_bytes_fail() {
        let mut loader = TemplateLoader::new();
        let source = WorkbookSource::Bytes {
            name: "bogus.xlsx".to_string(),
            data: b"not a spreadsheet".to_vec(),
        };
        assert!(loader.load(&source).is_err());
        assert_eq!(loader.cache_len(), 0);
    }
}
