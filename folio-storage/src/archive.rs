//! In-memory archive backend.
//!
//! Builds or reads a single compressed zip container entirely in memory.
//! Writes mutate a plain entry map; the zip encoding happens once, in
//! [`ArchiveAdapter::into_zip_bytes`]. Archives carry no explicit directory
//! entries, so `exists` on a directory path is answered by prefix matching.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};

use folio_types::FileContent;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::classify::{content_kind, ContentKind};
use crate::error::{StorageError, StorageResult};
use crate::normalize_path;

/// Storage adapter backed by an in-memory zip container.
#[derive(Debug, Clone, Default)]
pub struct ArchiveAdapter {
    /// Entry contents keyed by normalized path.
    entries: BTreeMap<String, Vec<u8>>,
    /// Directories created explicitly (empty directories leave no entry).
    directories: BTreeSet<String>,
}

impl ArchiveAdapter {
    /// Creates an empty archive for writing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an existing zip container into an adapter for reading.
    pub fn from_zip_bytes(bytes: &[u8]) -> StorageResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| StorageError::Archive(e.to_string()))?;
        let mut entries = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| StorageError::Archive(e.to_string()))?;
            let name = file.name().to_string();
            if name.ends_with('/') {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.insert(name.trim_start_matches('/').to_string(), data);
        }

        Ok(Self {
            entries,
            directories: BTreeSet::new(),
        })
    }

    /// Encodes the accumulated entries into a deflated zip container.
    pub fn into_zip_bytes(self) -> StorageResult<Vec<u8>> {
        let buf = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(buf);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, data) in &self.entries {
            zip.start_file(name, options)
                .map_err(|e| StorageError::Archive(e.to_string()))?;
            zip.write_all(data)?;
        }

        let finished = zip
            .finish()
            .map_err(|e| StorageError::Archive(e.to_string()))?;
        Ok(finished.into_inner())
    }

    /// Returns the number of file entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn write_file(&mut self, path: &str, content: &FileContent) -> StorageResult<()> {
        let normalized = normalize_path(path)?;
        self.entries.insert(normalized, content.as_bytes().to_vec());
        Ok(())
    }

    pub(crate) fn read_file(&self, path: &str) -> StorageResult<FileContent> {
        let normalized = normalize_path(path)?;
        let bytes = self
            .entries
            .get(&normalized)
            .ok_or_else(|| StorageError::NotFound(normalized.clone()))?;
        Ok(match content_kind(&normalized) {
            // A text extension with invalid UTF-8 inside stays binary so the
            // bytes survive unchanged.
            ContentKind::Text => match String::from_utf8(bytes.clone()) {
                Ok(text) => FileContent::Text(text),
                Err(e) => FileContent::Binary(e.into_bytes()),
            },
            ContentKind::Binary => FileContent::Binary(bytes.clone()),
        })
    }

    pub(crate) fn create_directory(&mut self, path: &str) -> StorageResult<()> {
        let normalized = normalize_path(path)?;
        self.directories.insert(normalized);
        Ok(())
    }

    pub(crate) fn exists(&self, path: &str) -> StorageResult<bool> {
        let normalized = normalize_path(path)?;
        if self.entries.contains_key(&normalized) || self.directories.contains(&normalized) {
            return Ok(true);
        }
        // Directory paths exist if any entry sits beneath them.
        let prefix = format!("{normalized}/");
        Ok(self.entries.keys().any(|k| k.starts_with(&prefix))
            || self.directories.iter().any(|d| d.starts_with(&prefix)))
    }

    pub(crate) fn list_directory(&self, path: &str) -> StorageResult<Vec<String>> {
        let normalized = normalize_path(path)?;
        let prefix = format!("{normalized}/");

        if !self.exists(&normalized)? {
            return Err(StorageError::NotFound(normalized));
        }

        let mut names = BTreeSet::new();
        for key in self.entries.keys().chain(self.directories.iter()) {
            if let Some(rest) = key.strip_prefix(&prefix) {
                if rest.is_empty() {
                    continue;
                }
                let child = rest.split('/').next().unwrap_or(rest);
                names.insert(child.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }
}
