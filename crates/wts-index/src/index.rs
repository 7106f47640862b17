//! The persisted index: an ordered list of entries, one per path.
//!
//! Entries are kept sorted by path. [`PersistedIndex::load`] and
//! [`PersistedIndex::save`] store them with `bincode`; this is a convenience
//! encoding for tools and tests, not a compatible on-disk index format.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};

/// Format version written by [`PersistedIndex::save`].
pub const INDEX_VERSION: u32 = 1;

/// The recorded state of a working tree.
///
/// Holds at most one entry per path; adding an entry for a path that is
/// already present replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIndex {
    version: u32,
    entries: Vec<IndexEntry>,
}

impl Default for PersistedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistedIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: Vec::new(),
        }
    }

    /// Build an index from entries in any order.
    ///
    /// Fails on an invalid path or on two entries for the same path.
    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> IndexResult<Self> {
        let mut entries: Vec<IndexEntry> = entries.into_iter().collect();
        for entry in &entries {
            validate_path(&entry.path)?;
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        if let Some(dup) = entries.windows(2).find(|w| w[0].path == w[1].path) {
            return Err(IndexError::DuplicatePath(dup[0].path.clone()));
        }
        Ok(Self {
            version: INDEX_VERSION,
            entries,
        })
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by path.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.position(path).ok().map(|i| &self.entries[i])
    }

    /// Add an entry, replacing any entry already recorded for its path.
    ///
    /// Returns the replaced entry.
    pub fn add(&mut self, entry: IndexEntry) -> IndexResult<Option<IndexEntry>> {
        validate_path(&entry.path)?;
        match self.position(&entry.path) {
            Ok(i) => Ok(Some(std::mem::replace(&mut self.entries[i], entry))),
            Err(i) => {
                self.entries.insert(i, entry);
                Ok(None)
            }
        }
    }

    /// Remove the entry for `path`.
    pub fn remove(&mut self, path: &str) -> Option<IndexEntry> {
        self.position(path).ok().map(|i| self.entries.remove(i))
    }

    fn position(&self, path: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.path.as_str().cmp(path))
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Encode the index.
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Decode an index, re-checking its invariants.
    pub fn from_bytes(bytes: &[u8]) -> IndexResult<Self> {
        let decoded: PersistedIndex =
            bincode::deserialize(bytes).map_err(|e| IndexError::Serialization(e.to_string()))?;
        if decoded.version != INDEX_VERSION {
            return Err(IndexError::UnsupportedVersion(decoded.version));
        }
        Self::from_entries(decoded.entries)
    }

    /// Read an index file.
    pub fn load(path: &Path) -> IndexResult<Self> {
        let bytes = fs::read(path)?;
        let index = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), entries = index.len(), "loaded index");
        Ok(index)
    }

    /// Write the index file atomically.
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
        debug!(path = %path.display(), entries = self.len(), "saved index");
        Ok(())
    }
}

/// Index paths are relative, slash-separated, and free of `.`/`..` and
/// empty components.
fn validate_path(path: &str) -> IndexResult<()> {
    let invalid = |reason| IndexError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.contains('\0') {
        return Err(invalid("contains a NUL byte"));
    }
    if path.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid("empty component")),
            "." | ".." => return Err(invalid("relative component")),
            _ => {}
        }
    }
    Ok(())
}
