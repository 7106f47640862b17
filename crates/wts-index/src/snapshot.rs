use std::collections::HashMap;

use wts_types::ContentId;

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};
use crate::index::PersistedIndex;

/// Immutable path-keyed view of an index, built once per walk.
///
/// Walk nodes share one snapshot behind an `Arc` and only ever read it, so
/// sibling nodes can consult it from different threads.
#[derive(Clone, Debug, Default)]
pub struct IndexSnapshot {
    entries: HashMap<String, IndexEntry>,
}

impl IndexSnapshot {
    /// Snapshot a persisted index. Its paths are already unique.
    pub fn from_index(index: &PersistedIndex) -> Self {
        let entries = index
            .entries()
            .iter()
            .map(|e| (e.path.clone(), e.clone()))
            .collect();
        Self { entries }
    }

    /// Snapshot loose entries, rejecting a path given twice.
    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> IndexResult<Self> {
        let mut map = HashMap::new();
        for entry in entries {
            let path = entry.path.clone();
            if map.insert(path.clone(), entry).is_some() {
                return Err(IndexError::DuplicatePath(path));
            }
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// The recorded content id of `path`.
    pub fn content_id(&self, path: &str) -> Option<ContentId> {
        self.get(path).map(IndexEntry::content_id)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every recorded path, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl From<&PersistedIndex> for IndexSnapshot {
    fn from(index: &PersistedIndex) -> Self {
        Self::from_index(index)
    }
}
