//! Index entry types for tracking working directory files.

use serde::{Deserialize, Serialize};
use wts_types::{ContentId, FileMode, ModTime, ObjectId};

/// An entry in the index, as recorded the last time the path was hashed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Slash-separated path relative to the working-tree root.
    pub path: String,
    /// Object id of the recorded content.
    pub object_id: ObjectId,
    /// File size in bytes, truncated to 32 bits.
    pub size: u32,
    /// Last modification time.
    pub mtime: ModTime,
    /// Recorded file mode.
    pub mode: FileMode,
}

impl IndexEntry {
    /// Create a new index entry. `size` is truncated to 32 bits the same way
    /// the on-disk index truncates it.
    pub fn new(
        path: impl Into<String>,
        object_id: ObjectId,
        mode: FileMode,
        size: u64,
        mtime: ModTime,
    ) -> Self {
        Self {
            path: path.into(),
            object_id,
            size: size as u32,
            mtime,
            mode,
        }
    }

    /// The content identifier this entry records.
    pub fn content_id(&self) -> ContentId {
        ContentId::new(self.object_id, self.mode)
    }

    /// Whether observed metadata is close enough to trust the recorded id.
    ///
    /// Size compares in 32 bits. An unset observed `mtime` is not compared.
    pub fn metadata_matches(&self, size: u64, mtime: ModTime, mode: FileMode) -> bool {
        if size as u32 != self.size || mode != self.mode {
            return false;
        }
        mtime.is_zero() || self.mtime.matches(&mtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> IndexEntry {
        IndexEntry::new(
            "src/lib.rs",
            ObjectId::from_hash([7; 20]),
            FileMode::Regular,
            10,
            ModTime::new(1_700_000_000, 250),
        )
    }

    #[test]
    fn content_id_pairs_hash_and_mode() {
        let e = entry();
        assert_eq!(
            e.content_id(),
            ContentId::new(ObjectId::from_hash([7; 20]), FileMode::Regular)
        );
    }

    #[test]
    fn identical_metadata_matches() {
        let e = entry();
        assert!(e.metadata_matches(10, ModTime::new(1_700_000_000, 250), FileMode::Regular));
    }

    #[test]
    fn size_mode_or_mtime_change_rejects() {
        let e = entry();
        let t = ModTime::new(1_700_000_000, 250);
        assert!(!e.metadata_matches(11, t, FileMode::Regular));
        assert!(!e.metadata_matches(10, t, FileMode::Executable));
        assert!(!e.metadata_matches(10, ModTime::new(1_700_000_001, 250), FileMode::Regular));
        assert!(!e.metadata_matches(10, ModTime::new(1_700_000_000, 251), FileMode::Regular));
    }

    #[test]
    fn unset_observed_mtime_is_not_compared() {
        let e = entry();
        assert!(e.metadata_matches(10, ModTime::zero(), FileMode::Regular));
    }

    #[test]
    fn size_compares_in_32_bits() {
        let e = entry();
        assert!(e.metadata_matches((1u64 << 32) + 10, ModTime::zero(), FileMode::Regular));
        let big = IndexEntry::new(
            "big",
            ObjectId::null(),
            FileMode::Regular,
            (1u64 << 32) + 3,
            ModTime::zero(),
        );
        assert_eq!(big.size, 3);
    }
}
