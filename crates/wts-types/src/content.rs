use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mode::FileMode;
use crate::object::{ObjectId, OBJECT_ID_LEN};

/// Length in bytes of an encoded [`ContentId`]: object hash plus mode.
pub const CONTENT_ID_LEN: usize = OBJECT_ID_LEN + 4;

/// Identity of a working-tree entry: what its content hashes to, and how it
/// is recorded.
///
/// Two leaves with the same bytes but different modes (say a plain and an
/// executable file) have different content identifiers, so a mode change is
/// detected by the same comparison as a content change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentId {
    /// Directories carry no identity of their own.
    Directory,
    /// A leaf whose identity could not be computed (unsupported mode, or an
    /// I/O failure while hashing).
    Unresolved,
    /// A file, symlink or gitlink.
    Leaf { object_id: ObjectId, mode: FileMode },
}

impl ContentId {
    pub fn new(object_id: ObjectId, mode: FileMode) -> Self {
        Self::Leaf { object_id, mode }
    }

    /// Identity of a nested repository pinned at `commit`.
    pub fn gitlink(commit: ObjectId) -> Self {
        Self::new(commit, FileMode::Submodule)
    }

    /// Encoded form compared by tree-diff consumers.
    ///
    /// Directories encode as 24 zero bytes. Unresolved leaves encode as the
    /// 20-byte null hash with no mode, so they never equal a directory or any
    /// real leaf.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Directory => vec![0u8; CONTENT_ID_LEN],
            Self::Unresolved => vec![0u8; OBJECT_ID_LEN],
            Self::Leaf { object_id, mode } => {
                let mut bytes = Vec::with_capacity(CONTENT_ID_LEN);
                bytes.extend_from_slice(object_id.as_bytes());
                bytes.extend_from_slice(&mode.to_bytes());
                bytes
            }
        }
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            Self::Leaf { object_id, .. } => Some(*object_id),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<FileMode> {
        match self {
            Self::Leaf { mode, .. } => Some(*mode),
            Self::Directory => Some(FileMode::Dir),
            Self::Unresolved => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    /// Change-detection equality: unresolved identities never match,
    /// not even each other.
    pub fn matches(&self, other: &ContentId) -> bool {
        !self.is_unresolved() && !other.is_unresolved() && self == other
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "dir"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::Leaf { object_id, mode } => write!(f, "{mode} {object_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; OBJECT_ID_LEN])
    }

    #[test]
    fn directory_sentinel_is_24_zero_bytes() {
        let bytes = ContentId::Directory.to_bytes();
        assert_eq!(bytes.len(), 24);
        assert!(bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn leaf_encodes_hash_then_mode() {
        let cid = ContentId::new(id(9), FileMode::Executable);
        let bytes = cid.to_bytes();
        assert_eq!(bytes.len(), CONTENT_ID_LEN);
        assert_eq!(&bytes[..20], id(9).as_bytes());
        assert_eq!(&bytes[20..], &FileMode::Executable.to_bytes());
    }

    #[test]
    fn mode_participates_in_equality() {
        let a = ContentId::new(id(1), FileMode::Regular);
        let b = ContentId::new(id(1), FileMode::Executable);
        assert_ne!(a, b);
        assert!(!a.matches(&b));
        assert!(a.matches(&ContentId::new(id(1), FileMode::Regular)));
    }

    #[test]
    fn unresolved_never_matches() {
        let u = ContentId::Unresolved;
        assert!(!u.matches(&ContentId::Unresolved));
        assert!(!u.matches(&ContentId::Directory));
        assert_ne!(u.to_bytes(), ContentId::Directory.to_bytes());
    }

    #[test]
    fn gitlink_uses_submodule_mode() {
        let cid = ContentId::gitlink(id(4));
        assert_eq!(cid.mode(), Some(FileMode::Submodule));
        assert_eq!(cid.object_id(), Some(id(4)));
    }
}
