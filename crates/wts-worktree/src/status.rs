//! Working directory status against an index snapshot.
//!
//! A flat comparison of every leaf of a walk with the entry recorded for its
//! path. Directories are only descended into; their identities are never
//! compared.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wts_index::{IndexEntry, IndexSnapshot, PersistedIndex};
use wts_types::ContentId;

use crate::error::WorktreeResult;
use crate::fs::join_path;
use crate::node::TreeNode;
use crate::noder::Noder;

/// Status of the working directory relative to the index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkdirStatus {
    /// Tracked paths whose content or mode differs, or could not be hashed.
    pub modified: Vec<String>,
    /// Paths present in the working directory but not in the index.
    pub untracked: Vec<String>,
    /// Indexed paths with no leaf in the working directory.
    pub deleted: Vec<String>,
}

impl WorkdirStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.untracked.is_empty() && self.deleted.is_empty()
    }

    /// Total number of entries across all categories.
    pub fn total_entries(&self) -> usize {
        self.modified.len() + self.untracked.len() + self.deleted.len()
    }

    /// Every change, sorted by path.
    pub fn entries(&self) -> Vec<StatusEntry> {
        let mut entries: Vec<StatusEntry> = self
            .modified
            .iter()
            .map(|p| StatusEntry::new(p, FileStatus::Modified))
            .chain(self.untracked.iter().map(|p| StatusEntry::new(p, FileStatus::Untracked)))
            .chain(self.deleted.iter().map(|p| StatusEntry::new(p, FileStatus::Deleted)))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}

/// A single changed path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub path: String,
    pub status: FileStatus,
}

impl StatusEntry {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// The kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Modified,
    Untracked,
    Deleted,
}

/// Compare every leaf under `root` with `index`.
///
/// An unresolved leaf identity never matches its entry, so it is reported
/// as modified.
pub fn compute_status<N: Noder>(root: &N, index: &IndexSnapshot) -> WorktreeResult<WorkdirStatus> {
    let mut status = WorkdirStatus::new();
    let mut seen = HashSet::new();
    visit(root, "", &mut |path, node: &N| {
        match index.content_id(path) {
            None => status.untracked.push(path.to_string()),
            Some(recorded) if !node.hash().matches(&recorded) => {
                status.modified.push(path.to_string())
            }
            Some(_) => {}
        }
        seen.insert(path.to_string());
    })?;
    status.deleted = index
        .paths()
        .into_iter()
        .filter(|p| !seen.contains(*p))
        .map(str::to_string)
        .collect();
    status.modified.sort();
    status.untracked.sort();
    debug!(
        modified = status.modified.len(),
        untracked = status.untracked.len(),
        deleted = status.deleted.len(),
        "computed status"
    );
    Ok(status)
}

/// Record every resolvable leaf under `root`, with the metadata observed by
/// the walk, as an index that later walks can take the fast path against.
///
/// Leaves that cannot be hashed are left out.
pub fn record_index(root: &TreeNode) -> WorktreeResult<PersistedIndex> {
    let mut entries = Vec::new();
    visit(root, "", &mut |path, node: &TreeNode| {
        if let ContentId::Leaf { object_id, mode } = node.hash() {
            entries.push(IndexEntry::new(path, object_id, mode, node.size(), node.modified()));
        }
    })?;
    Ok(PersistedIndex::from_entries(entries)?)
}

/// Depth-first over the leaves under `node`, in name order.
fn visit<N: Noder>(
    node: &N,
    prefix: &str,
    leaf: &mut dyn FnMut(&str, &N),
) -> WorktreeResult<()> {
    for child in node.children()? {
        if child.skip() {
            continue;
        }
        let path = join_path(prefix, child.name());
        if child.is_dir() {
            visit(child, &path, leaf)?;
        } else {
            leaf(&path, child);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalkOptions;
    use crate::fs::{Filesystem, OsFilesystem};
    use crate::node::SubmoduleMap;
    use crate::testing::MemFs;
    use std::sync::Arc;
    use wts_crypto::ObjectHasher;
    use wts_types::{FileMode, ModTime, ObjectId, ObjectKind};

    const T: ModTime = ModTime::new(1_700_000_000, 0);

    fn entry(path: &str, data: &[u8]) -> IndexEntry {
        IndexEntry::new(
            path,
            ObjectHasher::digest(ObjectKind::Blob, data),
            FileMode::Regular,
            data.len() as u64,
            T,
        )
    }

    fn walk(fs: MemFs) -> TreeNode {
        TreeNode::new_root(Arc::new(fs), SubmoduleMap::new(), WalkOptions::default())
    }

    #[test]
    fn empty_status_is_clean() {
        let status = WorkdirStatus::new();
        assert!(status.is_clean());
        assert_eq!(status.total_entries(), 0);
    }

    #[test]
    fn unchanged_tree_is_clean() {
        let root = walk(MemFs::new().file("a", b"aaa", T).file("dir/b", b"bbb", T));
        let index =
            IndexSnapshot::from_entries([entry("a", b"aaa"), entry("dir/b", b"bbb")]).unwrap();
        assert!(compute_status(&root, &index).unwrap().is_clean());
    }

    #[test]
    fn reports_each_kind_of_change() {
        let root = walk(
            MemFs::new()
                .file("same", b"same", T)
                .file("edited", b"new content", T)
                .file("dir/added", b"+", T),
        );
        let index = IndexSnapshot::from_entries([
            entry("same", b"same"),
            entry("edited", b"old content"),
            entry("removed", b"-"),
        ])
        .unwrap();

        let status = compute_status(&root, &index).unwrap();
        assert_eq!(status.modified, vec!["edited"]);
        assert_eq!(status.untracked, vec!["dir/added"]);
        assert_eq!(status.deleted, vec!["removed"]);
        assert_eq!(
            status.entries(),
            vec![
                StatusEntry::new("dir/added", FileStatus::Untracked),
                StatusEntry::new("edited", FileStatus::Modified),
                StatusEntry::new("removed", FileStatus::Deleted),
            ]
        );
    }

    #[test]
    fn unresolved_leaf_counts_as_modified() {
        let fs = Arc::new(MemFs::new().file("flaky", b"data", T));
        let root = TreeNode::new_root(
            Arc::clone(&fs) as Arc<dyn Filesystem>,
            SubmoduleMap::new(),
            WalkOptions::default(),
        );
        root.children().unwrap();
        fs.remove("flaky");
        let index = IndexSnapshot::from_entries([entry("flaky", b"data")]).unwrap();
        assert_eq!(compute_status(&root, &index).unwrap().modified, vec!["flaky"]);
    }

    #[test]
    fn submodule_compares_by_commit() {
        let commit = ObjectId::from_hash([5; 20]);
        let mut submodules = SubmoduleMap::new();
        submodules.insert("sub".to_string(), commit);
        let root = TreeNode::new_root(
            Arc::new(MemFs::new().file("sub/inner", b"x", T)),
            submodules,
            WalkOptions::default(),
        );
        let index = IndexSnapshot::from_entries([IndexEntry::new(
            "sub",
            commit,
            FileMode::Submodule,
            0,
            ModTime::zero(),
        )])
        .unwrap();
        assert!(compute_status(&root, &index).unwrap().is_clean());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_name_does_not_stop_recording() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), b"good").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), b"bad").unwrap();

        let root = TreeNode::new_root(
            Arc::new(OsFilesystem::new(dir.path())),
            SubmoduleMap::new(),
            WalkOptions::default(),
        );
        let index = record_index(&root).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get("good.txt").is_some());
    }

    #[test]
    fn recorded_index_makes_next_walk_clean_without_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), b"pub fn f() {}\n").unwrap();

        let first = TreeNode::new_root(
            Arc::new(OsFilesystem::new(dir.path())),
            SubmoduleMap::new(),
            WalkOptions::default(),
        );
        let index = record_index(&first).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get("a.txt").unwrap().object_id,
            ObjectHasher::digest(ObjectKind::Blob, b"alpha")
        );

        let snapshot = Arc::new(IndexSnapshot::from_index(&index));
        // Same names and metadata as on disk, but content nobody may read.
        let mut mem = MemFs::new().strict();
        for e in index.entries() {
            mem = mem.file(&e.path, &vec![b'?'; e.size as usize], e.mtime);
        }
        let mem = Arc::new(mem);
        let second = TreeNode::with_index(
            Arc::clone(&mem) as Arc<dyn Filesystem>,
            SubmoduleMap::new(),
            Arc::clone(&snapshot),
            WalkOptions::default(),
        );
        assert!(compute_status(&second, &snapshot).unwrap().is_clean());
        assert_eq!(mem.total_reads(), 0);
    }
}
