//! Filesystem-backed Merkle nodes.
//!
//! A [`TreeNode`] lists its directory at most once and computes its
//! [`ContentId`] at most once; both are memoized in the node. A leaf whose
//! metadata matches its index entry reuses the recorded id without reading
//! the file.

use std::collections::HashMap;
use std::io::{Seek, SeekFrom};
use std::sync::{Arc, OnceLock};

use tracing::{trace, warn};
use wts_crypto::{HashComputer, Sha1Computer};
use wts_index::IndexSnapshot;
use wts_types::{ContentId, FileMode, ModTime, ObjectId, ObjectKind, OsFileKind, OsMode};

use crate::config::WalkOptions;
use crate::crlf::{CrlfToLf, LineEndingFilter};
use crate::error::{WorktreeError, WorktreeResult};
use crate::fs::{join_path, FileInfo, Filesystem};
use crate::noder::Noder;

/// Submodule path → commit the nested repository is checked out at.
pub type SubmoduleMap = HashMap<String, ObjectId>;

/// What a node is, decided once when it is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    RegularFile,
    Symlink,
    Directory,
    /// A nested repository, pinned at a commit. Never listed or read, even
    /// when a directory exists at its path.
    Submodule(ObjectId),
}

/// Everything one walk shares between its nodes.
pub struct WalkContext {
    fs: Arc<dyn Filesystem>,
    submodules: SubmoduleMap,
    index: Option<Arc<IndexSnapshot>>,
    options: WalkOptions,
    hasher: Arc<dyn HashComputer>,
    filter: Arc<dyn LineEndingFilter>,
}

impl WalkContext {
    pub fn new(fs: Arc<dyn Filesystem>) -> Self {
        Self {
            fs,
            submodules: SubmoduleMap::new(),
            index: None,
            options: WalkOptions::default(),
            hasher: Arc::new(Sha1Computer),
            filter: Arc::new(CrlfToLf),
        }
    }

    pub fn with_submodules(mut self, submodules: SubmoduleMap) -> Self {
        self.submodules = submodules;
        self
    }

    /// Enable the metadata fast path against `index`.
    pub fn with_index(mut self, index: Arc<IndexSnapshot>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn HashComputer>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_line_ending_filter(mut self, filter: Arc<dyn LineEndingFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// The root node of a walk over this context.
    pub fn into_root(self) -> TreeNode {
        TreeNode {
            ctx: Arc::new(self),
            path: String::new(),
            kind: NodeKind::Directory,
            mode: OsMode::dir(),
            size: 0,
            modified: ModTime::zero(),
            hash: OnceLock::new(),
            children: OnceLock::new(),
        }
    }
}

/// A file, symlink, directory or submodule of the working tree.
pub struct TreeNode {
    ctx: Arc<WalkContext>,
    path: String,
    kind: NodeKind,
    mode: OsMode,
    size: u64,
    modified: ModTime,
    hash: OnceLock<ContentId>,
    children: OnceLock<Vec<TreeNode>>,
}

impl TreeNode {
    /// Root node over `fs` without an index; every leaf is hashed from
    /// content.
    pub fn new_root(
        fs: Arc<dyn Filesystem>,
        submodules: SubmoduleMap,
        options: WalkOptions,
    ) -> Self {
        WalkContext::new(fs)
            .with_submodules(submodules)
            .with_options(options)
            .into_root()
    }

    /// Root node over `fs` that trusts `index` for leaves whose size, mode
    /// and mtime are unchanged.
    pub fn with_index(
        fs: Arc<dyn Filesystem>,
        submodules: SubmoduleMap,
        index: Arc<IndexSnapshot>,
        options: WalkOptions,
    ) -> Self {
        WalkContext::new(fs)
            .with_submodules(submodules)
            .with_index(index)
            .with_options(options)
            .into_root()
    }

    fn child(&self, info: FileInfo) -> Self {
        let path = join_path(&self.path, &info.name);
        let kind = match self.ctx.submodules.get(&path) {
            Some(commit) => NodeKind::Submodule(*commit),
            None if info.is_dir() => NodeKind::Directory,
            None if info.mode.kind == OsFileKind::Symlink => NodeKind::Symlink,
            None => NodeKind::RegularFile,
        };
        Self {
            ctx: Arc::clone(&self.ctx),
            path,
            kind,
            mode: info.mode,
            size: info.size,
            modified: info.modified,
            hash: OnceLock::new(),
            children: OnceLock::new(),
        }
    }

    /// Path from the root, slash-separated; empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Size reported by the directory listing.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time reported by the directory listing.
    pub fn modified(&self) -> ModTime {
        self.modified
    }

    /// The recorded file mode of this node, if its on-disk mode has one.
    pub fn file_mode(&self) -> Option<FileMode> {
        match self.kind {
            NodeKind::Submodule(_) => Some(FileMode::Submodule),
            _ => FileMode::from_os(self.mode).ok(),
        }
    }

    /// Whether the identity has been computed already.
    pub fn is_hashed(&self) -> bool {
        self.hash.get().is_some()
    }

    fn list_children(&self) -> WorktreeResult<Vec<TreeNode>> {
        let infos = match self.ctx.fs.read_dir(&self.path) {
            Ok(infos) => infos,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(path = %self.path, "directory vanished, no children");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(WorktreeError::Unreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(infos
            .into_iter()
            .filter(|info| !self.ctx.options.ignore.contains(&info.name))
            .filter(|info| info.mode.kind != OsFileKind::Socket)
            .map(|info| self.child(info))
            .collect())
    }

    fn compute_hash(&self) -> ContentId {
        match self.kind {
            NodeKind::Directory => ContentId::Directory,
            NodeKind::Submodule(commit) => ContentId::gitlink(commit),
            NodeKind::RegularFile | NodeKind::Symlink => self.compute_leaf_hash(),
        }
    }

    fn compute_leaf_hash(&self) -> ContentId {
        let mode = match FileMode::from_os(self.mode) {
            Ok(mode) => mode,
            Err(e) => {
                warn!(path = %self.path, error = %e, "no object mode, leaving unresolved");
                return ContentId::Unresolved;
            }
        };

        if let Some(entry) = self.ctx.index.as_deref().and_then(|idx| idx.get(&self.path)) {
            if entry.metadata_matches(self.size, self.modified, mode) {
                trace!(
                    path = %self.path,
                    id = %entry.object_id,
                    "metadata unchanged, reusing index id"
                );
                return ContentId::new(entry.object_id, mode);
            }
        }

        let hashed = match self.kind {
            NodeKind::Symlink => self.hash_symlink(),
            _ => self.hash_regular(),
        };
        match hashed {
            Ok(id) => {
                trace!(path = %self.path, %id, "hashed content");
                ContentId::new(id, mode)
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "cannot hash content, leaving unresolved");
                ContentId::Unresolved
            }
        }
    }

    fn hash_regular(&self) -> WorktreeResult<ObjectId> {
        let mut file = self.ctx.fs.open(&self.path)?;
        if self.ctx.options.auto_crlf {
            let stat = self.ctx.filter.stat(&mut file)?;
            file.seek(SeekFrom::Start(0))?;
            if !stat.is_binary() {
                let declared =
                    self.size
                        .checked_sub(stat.crlf)
                        .ok_or_else(|| WorktreeError::LineEndings {
                            path: self.path.clone(),
                            size: self.size,
                            removed: stat.crlf,
                        })?;
                let mut normalized = self.ctx.filter.normalize(&mut file);
                return Ok(self
                    .ctx
                    .hasher
                    .compute(ObjectKind::Blob, declared, &mut normalized)?);
            }
        }
        Ok(self.ctx.hasher.compute(ObjectKind::Blob, self.size, &mut file)?)
    }

    fn hash_symlink(&self) -> WorktreeResult<ObjectId> {
        let target = self.ctx.fs.read_link(&self.path)?;
        Ok(self
            .ctx
            .hasher
            .compute_bytes(ObjectKind::Blob, target.as_bytes())?)
    }
}

impl Noder for TreeNode {
    fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Memoized: the first call decides the identity for the lifetime of
    /// the node, even if the file changes afterwards.
    fn hash(&self) -> ContentId {
        *self.hash.get_or_init(|| self.compute_hash())
    }

    fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    fn children(&self) -> WorktreeResult<&[TreeNode]> {
        if !self.is_dir() {
            return Ok(&[]);
        }
        if let Some(children) = self.children.get() {
            return Ok(children);
        }
        let listed = self.list_children()?;
        Ok(self.children.get_or_init(|| listed))
    }
}

impl std::fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeNode")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("hash", &self.hash.get())
            .finish()
    }
}
