//! Working-tree side of the sync core.
//!
//! Exposes a working directory as a lazily evaluated Merkle tree. Each leaf
//! is identified by the blob id of its content plus its mode; a leaf whose
//! size, mode and mtime still match the index reuses the recorded id instead
//! of being read.
//!
//! # Key Types
//!
//! - [`TreeNode`] -- Filesystem-backed node with memoized children and identity
//! - [`WalkContext`] -- Filesystem, index snapshot, submodules and options shared by a walk
//! - [`Filesystem`] -- What a walk reads from; [`OsFilesystem`] for real directories
//! - [`LineEndingFilter`] -- CRLF normalization applied under `auto_crlf`
//! - [`WorkdirStatus`] -- Modified, untracked and deleted paths against an index

pub mod config;
pub mod crlf;
pub mod error;
pub mod fs;
pub mod node;
pub mod noder;
pub mod status;

#[cfg(test)]
mod testing;

pub use config::{IgnoreSet, WalkOptions, WorktreeConfig, METADATA_DIR};
pub use crlf::{CrlfToLf, LfReader, LineEndingFilter, TextStat};
pub use error::{WorktreeError, WorktreeResult};
pub use fs::{FileInfo, Filesystem, OsFilesystem, ReadSeek};
pub use node::{NodeKind, SubmoduleMap, TreeNode, WalkContext};
pub use noder::Noder;
pub use status::{compute_status, record_index, FileStatus, StatusEntry, WorkdirStatus};
