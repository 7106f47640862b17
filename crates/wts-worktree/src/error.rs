use std::io;

use wts_crypto::HashError;
use wts_index::IndexError;

/// Errors surfaced by a working-tree walk.
///
/// Content that cannot be hashed is not an error: the node's identity
/// degrades to [`ContentId::Unresolved`](wts_types::ContentId::Unresolved).
/// The hashing variants only travel between a node and its own fallback.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    /// A directory listing failed for a reason other than the directory
    /// having disappeared.
    #[error("cannot read directory {path:?}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`WorktreeConfig`](crate::WorktreeConfig).
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Building an index from a walk failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Hashing a leaf failed.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// Line-ending normalization would remove more bytes than the file has.
    #[error("{path:?}: {removed} CRLF pairs in a {size}-byte file")]
    LineEndings { path: String, size: u64, removed: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for working-tree operations.
pub type WorktreeResult<T> = Result<T, WorktreeError>;
