//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Two entries were given for the same path.
    #[error("duplicate index entry for path: {0}")]
    DuplicatePath(String),

    /// An invalid path was provided.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The index file could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The index file was written by an unknown format version.
    #[error("unsupported index version {0}")]
    UnsupportedVersion(u32),

    /// Reading or writing the index file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
