use std::path::PathBuf;

use wts_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found in any store.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: content hashes to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// The directory given as an object store does not exist.
    #[error("no object store at {}", .0.display())]
    MissingStore(PathBuf),

    /// The alternate chain could not be resolved.
    #[error(transparent)]
    Alternates(#[from] AlternateError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure to resolve the alternate chain of a store.
///
/// `Clone` so a single cached failure can be handed to every caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AlternateError {
    /// A line of an alternates declaration is invalid.
    #[error("malformed alternates in {}: line {line}: {reason}", .declared_in.display())]
    Malformed {
        declared_in: PathBuf,
        line: usize,
        reason: String,
    },

    /// A declared alternate does not exist or is not an object store.
    #[error("alternate {} declared in {} is not an object store", .path.display(), .declared_in.display())]
    Dangling { path: PathBuf, declared_in: PathBuf },

    /// The declaration exists but could not be read.
    #[error("cannot read alternates of {}: {reason}", .store.display())]
    Unreadable { store: PathBuf, reason: String },
}
