//! The index: what the working tree looked like when it was last recorded.
//!
//! The persisted index is an ordered list of entries, at most one per path.
//! A walk never reads it directly; it builds an [`IndexSnapshot`] once and
//! shares that immutable map between every node it creates.
//!
//! # Key Types
//!
//! - [`IndexEntry`] -- Recorded object id, size, mtime and mode of one path
//! - [`PersistedIndex`] -- The ordered, path-unique entry list and its file form
//! - [`IndexSnapshot`] -- O(1) lookup by path, frozen for a walk

pub mod entry;
pub mod error;
pub mod index;
pub mod snapshot;

pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use index::PersistedIndex;
pub use snapshot::IndexSnapshot;
