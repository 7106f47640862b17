//! Foundation types for the working-tree sync core.
//!
//! Every other `wts` crate depends on `wts-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (SHA-1 of the canonical encoding)
//! - [`ObjectKind`] -- Blob, tree, commit or tag
//! - [`FileMode`] -- Mode of a tree or index entry, translated from [`OsMode`]
//! - [`ContentId`] -- Object id plus mode; what a working-tree node hashes to
//! - [`ModTime`] -- Modification timestamp with precision-tolerant matching

pub mod content;
pub mod error;
pub mod kind;
pub mod mode;
pub mod object;
pub mod temporal;

pub use content::{ContentId, CONTENT_ID_LEN};
pub use error::TypeError;
pub use kind::ObjectKind;
pub use mode::{FileMode, OsFileKind, OsMode};
pub use object::{ObjectId, OBJECT_ID_LEN};
pub use temporal::ModTime;
