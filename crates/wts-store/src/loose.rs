//! Loose-object directory store.
//!
//! Layout, rooted at an `objects` directory:
//!
//! ```text
//! objects/
//!   info/alternates      optional, one backing store per line
//!   3b/18e512dba7...     "<kind> <len>\0<payload>", one file per object
//! ```
//!
//! Payloads are stored uncompressed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::trace;
use wts_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Path of the alternates declaration, relative to an objects directory.
pub const ALTERNATES_FILE: &str = "info/alternates";

/// Object store backed by a directory of loose object files.
#[derive(Debug)]
pub struct LooseObjectStore {
    root: PathBuf,
}

impl LooseObjectStore {
    /// Open an existing objects directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::MissingStore(root));
        }
        Ok(Self { root })
    }

    /// Create the objects directory (and its `info/` subdirectory) if needed.
    pub fn init(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("info"))?;
        Ok(Self { root })
    }

    /// The objects directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let bytes = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = StoredObject::decode(id, &bytes)?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::MissingStore(self.root.clone()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&object.encode())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        trace!(%id, kind = %object.kind, size = object.size, "wrote loose object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Blob;
    use wts_types::ObjectKind;

    #[test]
    fn open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("objects");
        assert!(matches!(
            LooseObjectStore::open(&missing),
            Err(StoreError::MissingStore(_))
        ));
        LooseObjectStore::init(&missing).unwrap();
        assert!(LooseObjectStore::open(&missing).is_ok());
        assert!(missing.join("info").is_dir());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::init(dir.path()).unwrap();
        let obj = Blob::new(b"hello world\n".to_vec()).to_stored_object();

        let id = store.write(&obj).unwrap();
        assert_eq!(id.to_hex(), "3b18e512dba79e4c8300dd08aeb37f8e728b8dad");
        assert!(dir
            .path()
            .join("3b/18e512dba79e4c8300dd08aeb37f8e728b8dad")
            .is_file());
        assert!(store.exists(&id).unwrap());
        assert_eq!(store.read(&id).unwrap(), Some(obj));
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::init(dir.path()).unwrap();
        let obj = StoredObject::new(ObjectKind::Tag, b"object 00\n".to_vec());
        assert_eq!(store.write(&obj).unwrap(), store.write(&obj).unwrap());
    }

    #[test]
    fn missing_object_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::init(dir.path()).unwrap();
        let id = Blob::new(b"absent".to_vec()).to_stored_object().compute_id();
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    #[test]
    fn tampered_object_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::init(dir.path()).unwrap();
        let id = store
            .write(&Blob::new(b"original".to_vec()).to_stored_object())
            .unwrap();
        let path = store.object_path(&id);
        fs::write(&path, b"blob 8\0tampered").unwrap();

        assert!(matches!(
            store.read(&id),
            Err(StoreError::HashMismatch { .. })
        ));
    }
}
