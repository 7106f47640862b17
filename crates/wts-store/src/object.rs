use wts_crypto::ObjectHasher;
use wts_types::{ObjectId, ObjectKind};

use crate::error::{StoreError, StoreResult};

/// A stored object: kind tag + payload + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// payload; it is a pure key-value store keyed by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The payload bytes.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        ObjectHasher::digest(self.kind, &self.data)
    }

    /// Canonical encoding: `"<kind> <size>\0"` followed by the payload.
    pub fn encode(&self) -> Vec<u8> {
        let header = format!("{} {}\0", self.kind, self.size);
        let mut out = Vec::with_capacity(header.len() + self.data.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Decode the canonical encoding of the object expected at `id`.
    ///
    /// The header must parse and its size must match the payload; the hash
    /// itself is checked by the caller.
    pub fn decode(id: &ObjectId, bytes: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            id: *id,
            reason: reason.to_string(),
        };
        let nul = bytes
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator"))?;
        let header =
            std::str::from_utf8(&bytes[..nul]).map_err(|_| corrupt("header is not UTF-8"))?;
        let (kind, size) = header
            .split_once(' ')
            .ok_or_else(|| corrupt("header has no size"))?;
        let kind: ObjectKind = kind.parse().map_err(|_| corrupt("unknown object kind"))?;
        let size: u64 = size.parse().map_err(|_| corrupt("size is not a number"))?;

        let data = bytes[nul + 1..].to_vec();
        if data.len() as u64 != size {
            return Err(corrupt("payload length differs from header"));
        }
        Ok(Self::new(kind, data))
    }
}

/// Raw content object (file contents or a symlink target).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        if obj.kind != ObjectKind::Blob {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("expected blob, got {}", obj.kind),
            });
        }
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}
