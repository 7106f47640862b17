use std::io::{self, Read, Write};

use sha1::{Digest, Sha1};
use wts_types::{ObjectId, ObjectKind};

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The payload was shorter or longer than the length in the header.
    #[error("declared length {declared} but {actual} bytes were hashed")]
    LengthMismatch { declared: u64, actual: u64 },

    /// Reading the payload failed.
    #[error("I/O error while hashing: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for hashing operations.
pub type HashResult<T> = Result<T, HashError>;

/// Streaming hasher for one object.
///
/// The canonical header is fed on construction; the payload is written
/// through [`Write`]. [`finish`](Self::finish) refuses to produce an id when
/// the number of payload bytes differs from the declared length.
#[derive(Clone)]
pub struct ObjectHasher {
    inner: Sha1,
    declared: u64,
    written: u64,
}

impl ObjectHasher {
    /// Start hashing an object of `kind` whose payload is `declared_len` bytes.
    pub fn new(kind: ObjectKind, declared_len: u64) -> Self {
        let mut inner = Sha1::new();
        inner.update(format!("{kind} {declared_len}\0").as_bytes());
        Self {
            inner,
            declared: declared_len,
            written: 0,
        }
    }

    /// Discard everything hashed so far and start over with a new header.
    pub fn reset(&mut self, kind: ObjectKind, declared_len: u64) {
        *self = Self::new(kind, declared_len);
    }

    /// Payload bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Finalize and return the object id.
    pub fn finish(self) -> HashResult<ObjectId> {
        if self.written != self.declared {
            return Err(HashError::LengthMismatch {
                declared: self.declared,
                actual: self.written,
            });
        }
        Ok(ObjectId::from_hash(self.inner.finalize().into()))
    }

    /// Id of an in-memory payload. The length always matches.
    pub fn digest(kind: ObjectKind, data: &[u8]) -> ObjectId {
        let mut inner = Sha1::new();
        inner.update(format!("{kind} {}\0", data.len()).as_bytes());
        inner.update(data);
        ObjectId::from_hash(inner.finalize().into())
    }
}

impl Write for ObjectHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.update(buf);
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for ObjectHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHasher")
            .field("declared", &self.declared)
            .field("written", &self.written)
            .finish()
    }
}

/// Computes object identifiers from a kind, a declared length and a byte
/// stream.
///
/// Implementations are stateless; one instance is shared by every node of a
/// walk.
pub trait HashComputer: Send + Sync {
    /// Hash exactly `declared_len` bytes read from `reader`.
    fn compute(
        &self,
        kind: ObjectKind,
        declared_len: u64,
        reader: &mut dyn Read,
    ) -> HashResult<ObjectId>;

    /// Hash an in-memory payload.
    fn compute_bytes(&self, kind: ObjectKind, data: &[u8]) -> HashResult<ObjectId> {
        let mut reader = data;
        self.compute(kind, data.len() as u64, &mut reader)
    }
}

/// The default [`HashComputer`]: canonical-header SHA-1.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha1Computer;

impl HashComputer for Sha1Computer {
    fn compute(
        &self,
        kind: ObjectKind,
        declared_len: u64,
        reader: &mut dyn Read,
    ) -> HashResult<ObjectId> {
        let mut hasher = ObjectHasher::new(kind, declared_len);
        io::copy(reader, &mut hasher)?;
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_blob_has_well_known_id() {
        let id = ObjectHasher::digest(ObjectKind::Blob, b"");
        assert_eq!(id.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn hello_blob_matches_git() {
        // printf 'hello world\n' | git hash-object --stdin
        let id = ObjectHasher::digest(ObjectKind::Blob, b"hello world\n");
        assert_eq!(id.to_hex(), "3b18e512dba79e4c8300dd08aeb37f8e728b8dad");
    }

    #[test]
    fn kind_is_part_of_the_id() {
        let blob = ObjectHasher::digest(ObjectKind::Blob, b"same");
        let tree = ObjectHasher::digest(ObjectKind::Tree, b"same");
        assert_ne!(blob, tree);
    }

    #[test]
    fn streaming_matches_digest() {
        let mut hasher = ObjectHasher::new(ObjectKind::Blob, 11);
        hasher.write_all(b"hello ").unwrap();
        hasher.write_all(b"world").unwrap();
        assert_eq!(hasher.written(), 11);
        assert_eq!(
            hasher.finish().unwrap(),
            ObjectHasher::digest(ObjectKind::Blob, b"hello world")
        );
    }

    #[test]
    fn short_payload_is_rejected() {
        let mut hasher = ObjectHasher::new(ObjectKind::Blob, 10);
        hasher.write_all(b"abc").unwrap();
        assert!(matches!(
            hasher.finish(),
            Err(HashError::LengthMismatch {
                declared: 10,
                actual: 3
            })
        ));
    }

    #[test]
    fn reset_discards_previous_state() {
        let mut hasher = ObjectHasher::new(ObjectKind::Blob, 100);
        hasher.write_all(b"garbage").unwrap();
        hasher.reset(ObjectKind::Blob, 3);
        hasher.write_all(b"abc").unwrap();
        assert_eq!(
            hasher.finish().unwrap(),
            ObjectHasher::digest(ObjectKind::Blob, b"abc")
        );
    }

    #[test]
    fn computer_reads_the_stream() {
        let data = b"streamed content".to_vec();
        let mut reader = data.as_slice();
        let id = Sha1Computer
            .compute(ObjectKind::Blob, data.len() as u64, &mut reader)
            .unwrap();
        assert_eq!(id, ObjectHasher::digest(ObjectKind::Blob, &data));
        assert_eq!(
            Sha1Computer.compute_bytes(ObjectKind::Blob, &data).unwrap(),
            id
        );
    }

    #[test]
    fn computer_detects_overlong_stream() {
        let mut reader: &[u8] = b"twelve bytes";
        let result = Sha1Computer.compute(ObjectKind::Blob, 5, &mut reader);
        assert!(matches!(result, Err(HashError::LengthMismatch { .. })));
    }
}
