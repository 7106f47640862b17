//! Object hashing for the working-tree sync core.
//!
//! Object identifiers are the SHA-1 of `"<kind> <len>\0"` followed by the
//! payload, so a blob hashed here has the same id a git object database
//! would give it. The declared length is part of the hashed header and must
//! match the payload actually consumed.

pub mod hasher;

pub use hasher::{HashComputer, HashError, HashResult, ObjectHasher, Sha1Computer};
