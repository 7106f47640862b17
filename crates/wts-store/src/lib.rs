//! Content-addressed object storage with transitive alternates.
//!
//! Objects are identified by the SHA-1 of `"<kind> <len>\0<payload>"`. A
//! store may borrow objects from other stores it declares as alternates;
//! [`LayeredObjectStore`] presents a primary store and its whole alternate
//! chain as one store.
//!
//! # Key Types
//!
//! - [`ObjectStore`] -- read/write/exists over content-addressed objects
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`LooseObjectStore`] -- one file per object under an `objects/` directory
//! - [`AlternateChain`] -- the flattened, cycle-free list of alternates
//! - [`LayeredObjectStore`] -- primary store plus its cached alternate chain
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. A store's alternate chain is resolved at most once per instance.
//! 3. Lookups try the primary first, then alternates in chain order.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod alternates;
pub mod error;
pub mod layered;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

pub use alternates::{
    parse_alternates, AlternateChain, AlternatesConfig, FsStoreResolver, StoreHandle,
    StoreResolver,
};
pub use error::{AlternateError, StoreError, StoreResult};
pub use layered::LayeredObjectStore;
pub use loose::{LooseObjectStore, ALTERNATES_FILE};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, StoredObject};
pub use traits::ObjectStore;
