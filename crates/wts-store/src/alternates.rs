//! Alternate object stores.
//!
//! A store may declare other stores it can read objects from, one path per
//! line in `objects/info/alternates`. Each alternate may declare further
//! alternates. [`AlternateChain::resolve`] flattens that graph into an
//! ordered list: depth-first, in declaration order, each store at most once.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AlternateError, StoreError, StoreResult};
use crate::loose::{LooseObjectStore, ALTERNATES_FILE};
use crate::traits::ObjectStore;

/// Reference to one physical object store and where it lives.
///
/// `location` is canonical; two handles with the same location are the same
/// store.
#[derive(Clone)]
pub struct StoreHandle {
    location: PathBuf,
    store: Arc<dyn ObjectStore>,
}

impl StoreHandle {
    pub fn new(location: impl Into<PathBuf>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            location: location.into(),
            store,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("location", &self.location)
            .finish()
    }
}

/// Limits applied while resolving alternates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternatesConfig {
    /// Deepest level of alternates followed. The primary's own alternates
    /// are level 1; declarations below this level are ignored.
    pub max_depth: usize,
}

impl Default for AlternatesConfig {
    fn default() -> Self {
        Self { max_depth: 5 }
    }
}

/// Locates and opens the stores a store declares as alternates.
pub trait StoreResolver: Send + Sync {
    /// Paths declared by `store`, in declaration order.
    ///
    /// A store without a declaration has no alternates. A declaration that
    /// cannot be parsed is an error.
    fn declared_alternates(&self, store: &StoreHandle) -> Result<Vec<PathBuf>, AlternateError>;

    /// Open the store at `path`, which `declared_in` listed.
    fn open(&self, path: &Path, declared_in: &Path) -> Result<StoreHandle, AlternateError>;
}

/// Resolver for loose-object directories on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStoreResolver;

impl FsStoreResolver {
    /// Open `path` as a primary store, canonicalizing its location.
    pub fn open_primary(&self, path: &Path) -> StoreResult<StoreHandle> {
        let location =
            fs::canonicalize(path).map_err(|_| StoreError::MissingStore(path.to_path_buf()))?;
        let store = LooseObjectStore::open(&location)?;
        Ok(StoreHandle::new(location, Arc::new(store)))
    }
}

impl StoreResolver for FsStoreResolver {
    fn declared_alternates(&self, store: &StoreHandle) -> Result<Vec<PathBuf>, AlternateError> {
        let path = store.location().join(ALTERNATES_FILE);
        match fs::read(&path) {
            Ok(bytes) => parse_alternates(&bytes, store.location(), &path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AlternateError::Unreadable {
                store: store.location().to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    fn open(&self, path: &Path, declared_in: &Path) -> Result<StoreHandle, AlternateError> {
        let dangling = || AlternateError::Dangling {
            path: path.to_path_buf(),
            declared_in: declared_in.to_path_buf(),
        };
        let location = fs::canonicalize(path).map_err(|_| dangling())?;
        let store = LooseObjectStore::open(&location).map_err(|_| dangling())?;
        Ok(StoreHandle::new(location, Arc::new(store)))
    }
}

/// Parse an alternates declaration.
///
/// Blank lines and lines starting with `#` are skipped. A line starting with
/// `"` is a C-style quoted path. Relative paths are taken relative to `base`,
/// the objects directory that holds the declaration.
pub fn parse_alternates(
    bytes: &[u8],
    base: &Path,
    declared_in: &Path,
) -> Result<Vec<PathBuf>, AlternateError> {
    let mut paths = Vec::new();
    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let malformed = |reason: &str| AlternateError::Malformed {
            declared_in: declared_in.to_path_buf(),
            line: idx + 1,
            reason: reason.to_string(),
        };
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = std::str::from_utf8(raw).map_err(|_| malformed("not valid UTF-8"))?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        if line.contains('\0') {
            return Err(malformed("contains a NUL byte"));
        }
        let entry = if line.starts_with('"') {
            unquote_c_style(line).map_err(|reason| malformed(&reason))?
        } else {
            line.to_string()
        };
        let path = Path::new(&entry);
        paths.push(if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        });
    }
    Ok(paths)
}

fn unquote_c_style(quoted: &str) -> Result<String, String> {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| "unterminated quoted path".to_string())?;

    let mut out = Vec::with_capacity(inner.len());
    let mut bytes = inner.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'"' => return Err("unescaped quote inside quoted path".to_string()),
            b'\\' => {
                let esc = bytes
                    .next()
                    .ok_or_else(|| "dangling escape at end of path".to_string())?;
                let decoded = match esc {
                    b'\\' => b'\\',
                    b'"' => b'"',
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'v' => 0x0b,
                    b'0'..=b'3' => {
                        let mut value = u32::from(esc - b'0');
                        for _ in 0..2 {
                            match bytes.next() {
                                Some(d @ b'0'..=b'7') => value = value * 8 + u32::from(d - b'0'),
                                _ => return Err("truncated octal escape".to_string()),
                            }
                        }
                        value as u8
                    }
                    other => return Err(format!("unknown escape '\\{}'", other as char)),
                };
                out.push(decoded);
            }
            _ => out.push(b),
        }
    }
    String::from_utf8(out).map_err(|_| "quoted path is not valid UTF-8".to_string())
}

/// The flattened, ordered list of alternate stores behind a primary store.
#[derive(Clone, Debug, Default)]
pub struct AlternateChain {
    stores: Vec<StoreHandle>,
}

impl AlternateChain {
    /// Follow the alternates of `primary` transitively.
    ///
    /// A store reached a second time, including the primary itself, is
    /// skipped, which breaks cycles. Declarations deeper than
    /// `config.max_depth` are ignored with a warning.
    pub fn resolve(
        primary: &StoreHandle,
        resolver: &dyn StoreResolver,
        config: &AlternatesConfig,
    ) -> Result<Self, AlternateError> {
        let mut visited = HashSet::new();
        visited.insert(primary.location().to_path_buf());
        let mut stores = Vec::new();
        link(primary, 1, resolver, config, &mut visited, &mut stores)?;
        Ok(Self { stores })
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StoreHandle> {
        self.stores.iter()
    }

    pub fn locations(&self) -> Vec<&Path> {
        self.stores.iter().map(StoreHandle::location).collect()
    }
}

impl<'a> IntoIterator for &'a AlternateChain {
    type Item = &'a StoreHandle;
    type IntoIter = std::slice::Iter<'a, StoreHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn link(
    store: &StoreHandle,
    depth: usize,
    resolver: &dyn StoreResolver,
    config: &AlternatesConfig,
    visited: &mut HashSet<PathBuf>,
    stores: &mut Vec<StoreHandle>,
) -> Result<(), AlternateError> {
    let declared = resolver.declared_alternates(store)?;
    if declared.is_empty() {
        return Ok(());
    }
    if depth > config.max_depth {
        warn!(
            store = %store.location().display(),
            max_depth = config.max_depth,
            "ignoring alternates: nesting too deep"
        );
        return Ok(());
    }
    for path in declared {
        let handle = resolver.open(&path, store.location())?;
        if !visited.insert(handle.location().to_path_buf()) {
            debug!(
                alternate = %handle.location().display(),
                declared_in = %store.location().display(),
                "alternate already in chain, skipping"
            );
            continue;
        }
        stores.push(handle.clone());
        link(&handle, depth + 1, resolver, config, visited, stores)?;
    }
    Ok(())
}
