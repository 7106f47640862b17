//! In-memory filesystem for walk tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Cursor};
use std::sync::Mutex;

use wts_types::{ModTime, OsFileKind, OsMode};

use crate::fs::{FileInfo, Filesystem, ReadSeek};

#[derive(Clone, Debug)]
enum MemEntry {
    File { data: Vec<u8>, perm: u32 },
    Dir,
    Symlink { target: String },
    Socket,
}

/// Filesystem held in memory that counts every open and link read.
///
/// With [`strict`](MemFs::strict) set, opening or reading the same path a
/// second time fails, which proves a walk does not re-read content.
#[derive(Default)]
pub struct MemFs {
    entries: Mutex<BTreeMap<String, (MemEntry, ModTime)>>,
    reads: Mutex<HashMap<String, usize>>,
    unreadable: HashSet<String>,
    strict: bool,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn file(self, path: &str, data: &[u8], mtime: ModTime) -> Self {
        self.insert(path, MemEntry::File { data: data.to_vec(), perm: 0o644 }, mtime)
    }

    pub fn executable(self, path: &str, data: &[u8], mtime: ModTime) -> Self {
        self.insert(path, MemEntry::File { data: data.to_vec(), perm: 0o755 }, mtime)
    }

    pub fn dir(self, path: &str) -> Self {
        self.insert(path, MemEntry::Dir, ModTime::new(1, 0))
    }

    pub fn symlink(self, path: &str, target: &str) -> Self {
        self.insert(path, MemEntry::Symlink { target: target.to_string() }, ModTime::new(1, 0))
    }

    pub fn socket(self, path: &str) -> Self {
        self.insert(path, MemEntry::Socket, ModTime::new(1, 0))
    }

    /// Listing `path` fails with a permission error.
    pub fn unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(path.to_string());
        self
    }

    fn insert(self, path: &str, entry: MemEntry, mtime: ModTime) -> Self {
        {
            let mut entries = self.entries.lock().expect("lock poisoned");
            let mut parent = path;
            while let Some((up, _)) = parent.rsplit_once('/') {
                entries.entry(up.to_string()).or_insert((MemEntry::Dir, ModTime::new(1, 0)));
                parent = up;
            }
            entries.insert(path.to_string(), (entry, mtime));
        }
        self
    }

    /// Overwrite file bytes without touching size or mtime.
    pub fn corrupt(&self, path: &str) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        if let Some((MemEntry::File { data, .. }, _)) = entries.get_mut(path) {
            for b in data.iter_mut() {
                *b = b.wrapping_add(1);
            }
        }
    }

    /// Replace file bytes after a listing has already been taken.
    pub fn write(&self, path: &str, new_data: &[u8]) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        if let Some((MemEntry::File { data, .. }, _)) = entries.get_mut(path) {
            *data = new_data.to_vec();
        }
    }

    pub fn remove(&self, path: &str) {
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.retain(|p, _| p != path && !p.starts_with(&format!("{path}/")));
    }

    /// Times `path` was opened or had its link target read.
    pub fn reads(&self, path: &str) -> usize {
        self.reads.lock().expect("lock poisoned").get(path).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().expect("lock poisoned").values().sum()
    }

    fn record_read(&self, path: &str) -> io::Result<()> {
        let mut reads = self.reads.lock().expect("lock poisoned");
        let count = reads.entry(path.to_string()).or_insert(0);
        *count += 1;
        if self.strict && *count > 1 {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{path} read twice")));
        }
        Ok(())
    }

    fn not_found(path: &str) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, path.to_string())
    }
}

impl Filesystem for MemFs {
    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        if self.unreadable.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, path.to_string()));
        }
        let entries = self.entries.lock().expect("lock poisoned");
        if !path.is_empty() && !matches!(entries.get(path), Some((MemEntry::Dir, _))) {
            return Err(Self::not_found(path));
        }
        let infos = entries
            .iter()
            .filter_map(|(p, (entry, mtime))| {
                let name = if path.is_empty() {
                    p.as_str()
                } else {
                    p.strip_prefix(path)?.strip_prefix('/')?
                };
                if name.contains('/') {
                    return None;
                }
                let (mode, size) = match entry {
                    MemEntry::File { data, perm } => (OsMode::file(*perm), data.len() as u64),
                    MemEntry::Dir => (OsMode::dir(), 4096),
                    MemEntry::Symlink { target } => (OsMode::symlink(), target.len() as u64),
                    MemEntry::Socket => (OsMode::new(OsFileKind::Socket, 0o755), 0),
                };
                Some(FileInfo {
                    name: name.to_string(),
                    mode,
                    size,
                    modified: *mtime,
                })
            })
            .collect();
        Ok(infos)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn ReadSeek>> {
        self.record_read(path)?;
        let entries = self.entries.lock().expect("lock poisoned");
        match entries.get(path) {
            Some((MemEntry::File { data, .. }, _)) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "not a file")),
            None => Err(Self::not_found(path)),
        }
    }

    fn read_link(&self, path: &str) -> io::Result<String> {
        self.record_read(path)?;
        let entries = self.entries.lock().expect("lock poisoned");
        match entries.get(path) {
            Some((MemEntry::Symlink { target }, _)) => Ok(target.clone()),
            Some(_) => Err(io::Error::new(io::ErrorKind::Other, "not a symlink")),
            None => Err(Self::not_found(path)),
        }
    }
}
