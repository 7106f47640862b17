//! The filesystem a walk reads from.
//!
//! Paths are slash-separated and relative to the root of the working tree;
//! the root itself is the empty path.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::warn;
use wts_types::{ModTime, OsFileKind, OsMode};

/// One entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub mode: OsMode,
    pub size: u64,
    /// Zero when the filesystem does not report a modification time.
    pub modified: ModTime,
}

impl FileInfo {
    pub fn is_dir(&self) -> bool {
        self.mode.kind == OsFileKind::Dir
    }
}

/// A readable, rewindable byte stream.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Read-only access to a working tree.
///
/// A missing path must be reported as [`io::ErrorKind::NotFound`]; walks
/// treat it differently from every other failure. An entry that disappears
/// while its directory is being listed is left out of the listing instead.
pub trait Filesystem: Send + Sync {
    /// List `path`, without following symlinks, sorted by name.
    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>>;

    /// Open a regular file for reading.
    fn open(&self, path: &str) -> io::Result<Box<dyn ReadSeek>>;

    /// Read the target of a symlink.
    fn read_link(&self, path: &str) -> io::Result<String>;
}

/// Join a child name onto a walk path.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// [`Filesystem`] over a directory of the local filesystem.
#[derive(Clone, Debug)]
pub struct OsFilesystem {
    root: PathBuf,
}

impl OsFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

impl Filesystem for OsFilesystem {
    fn read_dir(&self, path: &str) -> io::Result<Vec<FileInfo>> {
        let mut infos = Vec::new();
        for entry in fs::read_dir(self.resolve(path))? {
            let listed = entry.and_then(|entry| Ok((entry.file_name(), entry.metadata()?)));
            infos.extend(listing_entry(listed)?);
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(fs::File::open(self.resolve(path))?))
    }

    fn read_link(&self, path: &str) -> io::Result<String> {
        let target = fs::read_link(self.resolve(path))?;
        target.into_os_string().into_string().map_err(|raw| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("non UTF-8 symlink target {raw:?}"),
            )
        })
    }
}

/// Describe one listed entry.
///
/// `Ok(None)` drops the entry: it was removed after the directory was read,
/// or its name is not UTF-8. Any other failure fails the listing.
fn listing_entry(listed: io::Result<(OsString, fs::Metadata)>) -> io::Result<Option<FileInfo>> {
    let (name, meta) = match listed {
        Ok(listed) => listed,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let name = match name.into_string() {
        Ok(name) => name,
        Err(raw) => {
            warn!(name = ?raw, "skipping entry with non UTF-8 name");
            return Ok(None);
        }
    };
    Ok(Some(FileInfo {
        name,
        mode: os_mode(&meta),
        size: meta.len(),
        modified: meta.modified().map(ModTime::from).unwrap_or_default(),
    }))
}

#[cfg(unix)]
fn os_mode(meta: &fs::Metadata) -> OsMode {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    let ft = meta.file_type();
    let kind = if ft.is_symlink() {
        OsFileKind::Symlink
    } else if ft.is_dir() {
        OsFileKind::Dir
    } else if ft.is_file() {
        OsFileKind::File
    } else if ft.is_socket() {
        OsFileKind::Socket
    } else {
        OsFileKind::Other
    };
    OsMode::new(kind, meta.permissions().mode())
}

#[cfg(not(unix))]
fn os_mode(meta: &fs::Metadata) -> OsMode {
    let ft = meta.file_type();
    if ft.is_symlink() {
        OsMode::symlink()
    } else if ft.is_dir() {
        OsMode::dir()
    } else if ft.is_file() {
        OsMode::file(if meta.permissions().readonly() { 0o444 } else { 0o644 })
    } else {
        OsMode::new(OsFileKind::Other, 0)
    }
}
