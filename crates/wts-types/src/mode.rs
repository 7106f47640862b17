//! File modes as recorded in trees and the index, and their translation
//! from what the operating system reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// File mode of a tree or index entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// No mode; only used for absent entries.
    Empty,
    /// Subtree / directory (0o040000).
    Dir,
    /// Normal file (0o100644).
    Regular,
    /// Group-writable file written by very old tools (0o100664).
    Deprecated,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Nested repository pinned at a commit (0o160000).
    Submodule,
}

impl FileMode {
    /// Octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Dir => 0o040000,
            Self::Regular => 0o100644,
            Self::Deprecated => 0o100664,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Submodule => 0o160000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(Self::Empty),
            0o040000 => Some(Self::Dir),
            0o100644 => Some(Self::Regular),
            0o100664 => Some(Self::Deprecated),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o160000 => Some(Self::Submodule),
            _ => None,
        }
    }

    /// Four-byte little-endian encoding appended to content identifiers.
    pub fn to_bytes(&self) -> [u8; 4] {
        self.mode_bits().to_le_bytes()
    }

    /// Translate an operating-system mode.
    ///
    /// Regular files map to `Executable` when any execute bit is set.
    /// Sockets, pipes and devices have no equivalent and are rejected.
    pub fn from_os(mode: OsMode) -> Result<Self, TypeError> {
        match mode.kind {
            OsFileKind::Dir => Ok(Self::Dir),
            OsFileKind::Symlink => Ok(Self::Symlink),
            OsFileKind::File if mode.perm & 0o111 != 0 => Ok(Self::Executable),
            OsFileKind::File => Ok(Self::Regular),
            OsFileKind::Socket | OsFileKind::Other => {
                Err(TypeError::UnsupportedMode(format!("{mode}")))
            }
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:07o}", self.mode_bits())
    }
}

/// The file type reported by the operating system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OsFileKind {
    File,
    Dir,
    Symlink,
    Socket,
    /// Named pipes, block and character devices.
    Other,
}

/// Type and permission bits of a directory entry, as observed on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OsMode {
    pub kind: OsFileKind,
    /// Permission bits (`0o777` mask).
    pub perm: u32,
}

impl OsMode {
    pub fn new(kind: OsFileKind, perm: u32) -> Self {
        Self {
            kind,
            perm: perm & 0o777,
        }
    }

    pub fn file(perm: u32) -> Self {
        Self::new(OsFileKind::File, perm)
    }

    pub fn dir() -> Self {
        Self::new(OsFileKind::Dir, 0o755)
    }

    pub fn symlink() -> Self {
        Self::new(OsFileKind::Symlink, 0o777)
    }
}

impl fmt::Display for OsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:03o}", self.kind, self.perm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_bits_roundtrip() {
        for mode in [
            FileMode::Empty,
            FileMode::Dir,
            FileMode::Regular,
            FileMode::Deprecated,
            FileMode::Executable,
            FileMode::Symlink,
            FileMode::Submodule,
        ] {
            assert_eq!(FileMode::from_mode_bits(mode.mode_bits()), Some(mode));
        }
        assert_eq!(FileMode::from_mode_bits(0o100600), None);
    }

    #[test]
    fn bytes_are_little_endian() {
        assert_eq!(FileMode::Regular.to_bytes(), 0o100644u32.to_le_bytes());
        assert_eq!(FileMode::Empty.to_bytes(), [0, 0, 0, 0]);
    }

    #[test]
    fn os_translation() {
        assert_eq!(FileMode::from_os(OsMode::file(0o644)), Ok(FileMode::Regular));
        assert_eq!(FileMode::from_os(OsMode::file(0o744)), Ok(FileMode::Executable));
        assert_eq!(FileMode::from_os(OsMode::file(0o640)), Ok(FileMode::Regular));
        assert_eq!(FileMode::from_os(OsMode::dir()), Ok(FileMode::Dir));
        assert_eq!(FileMode::from_os(OsMode::symlink()), Ok(FileMode::Symlink));
    }

    #[test]
    fn special_files_have_no_mode() {
        let socket = OsMode::new(OsFileKind::Socket, 0o755);
        assert!(matches!(
            FileMode::from_os(socket),
            Err(TypeError::UnsupportedMode(_))
        ));
        let fifo = OsMode::new(OsFileKind::Other, 0o644);
        assert!(FileMode::from_os(fifo).is_err());
    }

    #[test]
    fn display_is_octal() {
        assert_eq!(FileMode::Regular.to_string(), "0100644");
        assert_eq!(FileMode::Dir.to_string(), "0040000");
    }
}
