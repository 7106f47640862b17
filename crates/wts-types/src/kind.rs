use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of object held by a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw content (file contents, symlink targets).
    Blob,
    /// Directory listing mapping names to object references.
    Tree,
    /// Snapshot of a tree plus its history links.
    Commit,
    /// Annotated reference to another object.
    Tag,
}

impl ObjectKind {
    /// The name used in the canonical object header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            "tag" => Ok(Self::Tag),
            other => Err(TypeError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names() {
        assert_eq!(ObjectKind::Blob.to_string(), "blob");
        assert_eq!("commit".parse::<ObjectKind>().unwrap(), ObjectKind::Commit);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(
            "pack".parse::<ObjectKind>(),
            Err(TypeError::UnknownKind("pack".into()))
        );
    }
}
