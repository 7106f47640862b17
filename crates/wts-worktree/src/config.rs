//! Walk options and the on-disk configuration file they can come from.
//!
//! ```toml
//! [core]
//! auto_crlf = true
//!
//! [status]
//! ignore = ["target", "node_modules"]
//!
//! [alternates]
//! max_depth = 5
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wts_store::AlternatesConfig;

use crate::error::WorktreeResult;

/// Name of the metadata directory every walk skips.
pub const METADATA_DIR: &str = ".git";

/// Entry names a walk never descends into or reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl IgnoreSet {
    /// An ignore set that skips nothing.
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for IgnoreSet {
    fn default() -> Self {
        let mut set = Self::empty();
        set.insert(METADATA_DIR);
        set
    }
}

impl<S: Into<String>> Extend<S> for IgnoreSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        for name in iter {
            self.insert(name);
        }
    }
}

/// Options shared, read-only, by every node of one walk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Normalize CRLF to LF in text files before hashing.
    pub auto_crlf: bool,
    pub ignore: IgnoreSet,
}

/// `[core]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub auto_crlf: bool,
}

/// `[status]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Names skipped in addition to the metadata directory.
    pub ignore: Vec<String>,
}

/// Configuration file of the working-tree tools. Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorktreeConfig {
    pub core: CoreConfig,
    pub status: StatusConfig,
    pub alternates: AlternatesConfig,
}

impl WorktreeConfig {
    pub fn from_toml_str(text: &str) -> WorktreeResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> WorktreeResult<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn walk_options(&self) -> WalkOptions {
        let mut ignore = IgnoreSet::default();
        ignore.extend(self.status.ignore.iter().cloned());
        WalkOptions {
            auto_crlf: self.core.auto_crlf,
            ignore,
        }
    }
}
