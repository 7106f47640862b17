use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "wts",
    about = "Working-tree sync core: status, hashing and layered object lookup",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show modified, untracked and deleted paths against an index
    Status(StatusArgs),
    /// Hash a working tree and write an index for later status runs
    Index(IndexArgs),
    /// Print the blob id of a file or symlink
    HashObject(HashObjectArgs),
    /// Look an object up through a store and its alternates
    Lookup(LookupArgs),
    /// Print the resolved alternate chain of a store
    Alternates(AlternatesArgs),
}

/// Options shared by the commands that walk a working tree.
#[derive(Args)]
pub struct WalkArgs {
    /// Working tree root
    #[arg(default_value = ".")]
    pub root: PathBuf,
    /// Normalize CRLF to LF in text files before hashing
    #[arg(long)]
    pub auto_crlf: bool,
    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Treat PATH as a submodule checked out at COMMIT
    #[arg(long = "submodule", value_name = "PATH=COMMIT")]
    pub submodules: Vec<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub walk: WalkArgs,
    /// Index file to compare against and take the fast path from
    #[arg(long)]
    pub index: Option<PathBuf>,
}

#[derive(Args)]
pub struct IndexArgs {
    #[command(flatten)]
    pub walk: WalkArgs,
    /// Where to write the index
    #[arg(short, long, default_value = "wts.index")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct HashObjectArgs {
    pub path: PathBuf,
    /// Hash the target of a symlink instead of following it
    #[arg(long)]
    pub symlink: bool,
}

#[derive(Args)]
pub struct StoreArgs {
    /// Objects directory of the primary store
    #[arg(long)]
    pub objects: PathBuf,
    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct LookupArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Object id (40 hex digits)
    pub id: String,
}

#[derive(Args)]
pub struct AlternatesArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}
