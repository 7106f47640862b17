use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use wts_crypto::{HashComputer, Sha1Computer};
use wts_index::{IndexSnapshot, PersistedIndex};
use wts_store::{LayeredObjectStore, ObjectStore};
use wts_types::{ObjectId, ObjectKind};
use wts_worktree::{
    compute_status, record_index, OsFilesystem, SubmoduleMap, TreeNode, WalkContext,
    WorktreeConfig,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Status(args) => cmd_status(args, format),
        Command::Index(args) => cmd_index(args, format),
        Command::HashObject(args) => cmd_hash_object(args, format),
        Command::Lookup(args) => cmd_lookup(args, format),
        Command::Alternates(args) => cmd_alternates(args, format),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WorktreeConfig> {
    match path {
        Some(path) => WorktreeConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(WorktreeConfig::default()),
    }
}

fn parse_submodules(args: &[String]) -> anyhow::Result<SubmoduleMap> {
    args.iter()
        .map(|arg| {
            let (path, commit) = arg
                .split_once('=')
                .with_context(|| format!("expected PATH=COMMIT, got {arg:?}"))?;
            let commit: ObjectId = commit
                .parse()
                .with_context(|| format!("invalid commit id for submodule {path}"))?;
            Ok((path.trim_end_matches('/').to_string(), commit))
        })
        .collect()
}

fn walk_root(args: &WalkArgs, index: Option<Arc<IndexSnapshot>>) -> anyhow::Result<TreeNode> {
    if !args.root.is_dir() {
        bail!("{} is not a directory", args.root.display());
    }
    let config = load_config(args.config.as_deref())?;
    let mut options = config.walk_options();
    options.auto_crlf |= args.auto_crlf;
    debug!(
        root = %args.root.display(),
        auto_crlf = options.auto_crlf,
        submodules = args.submodules.len(),
        indexed = index.is_some(),
        "starting walk"
    );

    let mut ctx = WalkContext::new(Arc::new(OsFilesystem::new(&args.root)))
        .with_submodules(parse_submodules(&args.submodules)?)
        .with_options(options);
    if let Some(index) = index {
        ctx = ctx.with_index(index);
    }
    Ok(ctx.into_root())
}

fn cmd_status(args: StatusArgs, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = match &args.index {
        Some(path) => {
            let index = PersistedIndex::load(path)
                .with_context(|| format!("reading index {}", path.display()))?;
            IndexSnapshot::from_index(&index)
        }
        None => IndexSnapshot::default(),
    };
    let snapshot = Arc::new(snapshot);
    let root = walk_root(&args.walk, Some(Arc::clone(&snapshot)))?;
    let status = compute_status(&root, &snapshot).context("walking working tree")?;

    if format == OutputFormat::Json {
        return print_json(&status);
    }
    if status.is_clean() {
        println!("Working directory clean.");
        return Ok(());
    }
    for path in &status.modified {
        println!("  {} {}", "modified:".yellow(), path);
    }
    for path in &status.deleted {
        println!("  {}  {}", "deleted:".red(), path);
    }
    for path in &status.untracked {
        println!("  {} {}", "untracked:".red(), path);
    }
    Ok(())
}

fn cmd_index(args: IndexArgs, format: OutputFormat) -> anyhow::Result<()> {
    let root = walk_root(&args.walk, None)?;
    let index = record_index(&root).context("hashing working tree")?;
    index
        .save(&args.output)
        .with_context(|| format!("writing index {}", args.output.display()))?;

    #[derive(Serialize)]
    struct Recorded<'a> {
        path: &'a Path,
        entries: usize,
    }
    if format == OutputFormat::Json {
        return print_json(&Recorded {
            path: &args.output,
            entries: index.len(),
        });
    }
    println!(
        "{} Recorded {} entries in {}",
        "✓".green().bold(),
        index.len().to_string().bold(),
        args.output.display()
    );
    Ok(())
}

fn cmd_hash_object(args: HashObjectArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = if args.symlink {
        let target = fs::read_link(&args.path)
            .with_context(|| format!("reading symlink {}", args.path.display()))?;
        let target = target
            .to_str()
            .with_context(|| format!("symlink target of {} is not UTF-8", args.path.display()))?;
        Sha1Computer.compute_bytes(ObjectKind::Blob, target.as_bytes())?
    } else {
        let mut file = fs::File::open(&args.path)
            .with_context(|| format!("opening {}", args.path.display()))?;
        let len = file.metadata()?.len();
        Sha1Computer.compute(ObjectKind::Blob, len, &mut file)?
    };

    #[derive(Serialize)]
    struct Hashed<'a> {
        path: &'a Path,
        id: String,
    }
    if format == OutputFormat::Json {
        return print_json(&Hashed {
            path: &args.path,
            id: id.to_hex(),
        });
    }
    println!("{id}");
    Ok(())
}

fn open_store(args: &StoreArgs) -> anyhow::Result<LayeredObjectStore> {
    let config = load_config(args.config.as_deref())?;
    LayeredObjectStore::open(&args.objects, config.alternates)
        .with_context(|| format!("opening object store {}", args.objects.display()))
}

fn cmd_lookup(args: LookupArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id: ObjectId = args
        .id
        .parse()
        .with_context(|| format!("invalid object id {:?}", args.id))?;
    let store = open_store(&args.store)?;
    let Some(object) = store.read(&id)? else {
        bail!("object {id} not found in {} or its alternates", args.store.objects.display());
    };

    #[derive(Serialize)]
    struct Found {
        id: String,
        kind: String,
        size: u64,
    }
    if format == OutputFormat::Json {
        return print_json(&Found {
            id: id.to_hex(),
            kind: object.kind.to_string(),
            size: object.size,
        });
    }
    println!("{} {} {}", id.to_string().yellow(), object.kind, object.size);
    Ok(())
}

fn cmd_alternates(args: AlternatesArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(&args.store)?;
    let chain = store.alternates()?;

    if format == OutputFormat::Json {
        return print_json(&chain.locations());
    }
    println!("{} {}", "primary:".bold(), store.primary().location().display());
    if chain.is_empty() {
        println!("No alternates.");
    }
    for (i, location) in chain.locations().iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan(), location.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submodule_specs_parse() {
        let map = parse_submodules(&[
            "vendor/lib/=0123456789abcdef0123456789abcdef01234567".to_string(),
        ])
        .unwrap();
        assert_eq!(
            map["vendor/lib"].to_hex(),
            "0123456789abcdef0123456789abcdef01234567"
        );
    }

    #[test]
    fn bad_submodule_specs_are_rejected() {
        assert!(parse_submodules(&["no-separator".to_string()]).is_err());
        assert!(parse_submodules(&["path=nothex".to_string()]).is_err());
    }
}
