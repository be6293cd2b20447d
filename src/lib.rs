// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod fs;
pub mod logging;
pub mod parse;
pub mod scan;
pub mod special;
pub mod task;
pub mod tree;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::{CoreExplorer, ExplorerEvent, Runtime, RuntimeOptions};
use crate::fs::{FileSystem, RealFileSystem};
use crate::parse::ParserRegistry;
use crate::scan::RealParseBackend;
use crate::special::{FileUsageStore, UsageStore};
use crate::task::TreeId;
use crate::tree::{PrintSink, TreeItem};
use crate::watch::path_utils::owning_project;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - parser registry and usage store
/// - core explorer and runtime
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let roots = resolve_roots(fs.as_ref(), &args.roots, &config_path)?;
    info!(?roots, "project folders");

    let registry = Arc::new(ParserRegistry::new()?);

    // Usage lives next to the first project folder.
    let usage_store = FileUsageStore::new(&roots[0], Arc::clone(&fs));
    let snapshot = usage_store.load()?;
    let usage_path = usage_store.location();

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<ExplorerEvent>(256);

    let backend = RealParseBackend::new(Arc::clone(&registry), Arc::clone(&fs), rt_tx.clone());

    // Optional file watcher (disabled in --once mode).
    let _watcher_handle = if !args.once {
        Some(crate::watch::spawn_watcher(&roots, rt_tx.clone())?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(ExplorerEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions {
        exit_when_idle: args.once,
    };

    // Construct the pure core (single source of truth for semantics).
    let core = CoreExplorer::new(cfg, roots.clone(), registry, snapshot, usage_path, options)?;

    // Construct the async IO shell around the core.
    let mut runtime = Runtime::new(
        core,
        rt_rx,
        backend,
        fs.clone(),
        Box::new(usage_store),
        Box::new(PrintSink),
    );
    match fs.canonicalize(&config_path) {
        Ok(path) if owning_project(&roots, &path).is_some() => {
            runtime = runtime.with_config_path(path);
        }
        _ => debug!(?config_path, "config file not under a project folder; not reloading"),
    }

    let core = runtime.run().await?;
    print_tree(&core);
    Ok(())
}

/// Project folders to scan.
///
/// - Every `--root` given on the command line, canonicalised.
/// - Otherwise the directory holding the config file, if it has one
///   (e.g. "configs/Taskexplorer.toml").
/// - Otherwise the current working directory.
fn resolve_roots(fs: &dyn FileSystem, args: &[String], config_path: &Path) -> Result<Vec<PathBuf>> {
    let candidates: Vec<PathBuf> = if args.is_empty() {
        vec![config_root_dir(config_path)]
    } else {
        args.iter().map(PathBuf::from).collect()
    };

    let mut roots = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let root = fs
            .canonicalize(&candidate)
            .with_context(|| format!("resolving project folder {:?}", candidate))?;
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    Ok(roots)
}

fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && parent.exists() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Print the tree followed by the special folders.
///
/// Task files only hold visible tasks, so nothing is filtered here.
fn print_tree(core: &CoreExplorer) {
    let map = core.map();
    for project in core.tree().projects() {
        if project.is_empty() {
            continue;
        }
        println!("{} ({})", project.name, project.path.display());
        for file in project.files() {
            println!("  [{}] {}", file.key.format, file.label);
            print_items(&file.children, 2);
        }
    }

    let special = core.special();
    print_special("Favorites", &special.favorites(map), core);
    print_special("Last Tasks", &special.last_tasks(map), core);
    print_special("Famous Tasks", &special.famous(map), core);
    print_special("User Tasks", &special.user_tasks(map), core);
}

fn print_items(items: &[TreeItem], depth: usize) {
    let indent = "  ".repeat(depth);
    for item in items {
        match item {
            TreeItem::Task { label, .. } => println!("{indent}- {label}"),
            TreeItem::Group(group) => {
                println!("{indent}+ {}", group.label);
                print_items(&group.children, depth + 1);
            }
        }
    }
}

fn print_special(title: &str, ids: &[TreeId], core: &CoreExplorer) {
    if ids.is_empty() {
        return;
    }
    println!("{title}");
    for id in ids {
        if let Some(node) = core.map().get(id) {
            println!("  - {} ({})", node.definition.name, node.definition.file);
        }
    }
}

/// Simple dry-run output: the effective settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("taskexplorer dry-run");
    let formats: Vec<String> = cfg.enabled_formats().iter().map(|f| f.to_string()).collect();
    println!("  config.enabled_formats = {:?}", formats);
    println!("  config.exclude = {:?}", cfg.config.exclude);
    println!("  config.exclude_tasks = {:?}", cfg.config.exclude_tasks);
    println!("  config.debounce_ms = {}", cfg.config.debounce_ms);
    if !cfg.config.tool_discovery.is_empty() {
        println!("  config.tool_discovery = {:?}", cfg.config.tool_discovery);
    }
    if let Some(ref path) = cfg.config.user_tasks_file {
        println!("  config.user_tasks_file = {}", path.display());
    }
    println!();

    match cfg.group.active_separator() {
        Some(sep) => println!("group: separator {sep:?}, max_level {}", cfg.group.max_level),
        None => println!("group: off"),
    }
    println!(
        "special_folders: last {} / famous {}",
        cfg.special_folders.num_last_tasks, cfg.special_folders.num_famous
    );

    if !cfg.path_to_programs().is_empty() {
        println!("path_to_programs:");
        for (format, program) in cfg.path_to_programs() {
            println!("  - {format}: {program}");
        }
    }

    debug!("dry-run complete (nothing scanned)");
}
