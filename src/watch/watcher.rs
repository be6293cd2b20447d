// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::event::{CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::ExplorerEvent;
use crate::types::FsEventKind;
use crate::watch::coalescer::RawFsEvent;

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch every root recursively and forward normalised events into the
/// runtime channel. Debouncing is the coalescer's job, not the watcher's.
pub fn spawn_watcher(
    roots: &[PathBuf],
    runtime_tx: mpsc::Sender<ExplorerEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("taskexplorer: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("taskexplorer: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    for root in roots {
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("watching {:?}", root))?;
        info!("file watcher started on {:?}", root);
    }

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for raw in to_raw_events(&event) {
                if runtime_tx.send(ExplorerEvent::Fs(raw)).await.is_err() {
                    warn!("runtime channel closed; stopping watcher forwarding");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Translate one notify event into create/modify/remove events.
///
/// Renames become a remove of the old path and a create of the new one.
pub fn to_raw_events(event: &Event) -> Vec<RawFsEvent> {
    let paths = &event.paths;
    let raw = |path: &PathBuf, kind: FsEventKind, is_dir: bool| RawFsEvent {
        path: path.clone(),
        kind,
        is_dir: is_dir || (kind != FsEventKind::Remove && path.is_dir()),
    };

    match &event.kind {
        EventKind::Create(kind) => paths
            .iter()
            .map(|p| raw(p, FsEventKind::Create, *kind == CreateKind::Folder))
            .collect(),
        EventKind::Remove(kind) => paths
            .iter()
            .map(|p| raw(p, FsEventKind::Remove, *kind == RemoveKind::Folder))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => paths
            .iter()
            .map(|p| raw(p, FsEventKind::Remove, false))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => paths
            .iter()
            .map(|p| raw(p, FsEventKind::Create, false))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => vec![
            raw(&paths[0], FsEventKind::Remove, false),
            raw(&paths[1], FsEventKind::Create, false),
        ],
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => Vec::new(),
        EventKind::Modify(_) | EventKind::Any => paths
            .iter()
            .map(|p| raw(p, FsEventKind::Modify, false))
            .collect(),
        EventKind::Other => Vec::new(),
    }
}
