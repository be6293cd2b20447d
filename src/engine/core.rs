// src/engine/core.rs

//! Pure core state machine.
//!
//! `CoreExplorer` consumes [`ExplorerEvent`]s and produces:
//! - an updated task map, tree and special folders
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels and firing coalescer deadlines
//! - running discovery and parse requests
//! - persisting usage and publishing deltas
//!
//! The core owns no channels, no Tokio types, and performs no IO.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ConfigFile, ConfigStore};
use crate::engine::event_handlers::CoreStep;
use crate::engine::{ExplorerEvent, RuntimeOptions};
use crate::errors::Result;
use crate::filter::ExclusionFilter;
use crate::parse::ParserRegistry;
use crate::special::{SpecialCollections, SpecialSettings, UsageSnapshot};
use crate::task::{FileKey, TaskMap};
use crate::tree::{GroupSettings, TreeSynchronizer};
use crate::types::TaskFormat;
use crate::watch::EventCoalescer;

/// The user-level tasks file, tracked outside any project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UserTasks {
    pub(crate) project: PathBuf,
    pub(crate) path: PathBuf,
    pub(crate) key: FileKey,
}

/// Pure core state.
#[derive(Debug)]
pub struct CoreExplorer {
    pub(super) config: ConfigStore,
    pub(super) registry: Arc<ParserRegistry>,
    pub(super) filter: ExclusionFilter,
    pub(super) map: TaskMap,
    pub(super) sync: TreeSynchronizer,
    pub(super) special: SpecialCollections,
    pub(super) coalescer: EventCoalescer,
    pub(super) roots: Vec<PathBuf>,
    pub(super) usage_path: Option<PathBuf>,
    pub(super) user_tasks: Option<UserTasks>,
    pub(super) options: RuntimeOptions,
    pub(super) started: bool,
    pub(super) in_flight: HashMap<PathBuf, InFlight>,
}

/// A discover or parse pass the shell has not answered yet.
#[derive(Debug)]
pub(super) struct InFlight {
    pub(super) generation: u64,
    /// Coalescer stamp when the pass was issued.
    pub(super) stamp: u64,
    /// Files dispatched with the pass (empty for discovery).
    pub(super) files: Vec<(FileKey, PathBuf)>,
}

impl CoreExplorer {
    pub fn new(
        config: ConfigFile,
        roots: Vec<PathBuf>,
        registry: Arc<ParserRegistry>,
        snapshot: UsageSnapshot,
        usage_path: Option<PathBuf>,
        options: RuntimeOptions,
    ) -> Result<Self> {
        let filter = ExclusionFilter::from_config(&config)?;
        let sync = TreeSynchronizer::new(GroupSettings::from_config(&config));
        let special = SpecialCollections::new(snapshot, SpecialSettings::from_config(&config));
        let coalescer = EventCoalescer::new(config.debounce());

        Ok(Self {
            config: ConfigStore::new(config),
            registry,
            filter,
            map: TaskMap::new(),
            sync,
            special,
            coalescer,
            roots,
            usage_path,
            user_tasks: None,
            options,
            started: false,
            in_flight: HashMap::new(),
        })
    }

    /// Kick off the initial scan of every root (and the user tasks file).
    pub fn start(&mut self, now: Instant) -> CoreStep {
        let mut commands = Vec::new();
        let formats = self.active_formats();
        for root in self.roots.clone() {
            commands.push(self.discover_command(&root, &root, formats.clone()));
        }
        commands.extend(self.load_user_tasks());
        self.started = true;
        self.finish_step(commands, now)
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: ExplorerEvent, now: Instant) -> CoreStep {
        let commands = match event {
            ExplorerEvent::Fs(event) => self.on_fs_event(event, now),
            ExplorerEvent::Tick => self.on_tick(now),
            ExplorerEvent::Discovered {
                scope,
                project,
                generation,
                formats,
                files,
            } => self.on_discovered(scope, project, generation, formats, files),
            ExplorerEvent::DiscoveryFailed {
                scope,
                generation,
                message,
            } => self.on_discovery_failed(scope, generation, message),
            ExplorerEvent::Parsed(batch) => self.on_parsed(batch),
            ExplorerEvent::ConfigUpdated(raw) => self.on_config_updated(raw, now),
            ExplorerEvent::ExcludeTask(id) => self.on_exclude_task(&id),
            ExplorerEvent::ExcludeFile { project, rel_path } => {
                self.on_exclude_file(&project, &rel_path)
            }
            ExplorerEvent::ToggleFavorite(id) => self.on_toggle_favorite(&id),
            ExplorerEvent::TogglePinned(id) => self.on_toggle_pinned(&id),
            ExplorerEvent::RunStarted(id) => self.on_run_started(&id),
            ExplorerEvent::RunCompleted {
                id,
                duration_ms,
                at,
            } => self.on_run_completed(&id, duration_ms, at),
            ExplorerEvent::ShutdownRequested => {
                return CoreStep {
                    commands: self.flush_usage(now),
                    keep_running: false,
                };
            }
        };
        self.finish_step(commands, now)
    }

    pub fn config(&self) -> &ConfigFile {
        self.config.current()
    }

    pub fn registry(&self) -> &Arc<ParserRegistry> {
        &self.registry
    }

    pub fn filter(&self) -> &ExclusionFilter {
        &self.filter
    }

    pub fn map(&self) -> &TaskMap {
        &self.map
    }

    pub fn tree(&self) -> &TreeSynchronizer {
        &self.sync
    }

    pub fn special(&self) -> &SpecialCollections {
        &self.special
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// When the shell should deliver the next `Tick`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.coalescer.next_deadline()
    }

    /// Initial scan dispatched and no pass pending or in flight.
    pub fn is_idle(&self) -> bool {
        self.started && self.coalescer.is_idle()
    }

    /// Formats whose files are scanned: enabled ones plus disabled ones
    /// that were already loaded (kept hidden).
    pub(super) fn active_formats(&self) -> Vec<TaskFormat> {
        let cfg = self.config.current();
        TaskFormat::ALL
            .into_iter()
            .filter(|f| cfg.is_enabled(*f) || self.map.has_format(*f))
            .collect()
    }

    pub(super) fn project_for(&self, path: &Path) -> Option<PathBuf> {
        crate::watch::path_utils::owning_project(&self.roots, path).cloned()
    }
}
