// src/engine/event_handlers.rs

//! Event handling logic for the core explorer.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::RawConfigFile;
use crate::engine::core::{CoreExplorer, InFlight, UserTasks};
use crate::scan::{FileJob, ParseBatch, ParseRequest};
use crate::special::{SpecialSettings, UsageSnapshot};
use crate::task::{FileKey, RuntimeState, TreeId, normalize_path};
use crate::tree::{ExplorerDelta, GroupSettings, SyncContext, TreeDelta};
use crate::types::{FsEventKind, TaskFormat};
use crate::watch::path_utils::relative_str;
use crate::watch::{DiscoveredFile, RawFsEvent, RecordOutcome, SyncAction, SyncRequest};

/// Ask the shell to walk `scope` for task files of `formats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverRequest {
    pub scope: PathBuf,
    pub project: PathBuf,
    pub generation: u64,
    pub formats: Vec<TaskFormat>,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Walk a scope; answer with `ExplorerEvent::Discovered`.
    Discover(DiscoverRequest),
    /// Parse files; answer with `ExplorerEvent::Parsed`.
    Parse(ParseRequest),
    /// Abandon the in-flight parse for a scope.
    CancelParse(PathBuf),
    /// Notify the tree-view consumer.
    Publish(ExplorerDelta),
    /// Persist the usage snapshot.
    SaveUsage(UsageSnapshot),
    /// Request that the process exits (used for `--once` when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `ExplorerEvent`.
#[derive(Debug)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreExplorer {
    pub(super) fn finish_step(&mut self, mut commands: Vec<CoreCommand>, now: Instant) -> CoreStep {
        commands.extend(self.flush_usage(now));

        if self.options.exit_when_idle && self.is_idle() {
            info!("initial scan complete and nothing pending; requesting exit");
            commands.push(CoreCommand::RequestExit);
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        CoreStep {
            commands,
            keep_running: true,
        }
    }

    pub(super) fn flush_usage(&mut self, now: Instant) -> Vec<CoreCommand> {
        let Some(snapshot) = self.special.take_dirty() else {
            return Vec::new();
        };
        if let Some(path) = &self.usage_path {
            self.coalescer.expect_write(path.clone(), now);
        }
        vec![CoreCommand::SaveUsage(snapshot)]
    }

    pub(super) fn discover_command(
        &mut self,
        project: &Path,
        scope: &Path,
        formats: Vec<TaskFormat>,
    ) -> CoreCommand {
        let generation = self.coalescer.begin(scope);
        let pass = InFlight {
            generation,
            stamp: self.coalescer.stamp(),
            files: Vec::new(),
        };
        self.in_flight.insert(scope.to_path_buf(), pass);
        debug!(?scope, generation, ?formats, "dispatching discovery");
        CoreCommand::Discover(DiscoverRequest {
            scope: scope.to_path_buf(),
            project: project.to_path_buf(),
            generation,
            formats,
        })
    }

    fn parse_command(&mut self, scope: PathBuf, jobs: Vec<FileJob>) -> CoreCommand {
        let generation = self.coalescer.begin(&scope);
        let files: Vec<(FileKey, PathBuf)> = jobs
            .iter()
            .map(|j| (j.key.clone(), j.path.clone()))
            .collect();
        for (key, _) in &files {
            self.sync.mark_parsing(key);
        }
        let pass = InFlight {
            generation,
            stamp: self.coalescer.stamp(),
            files,
        };
        self.in_flight.insert(scope.clone(), pass);
        debug!(?scope, generation, jobs = jobs.len(), "dispatching parse");
        CoreCommand::Parse(ParseRequest {
            scope,
            generation,
            jobs,
        })
    }

    fn file_job(&self, project: &Path, key: FileKey, path: PathBuf) -> FileJob {
        let cfg = self.config.current();
        let program = cfg
            .uses_tool_discovery(key.format)
            .then(|| cfg.program_for(key.format).to_string());
        FileJob {
            known_hash: self.sync.known_hash(&key),
            key,
            project: project.to_path_buf(),
            path,
            program,
        }
    }

    /// Close an in-flight scope. `None` means the result must be dropped.
    fn accept_result(&mut self, scope: &Path, generation: u64) -> Option<InFlight> {
        if self.in_flight.get(scope).map(|p| p.generation) != Some(generation) {
            debug!(?scope, generation, "result for a cancelled pass; dropping");
            return None;
        }
        let pass = self.in_flight.remove(scope)?;
        if self.coalescer.finish(scope, generation) {
            Some(pass)
        } else {
            for (key, _) in &pass.files {
                self.sync.abandon(key);
            }
            None
        }
    }

    /// Files of `pass` changed after it was issued. Their own request
    /// carries the newer contents.
    fn stale_files(&self, pass: &InFlight) -> Vec<FileKey> {
        pass.files
            .iter()
            .filter(|(_, path)| self.coalescer.touched_since(path, pass.stamp))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Reconcile special folders against removals and wrap up a delta.
    fn publish(&mut self, mut delta: ExplorerDelta) -> Vec<CoreCommand> {
        delta.special_changed |= self.special.reconcile(&self.map, delta.removed_ids());
        if delta.is_empty() {
            return Vec::new();
        }
        vec![CoreCommand::Publish(delta)]
    }

    fn publish_files(&mut self, files: Vec<TreeDelta>) -> Vec<CoreCommand> {
        let mut delta = ExplorerDelta::default();
        for file in files {
            delta.push_file(file);
        }
        self.publish(delta)
    }

    pub(super) fn load_user_tasks(&mut self) -> Vec<CoreCommand> {
        let cfg = self.config.current();
        let Some(path) = cfg.config.user_tasks_file.clone() else {
            self.user_tasks = None;
            self.special.set_user_tasks_file(None);
            return Vec::new();
        };

        let project = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "tasks.json".to_string());
        let key = FileKey::new(TaskFormat::Workspace, &project, &file_name);

        self.special.set_user_tasks_file(Some(key.clone()));
        self.user_tasks = Some(UserTasks {
            project: project.clone(),
            path: path.clone(),
            key: key.clone(),
        });

        info!(?path, "loading user tasks file");
        let job = self.file_job(&project, key, path.clone());
        vec![self.parse_command(path, vec![job])]
    }

    pub(super) fn on_fs_event(&mut self, event: RawFsEvent, now: Instant) -> Vec<CoreCommand> {
        let Some(project) = self.project_for(&event.path) else {
            debug!(path = ?event.path, "event outside every project; ignoring");
            return Vec::new();
        };

        if !event.is_dir && event.kind != FsEventKind::Remove {
            let rel = relative_str(&project, &event.path).unwrap_or_default();
            if self.registry.format_for_path(&rel).is_none() {
                return Vec::new();
            }
        }

        match self.coalescer.record(event, now) {
            RecordOutcome::Superseded { path } => {
                // The in-flight pass is stale; it is re-run once debounced.
                if let Some(pass) = self.in_flight.remove(&path) {
                    for (key, _) in &pass.files {
                        self.sync.abandon(key);
                    }
                }
                self.coalescer.cancel(&path);
                vec![CoreCommand::CancelParse(path)]
            }
            RecordOutcome::Queued { .. } | RecordOutcome::Ignored => Vec::new(),
        }
    }

    pub(super) fn on_tick(&mut self, now: Instant) -> Vec<CoreCommand> {
        let mut commands = Vec::new();
        for request in self.coalescer.due(now) {
            commands.extend(self.handle_request(request));
        }
        commands
    }

    fn handle_request(&mut self, request: SyncRequest) -> Vec<CoreCommand> {
        let Some(project) = self.project_for(&request.path) else {
            return Vec::new();
        };
        let rel = relative_str(&project, &request.path).unwrap_or_default();
        debug!(path = ?request.path, action = ?request.action, generation = request.generation, "sync request due");

        match request.action {
            SyncAction::Delete => {
                let removed = self.sync.remove_path(&mut self.map, &project, &rel);
                self.publish_files(removed)
            }
            SyncAction::Reparse => {
                let format = if request.is_dir {
                    None
                } else {
                    self.registry.format_for_path(&rel)
                };
                match format {
                    Some(format) => {
                        if !self.active_formats().contains(&format)
                            || self.filter.is_file_removed(&project, &rel)
                        {
                            return Vec::new();
                        }
                        let key = FileKey::new(format, &project, &rel);
                        let job = self.file_job(&project, key, request.path.clone());
                        vec![self.parse_command(request.path, vec![job])]
                    }
                    None => {
                        let formats = self.active_formats();
                        vec![self.discover_command(&project, &request.path, formats)]
                    }
                }
            }
        }
    }

    pub(super) fn on_discovered(
        &mut self,
        scope: PathBuf,
        project: PathBuf,
        generation: u64,
        formats: Vec<TaskFormat>,
        files: Vec<DiscoveredFile>,
    ) -> Vec<CoreCommand> {
        let Some(pass) = self.accept_result(&scope, generation) else {
            return Vec::new();
        };

        // Files recorded under the scope that discovery no longer sees.
        let scope_rel = normalize_path(Path::new(
            &relative_str(&project, &scope).unwrap_or_default(),
        ));
        let project_key = normalize_path(&project);
        let prefix = format!("{scope_rel}/");
        let found: Vec<FileKey> = files
            .iter()
            .map(|f| FileKey::new(f.format, &project, &f.rel_path))
            .collect();
        let vanished: Vec<FileKey> = self
            .sync
            .records()
            .map(|r| &r.key)
            .filter(|k| {
                k.project == project_key
                    && formats.contains(&k.format)
                    && (scope_rel.is_empty() || k.file == scope_rel || k.file.starts_with(&prefix))
                    && !found.contains(k)
                    && !self.filter.is_glob_excluded(&k.file)
                    && !self
                        .coalescer
                        .touched_since(&project.join(&k.file), pass.stamp)
            })
            .cloned()
            .collect();

        let mut delta = ExplorerDelta::default();
        for key in &vanished {
            if let Some(d) = self.sync.remove_file(&mut self.map, key) {
                delta.push_file(d);
            }
        }
        let mut commands = self.publish(delta);

        let jobs: Vec<FileJob> = files
            .into_iter()
            .zip(found)
            .map(|(file, key)| self.file_job(&project, key, file.path))
            .collect();

        info!(?scope, files = jobs.len(), removed = vanished.len(), "discovery applied");
        if !jobs.is_empty() {
            commands.push(self.parse_command(scope, jobs));
        }
        commands
    }

    pub(super) fn on_discovery_failed(
        &mut self,
        scope: PathBuf,
        generation: u64,
        message: String,
    ) -> Vec<CoreCommand> {
        if self.accept_result(&scope, generation).is_some() {
            warn!(?scope, error = %message, "discovery failed; keeping current tasks");
        }
        Vec::new()
    }

    pub(super) fn on_parsed(&mut self, batch: ParseBatch) -> Vec<CoreCommand> {
        let Some(pass) = self.accept_result(&batch.scope, batch.generation) else {
            return Vec::new();
        };
        let stale = self.stale_files(&pass);
        for key in &stale {
            debug!(file = %key, scope = ?batch.scope, "file changed since the pass was issued; skipping");
            self.sync.abandon(key);
        }

        let mut delta = ExplorerDelta::default();
        {
            let special = &self.special;
            let seed = |id: &TreeId| -> RuntimeState { special.seed(id) };
            let mut ctx = SyncContext {
                map: &mut self.map,
                filter: &self.filter,
                config: self.config.current(),
                seed: &seed,
            };
            for result in batch.results {
                if stale.contains(&result.key) {
                    continue;
                }
                if let Some(d) = self
                    .sync
                    .apply(&mut ctx, &result.key, &result.project, result.outcome)
                {
                    delta.push_file(d);
                }
            }
        }
        self.publish(delta)
    }

    pub(super) fn on_config_updated(&mut self, raw: RawConfigFile, now: Instant) -> Vec<CoreCommand> {
        let change = match self.config.update(raw) {
            Ok(change) => change,
            Err(_) => return Vec::new(),
        };
        if change.is_empty() {
            return Vec::new();
        }
        let cfg = self.config.current().clone();
        let mut delta = ExplorerDelta::default();
        let mut commands = Vec::new();
        let mut rescan = false;

        if change.exclusions_changed {
            if let Err(err) = self.filter.reconfigure(&cfg) {
                warn!(error = %err, "exclusion filter rejected new patterns");
            }
            delta.exclusion_changed = self.sync.reevaluate_exclusions(&mut self.map, &self.filter);
            rescan |= change.exclude_globs_lifted;
        }

        for format in &change.formats_disabled {
            if self.sync.set_format_enabled(&mut self.map, *format, false) > 0 {
                delta.visibility_changed.push(*format);
            }
        }
        for format in &change.formats_enabled {
            if self.map.has_format(*format) {
                if self.sync.set_format_enabled(&mut self.map, *format, true) > 0 {
                    delta.visibility_changed.push(*format);
                }
            } else {
                info!(%format, "format enabled for the first time; scanning");
                rescan = true;
            }
        }

        if change.grouping_changed {
            self.sync.regroup(&self.map, GroupSettings::from_config(&cfg));
            delta.regrouped = true;
        }

        for format in &change.programs_changed {
            if !self.sync.invalidate_format(*format).is_empty() {
                rescan = true;
            }
        }

        if change.special_changed {
            delta.special_changed |= self.special.configure(SpecialSettings::from_config(&cfg));
        }

        if change.debounce_changed {
            self.coalescer.set_window(cfg.debounce());
        }

        if change.user_tasks_changed {
            if let Some(old) = self.user_tasks.take() {
                if let Some(d) = self.sync.remove_file(&mut self.map, &old.key) {
                    delta.push_file(d);
                }
            }
            commands.extend(self.load_user_tasks());
        }

        if rescan {
            for root in self.roots.clone() {
                self.coalescer.record(RawFsEvent::dir(root, FsEventKind::Modify), now);
            }
        }

        info!(?change, rescan, "configuration applied");
        let mut out = self.publish(delta);
        out.extend(commands);
        out
    }

    pub(super) fn on_exclude_task(&mut self, id: &TreeId) -> Vec<CoreCommand> {
        match self.sync.exclude_task(&mut self.map, &mut self.filter, id) {
            Some(d) => self.publish_files(vec![d]),
            None => Vec::new(),
        }
    }

    pub(super) fn on_exclude_file(&mut self, project: &Path, rel_path: &str) -> Vec<CoreCommand> {
        let removed = self
            .sync
            .exclude_file(&mut self.map, &mut self.filter, project, rel_path);
        self.publish_files(removed)
    }

    pub(super) fn on_toggle_favorite(&mut self, id: &TreeId) -> Vec<CoreCommand> {
        match self.special.toggle_favorite(&mut self.map, id) {
            Some(_) => self.special_delta(),
            None => {
                warn!(task = %id, "cannot toggle favorite of unknown task");
                Vec::new()
            }
        }
    }

    pub(super) fn on_toggle_pinned(&mut self, id: &TreeId) -> Vec<CoreCommand> {
        match self.special.toggle_pinned(&mut self.map, id) {
            Some(_) => self.special_delta(),
            None => Vec::new(),
        }
    }

    pub(super) fn on_run_started(&mut self, id: &TreeId) -> Vec<CoreCommand> {
        if self.special.record_run_started(&mut self.map, id) {
            self.special_delta()
        } else {
            Vec::new()
        }
    }

    pub(super) fn on_run_completed(
        &mut self,
        id: &TreeId,
        duration_ms: u64,
        at: DateTime<Utc>,
    ) -> Vec<CoreCommand> {
        self.special
            .record_run_completed(&mut self.map, id, duration_ms, at);
        self.special_delta()
    }

    fn special_delta(&mut self) -> Vec<CoreCommand> {
        self.publish(ExplorerDelta {
            special_changed: true,
            ..ExplorerDelta::default()
        })
    }
}
