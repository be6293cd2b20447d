// src/tree/sync.rs

//! Reconciles the tree and the task map against parse results.
//!
//! Per file the flow is `Parsing -> Diffing -> Applying -> Idle`:
//! names only in the previous pass are removed from the map, names only in
//! the new pass are upserted, names in both are upserted in place (runtime
//! state kept). Files that were not touched keep their cached record.
//!
//! A failed parse never empties a file: the previous record stays as is.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::errors::ExplorerError;
use crate::filter::ExclusionFilter;
use crate::scan::{ParseOutcome, ParsedFile};
use crate::task::{
    FileKey, RuntimeState, TaskDefinition, TaskMap, TreeId, UpsertOutcome, normalize_path,
};
use crate::tree::delta::TreeDelta;
use crate::tree::grouping::{GroupSettings, build_children, task_label};
use crate::tree::model::{ProjectFolder, TaskFile};
use crate::types::TaskFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Parsing,
    Diffing,
    Applying,
}

/// Cached result of the last good parse of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub key: FileKey,
    pub project: PathBuf,
    /// Parser output, duplicates included.
    pub names: Vec<String>,
    /// Ids materialised from `names`, in tree order.
    pub ids: Vec<TreeId>,
    pub hash: Option<String>,
    pub last_error: Option<String>,
}

impl FileRecord {
    fn empty(key: FileKey, project: &Path) -> Self {
        Self {
            key,
            project: project.to_path_buf(),
            names: Vec::new(),
            ids: Vec::new(),
            hash: None,
            last_error: None,
        }
    }
}

/// Everything a pass needs besides the synchronizer itself.
pub struct SyncContext<'a> {
    pub map: &'a mut TaskMap,
    pub filter: &'a ExclusionFilter,
    pub config: &'a ConfigFile,
    /// Initial runtime state for nodes created by this pass.
    pub seed: &'a dyn Fn(&TreeId) -> RuntimeState,
}

#[derive(Debug, Default, Clone, Copy)]
struct PhaseSlot {
    phase: SyncPhase,
    in_flight: usize,
}

#[derive(Debug, Default)]
pub struct TreeSynchronizer {
    records: BTreeMap<FileKey, FileRecord>,
    projects: BTreeMap<String, ProjectFolder>,
    phases: HashMap<(String, TaskFormat), PhaseSlot>,
    grouping: GroupSettings,
}

impl TreeSynchronizer {
    pub fn new(grouping: GroupSettings) -> Self {
        Self {
            grouping,
            ..Self::default()
        }
    }

    pub fn grouping(&self) -> &GroupSettings {
        &self.grouping
    }

    pub fn record(&self, key: &FileKey) -> Option<&FileRecord> {
        self.records.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    pub fn known_hash(&self, key: &FileKey) -> Option<String> {
        self.records.get(key).and_then(|r| r.hash.clone())
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectFolder> {
        self.projects.values()
    }

    pub fn project(&self, path: &Path) -> Option<&ProjectFolder> {
        self.projects.get(&normalize_path(path))
    }

    pub fn phase(&self, project: &Path, format: TaskFormat) -> SyncPhase {
        self.phases
            .get(&(normalize_path(project), format))
            .map(|s| s.phase)
            .unwrap_or_default()
    }

    /// Note that a parse for `key` has been dispatched.
    pub fn mark_parsing(&mut self, key: &FileKey) {
        let slot = self.slot(key);
        slot.in_flight += 1;
        slot.phase = SyncPhase::Parsing;
        debug!(file = %key, "sync phase -> Parsing");
    }

    /// Release a dispatched parse whose result will not be applied.
    pub fn abandon(&mut self, key: &FileKey) {
        self.finish_phase(key);
    }

    /// Apply one parse outcome for `key`.
    ///
    /// Returns `None` when nothing visible changed.
    pub fn apply(
        &mut self,
        ctx: &mut SyncContext<'_>,
        key: &FileKey,
        project: &Path,
        outcome: ParseOutcome,
    ) -> Option<TreeDelta> {
        let delta = match outcome {
            ParseOutcome::Parsed(parsed) => self.apply_parsed(ctx, key, project, parsed),
            ParseOutcome::Unchanged => {
                debug!(file = %key, "unchanged contents; nothing to diff");
                None
            }
            ParseOutcome::Failed(err) => {
                self.retain_after_failure(key, project, &err);
                None
            }
            ParseOutcome::Deleted => self.remove_file(ctx.map, key),
        };
        self.finish_phase(key);
        delta
    }

    fn apply_parsed(
        &mut self,
        ctx: &mut SyncContext<'_>,
        key: &FileKey,
        project: &Path,
        parsed: ParsedFile,
    ) -> Option<TreeDelta> {
        if let Some(record) = self.records.get(key) {
            if record.hash.as_deref() == Some(parsed.hash.as_str()) && record.last_error.is_none() {
                debug!(file = %key, "content hash unchanged; skipping diff");
                return None;
            }
        }

        self.set_phase(key, SyncPhase::Diffing);

        let mut seen: HashSet<TreeId> = HashSet::new();
        let mut incoming: Vec<TaskDefinition> = Vec::with_capacity(parsed.definitions.len());
        for def in parsed.definitions {
            let id = def.tree_id();
            if !seen.insert(id.clone()) {
                warn!(
                    error = %ExplorerError::IdentityCollision(id),
                    "dropping duplicate task definition"
                );
                continue;
            }
            if ctx.filter.is_removed_by_user(&def) {
                debug!(task = %id, "task removed by user exclusion; not materialised");
                continue;
            }
            incoming.push(def);
        }

        let previous: Vec<TreeId> = self
            .records
            .get(key)
            .map(|r| r.ids.clone())
            .unwrap_or_default();
        let previous_set: HashSet<&TreeId> = previous.iter().collect();

        self.set_phase(key, SyncPhase::Applying);

        let incoming_ids: HashSet<TreeId> = incoming.iter().map(TaskDefinition::tree_id).collect();
        let mut delta = TreeDelta::new(project, key.clone());
        for id in previous.iter().filter(|id| !incoming_ids.contains(*id)) {
            if ctx.map.remove(id).is_some() {
                delta.removed.push(id.clone());
            }
        }

        let mut ids = Vec::with_capacity(incoming.len());
        for def in incoming {
            let excluded = ctx.filter.is_hidden_by_config(&def);
            let disabled = !ctx.config.is_enabled(def.format);
            let (id, outcome) = ctx.map.upsert(def, ctx.seed);
            if let Some(node) = ctx.map.get_mut(&id) {
                node.hidden.excluded = excluded;
                node.hidden.format_disabled = disabled;
            }
            match outcome {
                UpsertOutcome::Created => delta.added.push(id.clone()),
                UpsertOutcome::Updated { moved } => {
                    if !previous_set.contains(&id) {
                        delta.added.push(id.clone());
                    } else if moved {
                        delta.updated.push(id.clone());
                    }
                }
            }
            ids.push(id);
        }

        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| FileRecord::empty(key.clone(), project));
        record.names = parsed.names;
        record.ids = ids;
        record.hash = Some(parsed.hash);
        record.last_error = None;

        self.rebuild_file(ctx.map, key);

        info!(
            file = %key,
            added = delta.added.len(),
            removed = delta.removed.len(),
            updated = delta.updated.len(),
            "synchronized file"
        );
        (!delta.is_empty()).then_some(delta)
    }

    fn retain_after_failure(&mut self, key: &FileKey, project: &Path, err: &ExplorerError) {
        let record = self
            .records
            .entry(key.clone())
            .or_insert_with(|| FileRecord::empty(key.clone(), project));
        record.last_error = Some(err.to_string());
        warn!(
            file = %key,
            error = %err,
            kept = record.ids.len(),
            recoverable = err.is_recoverable(),
            "parse failed; keeping previous tasks for file"
        );
    }

    /// Drop a file and all its tasks.
    pub fn remove_file(&mut self, map: &mut TaskMap, key: &FileKey) -> Option<TreeDelta> {
        let record = self.records.remove(key)?;
        let mut delta = TreeDelta::new(&record.project, key.clone());
        for id in record.ids {
            if map.remove(&id).is_some() {
                delta.removed.push(id);
            }
        }
        if let Some(folder) = self.projects.get_mut(&key.project) {
            folder.remove(key);
        }
        debug!(file = %key, removed = delta.removed.len(), "removed task file");
        (!delta.is_empty()).then_some(delta)
    }

    /// Drop every file at or below `rel` inside `project`.
    pub fn remove_path(&mut self, map: &mut TaskMap, project: &Path, rel: &str) -> Vec<TreeDelta> {
        let project = normalize_path(project);
        let rel = normalize_path(Path::new(rel));
        let prefix = format!("{rel}/");
        let keys: Vec<FileKey> = self
            .records
            .keys()
            .filter(|k| k.project == project && (rel.is_empty() || k.file == rel || k.file.starts_with(&prefix)))
            .cloned()
            .collect();
        keys.iter()
            .filter_map(|key| self.remove_file(map, key))
            .collect()
    }

    /// Fast path for enabling/disabling a format: visibility only. Files of
    /// the format are regrouped from the nodes still visible.
    ///
    /// Returns the number of nodes whose visibility changed.
    pub fn set_format_enabled(&mut self, map: &mut TaskMap, format: TaskFormat, enabled: bool) -> usize {
        let changed = map.set_format_hidden(format, !enabled);
        if changed > 0 {
            let keys: Vec<FileKey> = self
                .records
                .keys()
                .filter(|k| k.format == format)
                .cloned()
                .collect();
            for key in &keys {
                self.rebuild_file(map, key);
            }
        }
        info!(%format, enabled, changed, "format visibility toggled");
        changed
    }

    /// Re-evaluate config exclusions for every node.
    ///
    /// Returns the ids whose hidden-by-exclusion flag flipped.
    pub fn reevaluate_exclusions(&mut self, map: &mut TaskMap, filter: &ExclusionFilter) -> Vec<TreeId> {
        let mut changed = Vec::new();
        let mut files: BTreeSet<FileKey> = BTreeSet::new();
        for node in map.iter_mut() {
            let excluded = filter.is_hidden_by_config(&node.definition);
            if node.hidden.excluded != excluded {
                node.hidden.excluded = excluded;
                changed.push(node.id().clone());
                files.insert(node.definition.file_key());
            }
        }
        for key in &files {
            self.rebuild_file(map, key);
        }
        changed.sort();
        debug!(changed = changed.len(), "re-evaluated exclusions");
        changed
    }

    /// Remove one task for good and remember the exclusion.
    ///
    /// Excluding an already excluded task is a no-op.
    pub fn exclude_task(
        &mut self,
        map: &mut TaskMap,
        filter: &mut ExclusionFilter,
        id: &TreeId,
    ) -> Option<TreeDelta> {
        if !filter.exclude_task(id) {
            debug!(task = %id, "task already excluded");
            return None;
        }
        let node = map.remove(id)?;
        let key = node.definition.file_key();
        let project = node.definition.project.clone();
        if let Some(record) = self.records.get_mut(&key) {
            record.ids.retain(|i| i != id);
        }
        self.rebuild_file(map, &key);

        let mut delta = TreeDelta::new(project, key);
        delta.removed.push(id.clone());
        info!(task = %id, "task excluded");
        Some(delta)
    }

    /// Remove one file's tasks for good and remember the exclusion.
    pub fn exclude_file(
        &mut self,
        map: &mut TaskMap,
        filter: &mut ExclusionFilter,
        project: &Path,
        rel: &str,
    ) -> Vec<TreeDelta> {
        if !filter.exclude_file(project, rel) {
            debug!(?project, rel, "file already excluded");
            return Vec::new();
        }
        let project_key = normalize_path(project);
        let file = normalize_path(Path::new(rel));
        let keys: Vec<FileKey> = self
            .records
            .keys()
            .filter(|k| k.project == project_key && k.file == file)
            .cloned()
            .collect();
        info!(?project, rel, files = keys.len(), "file excluded");
        keys.iter()
            .filter_map(|key| self.remove_file(map, key))
            .collect()
    }

    /// Rebuild every task file's children with new group settings.
    ///
    /// No file is parsed.
    pub fn regroup(&mut self, map: &TaskMap, grouping: GroupSettings) {
        self.grouping = grouping;
        let keys: Vec<FileKey> = self.records.keys().cloned().collect();
        for key in &keys {
            self.rebuild_file(map, key);
        }
        info!(files = keys.len(), "regrouped task files");
    }

    /// Forget content hashes for `format` so the next pass re-parses.
    ///
    /// Returns the affected files.
    pub fn invalidate_format(&mut self, format: TaskFormat) -> Vec<FileKey> {
        self.records
            .values_mut()
            .filter(|r| r.key.format == format)
            .map(|r| {
                r.hash = None;
                r.key.clone()
            })
            .collect()
    }

    fn rebuild_file(&mut self, map: &TaskMap, key: &FileKey) {
        let Some(record) = self.records.get(key) else {
            return;
        };
        let folder = self
            .projects
            .entry(key.project.clone())
            .or_insert_with(|| ProjectFolder::new(&record.project));

        // Hidden nodes stay in the record and the map, not in the tree.
        let labelled: Vec<(TreeId, String)> = record
            .ids
            .iter()
            .filter_map(|id| map.get(id).filter(|node| node.is_visible()))
            .map(|node| (node.id().clone(), task_label(&node.definition, &self.grouping)))
            .collect();
        if labelled.is_empty() {
            folder.remove(key);
            return;
        }

        let mut file = TaskFile::new(key.clone(), Vec::new());
        file.children = build_children(&file, &labelled, &self.grouping);
        folder.insert(file);
    }

    fn slot(&mut self, key: &FileKey) -> &mut PhaseSlot {
        self.phases
            .entry((key.project.clone(), key.format))
            .or_default()
    }

    fn set_phase(&mut self, key: &FileKey, phase: SyncPhase) {
        let slot = self.slot(key);
        if slot.phase != phase {
            debug!(file = %key, ?phase, "sync phase");
            slot.phase = phase;
        }
    }

    fn finish_phase(&mut self, key: &FileKey) {
        let slot = self.slot(key);
        slot.in_flight = slot.in_flight.saturating_sub(1);
        slot.phase = if slot.in_flight > 0 {
            SyncPhase::Parsing
        } else {
            SyncPhase::Idle
        };
    }
}
