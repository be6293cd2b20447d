// src/special/collections.rs

//! Favorites, Last Tasks, Famous, Running and User Tasks.
//!
//! Every view is resolved by `TreeId` against the task map on demand, so a
//! node that is merely hidden keeps its membership and reappears with it.
//! Destroyed nodes are forgotten by [`SpecialCollections::reconcile`].

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::special::usage::UsageSnapshot;
use crate::task::{FileKey, RuntimeState, TaskMap, TreeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialSettings {
    pub num_last_tasks: usize,
    pub num_famous: usize,
    pub show_favorites: bool,
    pub show_last_tasks: bool,
    pub show_user_tasks: bool,
}

impl SpecialSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let s = &cfg.special_folders;
        Self {
            num_last_tasks: s.num_last_tasks,
            num_famous: s.num_famous,
            show_favorites: s.show_favorites,
            show_last_tasks: s.show_last_tasks,
            show_user_tasks: s.show_user_tasks,
        }
    }
}

#[derive(Debug)]
pub struct SpecialCollections {
    snapshot: UsageSnapshot,
    settings: SpecialSettings,
    user_tasks_file: Option<FileKey>,
    /// Ids ranked by run count, then most recent run.
    famous: Vec<TreeId>,
    dirty: bool,
}

impl SpecialCollections {
    pub fn new(snapshot: UsageSnapshot, settings: SpecialSettings) -> Self {
        let mut collections = Self {
            snapshot,
            settings,
            user_tasks_file: None,
            famous: Vec::new(),
            dirty: false,
        };
        collections.trim_last_tasks();
        collections.rank_famous();
        collections
    }

    pub fn settings(&self) -> &SpecialSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> &UsageSnapshot {
        &self.snapshot
    }

    /// Apply new folder settings. Returns true when any view may change.
    pub fn configure(&mut self, settings: SpecialSettings) -> bool {
        if self.settings == settings {
            return false;
        }
        self.settings = settings;
        if self.trim_last_tasks() {
            self.dirty = true;
        }
        true
    }

    pub fn set_user_tasks_file(&mut self, file: Option<FileKey>) {
        self.user_tasks_file = file;
    }

    /// The snapshot if it changed since the last call.
    pub fn take_dirty(&mut self) -> Option<UsageSnapshot> {
        if std::mem::take(&mut self.dirty) {
            Some(self.snapshot.clone())
        } else {
            None
        }
    }

    /// Initial runtime state for a node the map has not seen yet.
    pub fn seed(&self, id: &TreeId) -> RuntimeState {
        let usage = self.snapshot.usage.get(id);
        RuntimeState {
            running: false,
            pinned: self.snapshot.pinned.contains(id),
            favorite: self.snapshot.favorites.contains(id),
            last_run_at: usage.and_then(|u| u.last_run_at),
            run_count: usage.map(|u| u.run_count).unwrap_or(0),
        }
    }

    /// Flip the favorite flag. `None` if the task does not exist.
    pub fn toggle_favorite(&mut self, map: &mut TaskMap, id: &TreeId) -> Option<bool> {
        let node = map.get_mut(id)?;
        node.state.favorite = !node.state.favorite;
        let favorite = node.state.favorite;
        if favorite {
            self.snapshot.favorites.insert(id.clone());
        } else {
            self.snapshot.favorites.remove(id);
        }
        self.dirty = true;
        info!(task = %id, favorite, "favorite toggled");
        Some(favorite)
    }

    pub fn toggle_pinned(&mut self, map: &mut TaskMap, id: &TreeId) -> Option<bool> {
        let node = map.get_mut(id)?;
        node.state.pinned = !node.state.pinned;
        let pinned = node.state.pinned;
        if pinned {
            self.snapshot.pinned.insert(id.clone());
        } else {
            self.snapshot.pinned.remove(id);
        }
        self.dirty = true;
        debug!(task = %id, pinned, "pinned toggled");
        Some(pinned)
    }

    /// A run started: mark running and move to the head of Last Tasks.
    pub fn record_run_started(&mut self, map: &mut TaskMap, id: &TreeId) -> bool {
        let Some(node) = map.get_mut(id) else {
            return false;
        };
        node.state.running = true;

        self.snapshot.last_tasks.retain(|t| t != id);
        self.snapshot.last_tasks.push_front(id.clone());
        self.trim_last_tasks();
        self.dirty = true;
        debug!(task = %id, "run started");
        true
    }

    /// A run completed: bump usage and re-rank Famous.
    pub fn record_run_completed(
        &mut self,
        map: &mut TaskMap,
        id: &TreeId,
        duration_ms: u64,
        at: DateTime<Utc>,
    ) -> bool {
        let usage = self.snapshot.usage.entry(id.clone()).or_default();
        usage.run_count += 1;
        usage.last_run_at = Some(at);
        usage.last_duration_ms = Some(duration_ms);
        let (run_count, last_run_at) = (usage.run_count, usage.last_run_at);

        if let Some(node) = map.get_mut(id) {
            node.state.running = false;
            node.state.run_count = run_count;
            node.state.last_run_at = last_run_at;
        }

        self.rank_famous();
        self.dirty = true;
        info!(task = %id, duration_ms, run_count, "run completed");
        true
    }

    /// Forget destroyed nodes. Returns true when any view changed.
    ///
    /// A task re-created later with the same id does not regain favorite or
    /// pinned status.
    pub fn reconcile<'a>(
        &mut self,
        map: &TaskMap,
        removed: impl IntoIterator<Item = &'a TreeId>,
    ) -> bool {
        let mut changed = false;
        for id in removed {
            if map.contains(id) {
                continue;
            }
            changed |= self.snapshot.favorites.remove(id);
            changed |= self.snapshot.pinned.remove(id);
            let before = self.snapshot.last_tasks.len();
            self.snapshot.last_tasks.retain(|t| t != id);
            changed |= before != self.snapshot.last_tasks.len();
            changed |= self.famous.contains(id);
        }
        if changed {
            self.famous.retain(|id| map.contains(id));
            self.dirty = true;
            debug!("special folders reconciled");
        }
        changed
    }

    pub fn favorites(&self, map: &TaskMap) -> Vec<TreeId> {
        if !self.settings.show_favorites {
            return Vec::new();
        }
        self.snapshot
            .favorites
            .iter()
            .filter(|id| is_visible(map, id))
            .cloned()
            .collect()
    }

    pub fn last_tasks(&self, map: &TaskMap) -> Vec<TreeId> {
        if !self.settings.show_last_tasks {
            return Vec::new();
        }
        self.snapshot
            .last_tasks
            .iter()
            .filter(|id| is_visible(map, id))
            .cloned()
            .collect()
    }

    pub fn famous(&self, map: &TaskMap) -> Vec<TreeId> {
        self.famous
            .iter()
            .filter(|id| is_visible(map, id))
            .take(self.settings.num_famous)
            .cloned()
            .collect()
    }

    /// Derived live from the `running` flags; never persisted.
    pub fn running(&self, map: &TaskMap) -> Vec<TreeId> {
        let mut ids: Vec<TreeId> = map
            .iter()
            .filter(|n| n.state.running)
            .map(|n| n.id().clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn user_tasks(&self, map: &TaskMap) -> Vec<TreeId> {
        match (&self.user_tasks_file, self.settings.show_user_tasks) {
            (Some(file), true) => map
                .ids_for_file(file)
                .into_iter()
                .filter(|id| is_visible(map, id))
                .collect(),
            _ => Vec::new(),
        }
    }

    // Eviction pops from the tail.
    fn trim_last_tasks(&mut self) -> bool {
        let mut trimmed = false;
        while self.snapshot.last_tasks.len() > self.settings.num_last_tasks {
            self.snapshot.last_tasks.pop_back();
            trimmed = true;
        }
        trimmed
    }

    fn rank_famous(&mut self) {
        let mut ranked: Vec<(&TreeId, u64, Option<DateTime<Utc>>)> = self
            .snapshot
            .usage
            .iter()
            .filter(|(_, u)| u.run_count > 0)
            .map(|(id, u)| (id, u.run_count, u.last_run_at))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.cmp(b.0))
        });
        self.famous = ranked.into_iter().map(|(id, _, _)| id.clone()).collect();
    }
}

fn is_visible(map: &TaskMap, id: &TreeId) -> bool {
    map.get(id).is_some_and(|n| n.is_visible())
}
