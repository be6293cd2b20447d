// src/task/map.rs

//! The single owner of every `TaskNode`.
//!
//! The tree and the special collections only hold `TreeId`s and look nodes up
//! here. Runtime state (favorite, pinned, running, usage) survives every
//! re-parse: an update replaces the definition and nothing else.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::task::definition::TaskDefinition;
use crate::task::identity::{FileKey, TreeId};
use crate::types::TaskFormat;

/// Mutable per-task state that must survive re-parses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeState {
    pub running: bool,
    pub pinned: bool,
    pub favorite: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub run_count: u64,
}

/// Reason a node is kept in the map but not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hidden {
    /// The node's format is currently disabled.
    pub format_disabled: bool,
    /// A configured exclude glob / task regex currently matches the node.
    pub excluded: bool,
}

impl Hidden {
    pub fn any(&self) -> bool {
        self.format_disabled || self.excluded
    }
}

#[derive(Debug, Clone)]
pub struct TaskNode {
    pub definition: TaskDefinition,
    pub state: RuntimeState,
    pub hidden: Hidden,
    id: TreeId,
}

impl TaskNode {
    pub fn id(&self) -> &TreeId {
        &self.id
    }

    pub fn is_visible(&self) -> bool {
        !self.hidden.any()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    /// Existing node; `moved` is true when the definition changed.
    Updated { moved: bool },
}

#[derive(Debug, Default)]
pub struct TaskMap {
    nodes: HashMap<TreeId, TaskNode>,
}

impl TaskMap {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Create-or-merge.
    ///
    /// `seed` provides the initial runtime state for a node that does not
    /// exist yet (persisted usage counters); it is ignored for existing nodes.
    pub fn upsert(
        &mut self,
        definition: TaskDefinition,
        seed: impl FnOnce(&TreeId) -> RuntimeState,
    ) -> (TreeId, UpsertOutcome) {
        let id = definition.tree_id();

        if let Some(node) = self.nodes.get_mut(&id) {
            let moved = node.definition != definition;
            node.definition = definition;
            return (id, UpsertOutcome::Updated { moved });
        }

        let state = seed(&id);
        debug!(task = %id, "task map: created node");
        self.nodes.insert(
            id.clone(),
            TaskNode {
                definition,
                state,
                hidden: Hidden::default(),
                id: id.clone(),
            },
        );
        (id, UpsertOutcome::Created)
    }

    pub fn remove(&mut self, id: &TreeId) -> Option<TaskNode> {
        let removed = self.nodes.remove(id);
        if removed.is_some() {
            debug!(task = %id, "task map: removed node");
        }
        removed
    }

    pub fn get(&self, id: &TreeId) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &TreeId) -> Option<&mut TaskNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &TreeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TaskNode> {
        self.nodes.values_mut()
    }

    /// All nodes of one format, visible or not, sorted by id.
    pub fn all_by_format(&self, format: TaskFormat) -> Vec<&TaskNode> {
        let mut nodes: Vec<&TaskNode> = self
            .nodes
            .values()
            .filter(|n| n.definition.format == format)
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Ids of every node defined in `file`.
    pub fn ids_for_file(&self, file: &FileKey) -> Vec<TreeId> {
        let mut ids: Vec<TreeId> = self
            .nodes
            .values()
            .filter(|n| &n.definition.file_key() == file)
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of visible tasks of `format`.
    pub fn visible_count(&self, format: TaskFormat) -> usize {
        self.nodes
            .values()
            .filter(|n| n.definition.format == format && n.is_visible())
            .count()
    }

    /// Number of visible tasks across all formats.
    pub fn visible_total(&self) -> usize {
        self.nodes.values().filter(|n| n.is_visible()).count()
    }

    /// Flip the format-disabled flag for every node of `format`.
    ///
    /// Returns how many nodes changed visibility.
    pub fn set_format_hidden(&mut self, format: TaskFormat, hidden: bool) -> usize {
        let mut changed = 0;
        for node in self.nodes.values_mut() {
            if node.definition.format == format && node.hidden.format_disabled != hidden {
                let was_visible = node.is_visible();
                node.hidden.format_disabled = hidden;
                if was_visible != node.is_visible() {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Whether any node of `format` has ever been loaded.
    pub fn has_format(&self, format: TaskFormat) -> bool {
        self.nodes.values().any(|n| n.definition.format == format)
    }
}
